// this_file: src/writer.rs
//! C9 Sequential Writer and the shared frame-buffer slot array (§3 "Frame
//! buffer slot", §4.9). Active only in stream mode.

use std::io::Write;
use std::sync::{Condvar, Mutex};

/// One slot in the ordered frame buffer (§3). `frame_index` equals the
/// slot's array index by construction.
#[derive(Default, Clone)]
struct Slot {
    png_bytes: Option<Vec<u8>>,
    failed: bool,
}

/// An `N`-slot buffer shared between worker threads (publishers) and the
/// single sequential writer (consumer), guarded by one mutex + one
/// condition variable (§3 invariants, §5 shared-resource policy).
pub struct FrameBuffer {
    slots: Mutex<Vec<Slot>>,
    cond: Condvar,
    completed_or_failed: Mutex<usize>,
    total: usize,
}

impl FrameBuffer {
    pub fn new(total: usize) -> Self {
        Self {
            slots: Mutex::new(vec![Slot::default(); total]),
            cond: Condvar::new(),
            completed_or_failed: Mutex::new(0),
            total,
        }
    }

    /// Publishes a successfully encoded frame to its slot and notifies the
    /// writer (§4.8 step 6, §4.9).
    pub fn publish(&self, frame_index: usize, png_bytes: Vec<u8>) {
        {
            let mut slots = self.slots.lock().unwrap();
            slots[frame_index] = Slot {
                png_bytes: Some(png_bytes),
                failed: false,
            };
        }
        self.mark_done();
        self.cond.notify_all();
    }

    /// Marks a frame as failed; the writer still advances its cursor past
    /// it, emitting a warning (§4.8 Failure semantics).
    pub fn publish_failure(&self, frame_index: usize) {
        {
            let mut slots = self.slots.lock().unwrap();
            slots[frame_index] = Slot {
                png_bytes: None,
                failed: true,
            };
        }
        self.mark_done();
        self.cond.notify_all();
    }

    fn mark_done(&self) {
        let mut n = self.completed_or_failed.lock().unwrap();
        *n += 1;
    }

    /// Drains the buffer in strict frame-index order, writing each ready
    /// PNG's bytes to `sink` and flushing after each one (§4.9 algorithm).
    /// Returns the count of frames successfully written.
    pub fn drain_in_order(&self, sink: &mut dyn Write) -> std::io::Result<usize> {
        let mut next = 0usize;
        let mut written = 0usize;
        let mut slots = self.slots.lock().unwrap();
        while next < self.total {
            loop {
                let done = *self.completed_or_failed.lock().unwrap();
                if slots[next].png_bytes.is_some() || slots[next].failed || done >= self.total {
                    if slots[next].png_bytes.is_none() && !slots[next].failed && done >= self.total {
                        // all workers finished but this slot never got a
                        // result: treat as failed so the writer can progress.
                        slots[next].failed = true;
                    }
                    break;
                }
                slots = self.cond.wait(slots).unwrap();
            }
            if let Some(bytes) = slots[next].png_bytes.take() {
                sink.write_all(&bytes)?;
                sink.flush()?;
                written += 1;
            } else {
                log::warn!("frame {} failed, writer advancing past it", next);
            }
            next += 1;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn drains_frames_in_order_regardless_of_publish_order() {
        let buf = Arc::new(FrameBuffer::new(5));
        let mut handles = Vec::new();
        for i in (0..5).rev() {
            let buf = buf.clone();
            handles.push(thread::spawn(move || {
                thread::sleep(std::time::Duration::from_millis((i as u64) * 2));
                buf.publish(i, vec![i as u8]);
            }));
        }
        let mut out = Vec::new();
        let written = {
            for h in handles {
                h.join().unwrap();
            }
            buf.drain_in_order(&mut out).unwrap()
        };
        assert_eq!(written, 5);
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn failed_frame_does_not_block_the_writer() {
        let buf = FrameBuffer::new(3);
        buf.publish(0, vec![0]);
        buf.publish_failure(1);
        buf.publish(2, vec![2]);
        let mut out = Vec::new();
        let written = buf.drain_in_order(&mut out).unwrap();
        assert_eq!(written, 2);
        assert_eq!(out, vec![0, 2]);
    }
}
