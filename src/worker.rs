// this_file: src/worker.rs
//! C8 Worker — renders each owned frame index, converts pixel format if
//! needed, encodes, and delivers to a file or the stream frame buffer
//! (§4.8).

use crate::animation::{Animation, RgbaBuffer};
use crate::dispatcher::frame_filename;
use crate::encode::{encode_png, encode_webp};
use crate::model::FrameWorkItem;
use crate::writer::FrameBuffer;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// What the worker pool should produce for each frame.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormats {
    pub png: bool,
    pub webp: bool,
}

/// Where rendered frames go.
pub enum Delivery<'a> {
    /// File mode: write `{prefix}{i:05}.{ext}` directly into `dir`.
    Files { dir: &'a Path, prefix: &'a str },
    /// Stream mode: publish PNG bytes to the shared frame buffer (§4.9
    /// stream-mode constraint: only PNG is supported as stream output).
    Stream(&'a FrameBuffer),
}

/// Atomic completed/failed counters shared across the worker pool, plus the
/// mutex guarding interleaved progress log lines (§4.8 Progress reporting).
#[derive(Default)]
pub struct Progress {
    completed: AtomicU64,
    failed: AtomicU64,
    log_guard: Mutex<()>,
}

impl Progress {
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn report(&self, local: &mut u64, done: bool) {
        *local += 1;
        // Thread-local counter promoted to the shared atomic in batches of
        // 10 to reduce contention (§4.8 Progress reporting).
        if *local >= 10 {
            let counter = if done { &self.completed } else { &self.failed };
            counter.fetch_add(*local, Ordering::Relaxed);
            let _guard = self.log_guard.lock().unwrap();
            log::debug!(
                "progress: {} rendered, {} failed",
                self.completed.load(Ordering::Relaxed),
                self.failed.load(Ordering::Relaxed)
            );
            *local = 0;
        }
    }

    fn flush(&self, local_ok: u64, local_failed: u64) {
        if local_ok > 0 {
            self.completed.fetch_add(local_ok, Ordering::Relaxed);
        }
        if local_failed > 0 {
            self.failed.fetch_add(local_failed, Ordering::Relaxed);
        }
    }
}

/// Runs one worker's owned frames against its exclusively-owned animation
/// and surfaces (§4.8 algorithm, §3 "Worker context").
pub fn run_worker<A: Animation>(
    animation: &mut A,
    surface: &mut RgbaBuffer,
    conversion_surface: &mut RgbaBuffer,
    frames: &[FrameWorkItem],
    formats: OutputFormats,
    delivery: &Delivery,
    progress: &Progress,
) {
    let mut local_ok = 0u64;
    let mut local_failed = 0u64;

    for item in frames {
        surface.clear();
        animation.seek(item.frame_time);
        animation.render(surface);

        let rgba = if animation.pixel_format_is_rgba() {
            surface.snapshot_rgba()
        } else {
            conversion_surface.clear();
            animation.render(conversion_surface);
            conversion_surface.snapshot_rgba()
        };

        match deliver_frame(item.frame_index, animation.width(), animation.height(), &rgba, formats, delivery) {
            Ok(()) => progress.report(&mut local_ok, true),
            Err(e) => {
                log::error!("frame {} failed: {}", item.frame_index, e);
                if let Delivery::Stream(buf) = delivery {
                    buf.publish_failure(item.frame_index as usize);
                }
                progress.report(&mut local_failed, false);
            }
        }
    }

    progress.flush(local_ok, local_failed);
}

fn deliver_frame(
    frame_index: u32,
    width: u32,
    height: u32,
    rgba: &[u8],
    formats: OutputFormats,
    delivery: &Delivery,
) -> crate::error::Result<()> {
    match delivery {
        Delivery::Files { dir, prefix } => {
            if formats.png {
                let bytes = encode_png(width, height, rgba)?;
                std::fs::write(dir.join(frame_filename(prefix, frame_index, "png")), bytes)?;
            }
            if formats.webp {
                let bytes = encode_webp(width, height, rgba)?;
                std::fs::write(dir.join(frame_filename(prefix, frame_index, "webp")), bytes)?;
            }
            Ok(())
        }
        Delivery::Stream(buffer) => {
            let bytes = encode_png(width, height, rgba)?;
            buffer.publish(frame_index as usize, bytes);
            Ok(())
        }
    }
}
