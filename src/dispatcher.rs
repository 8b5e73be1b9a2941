// this_file: src/dispatcher.rs
//! C7 Frame Dispatcher — computes frame count and per-frame time, then
//! partitions frame indices across workers round-robin (§4.7).

use crate::model::FrameWorkItem;

/// Computes `N = ceil(duration * fps)` and the list of frame work items
/// (§3 "Frame work item", §4.7).
pub fn compute_frame_plan(duration_seconds: f64, fps: f64) -> Vec<FrameWorkItem> {
    if duration_seconds <= 0.0 || fps <= 0.0 {
        return Vec::new();
    }
    let n = (duration_seconds * fps).ceil() as u32;
    (0..n)
        .map(|i| FrameWorkItem {
            frame_index: i,
            frame_time: frame_time(i, n, duration_seconds),
        })
        .collect()
}

fn frame_time(i: u32, n: u32, duration_seconds: f64) -> f64 {
    if n <= 1 {
        return duration_seconds;
    }
    if i == n - 1 {
        duration_seconds
    } else {
        (i as f64 / (n - 1) as f64) * duration_seconds
    }
}

/// Partitions `plan` round-robin across `worker_count` workers: worker `t`
/// owns `{i : i mod worker_count == t}` (§4.7). Round-robin, not contiguous
/// blocks, because frame rendering time is non-uniform.
pub fn partition_round_robin(plan: &[FrameWorkItem], worker_count: usize) -> Vec<Vec<FrameWorkItem>> {
    let worker_count = worker_count.max(1);
    let mut buckets: Vec<Vec<FrameWorkItem>> = (0..worker_count).map(|_| Vec::new()).collect();
    for item in plan {
        let bucket = item.frame_index as usize % worker_count;
        buckets[bucket].push(*item);
    }
    buckets
}

pub fn frame_filename(prefix: &str, frame_index: u32, extension: &str) -> String {
    format!("{}{:05}.{}", prefix, frame_index, extension)
}
