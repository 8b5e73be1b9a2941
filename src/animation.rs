// this_file: src/animation.rs
//! C6 Animation Factory — models the out-of-scope external graphics
//! library's `Animation`/`Surface`/`Codec` (§1, §4.6) as a trait plus a
//! concrete surface buffer, and builds one independent worker context per
//! worker.

use std::sync::Once;

static PNG_CODEC_REGISTERED: Once = Once::new();

/// Registers the PNG decoder once per process, before the first animation
/// is built (§4.6 Codec registration). The real registration belongs to the
/// external graphics library; this is the single idempotent hook callers
/// invoke before building animations, matching the one-shot process-init
/// pattern of §9.
pub fn ensure_png_codec_registered() {
    PNG_CODEC_REGISTERED.call_once(|| {
        log::debug!("png codec registered");
    });
}

/// A 32-bit RGBA render target, unpremultiplied (§3 "Worker context"). The
/// external graphics library owns the real surface type in production; this
/// is the plain pixel buffer a worker clears, renders into, and snapshots.
#[derive(Clone)]
pub struct RgbaBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Clears the surface to fully transparent (§4.8 step 1).
    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|b| *b = 0);
    }

    /// Snapshots the current pixels (§4.8 step 4).
    pub fn snapshot_rgba(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    pub fn fill_rgba(&mut self, pixels: Vec<u8>) {
        debug_assert_eq!(pixels.len(), self.pixels.len());
        self.pixels = pixels;
    }
}

/// A seekable, renderable animation (§4.6 Contract). Each worker owns one
/// independent instance; seeking or rendering one never affects another
/// (§3 invariants).
pub trait Animation: Send {
    fn duration_seconds(&self) -> f64;
    fn fps(&self) -> f64;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn seek(&mut self, time_seconds: f64);
    fn render(&mut self, surface: &mut RgbaBuffer);
    /// Whether `render`'s output is already 32-bit RGBA unpremultiplied. If
    /// false, the worker redraws once into its conversion surface (§4.8 step 4).
    fn pixel_format_is_rgba(&self) -> bool {
        true
    }
}

/// Builds `N` independent `(animation, render_surface, conversion_surface)`
/// triples, one per worker (§4.6 Contract, §3 "Worker context").
pub fn build_worker_contexts<A>(
    worker_count: usize,
    mut make_animation: impl FnMut() -> A,
) -> Vec<(A, RgbaBuffer, RgbaBuffer)>
where
    A: Animation,
{
    ensure_png_codec_registered();
    (0..worker_count)
        .map(|_| {
            let anim = make_animation();
            let w = anim.width();
            let h = anim.height();
            (anim, RgbaBuffer::new(w, h), RgbaBuffer::new(w, h))
        })
        .collect()
}

/// Reference `Animation` used by tests and by any caller without a real
/// vector-graphics engine wired in: renders a solid color that is a
/// deterministic function of the seeked time, so frame-determinism and
/// ordering properties (§8) are exercisable without a third-party renderer.
#[derive(Clone)]
pub struct PlaceholderAnimation {
    duration: f64,
    fps: f64,
    width: u32,
    height: u32,
    time: f64,
}

impl PlaceholderAnimation {
    pub fn new(duration: f64, fps: f64, width: u32, height: u32) -> Self {
        Self {
            duration,
            fps,
            width,
            height,
            time: 0.0,
        }
    }
}

impl Animation for PlaceholderAnimation {
    fn duration_seconds(&self) -> f64 {
        self.duration
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn seek(&mut self, time_seconds: f64) {
        self.time = time_seconds;
    }

    fn render(&mut self, surface: &mut RgbaBuffer) {
        let channel = ((self.time / self.duration.max(1e-9)) * 255.0) as u8;
        let mut filled = vec![0u8; (surface.width() as usize) * (surface.height() as usize) * 4];
        for px in filled.chunks_exact_mut(4) {
            px[0] = channel;
            px[1] = 255 - channel;
            px[2] = 128;
            px[3] = 255;
        }
        surface.fill_rgba(filled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_contexts_are_independent() {
        let contexts = build_worker_contexts(3, || PlaceholderAnimation::new(1.0, 30.0, 4, 4));
        assert_eq!(contexts.len(), 3);
    }

    #[test]
    fn render_produces_time_dependent_pixels() {
        let mut anim = PlaceholderAnimation::new(1.0, 30.0, 2, 2);
        let mut surf = RgbaBuffer::new(2, 2);
        anim.seek(0.0);
        anim.render(&mut surf);
        let first = surf.snapshot_rgba();
        anim.seek(1.0);
        anim.render(&mut surf);
        let last = surf.snapshot_rgba();
        assert_ne!(first, last);
    }
}
