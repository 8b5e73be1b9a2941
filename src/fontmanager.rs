// this_file: src/fontmanager.rs
//! The `FontManager` trait models the out-of-scope external graphics
//! library's font manager (§1, §4.6). `GlyphFontManager` is a concrete,
//! in-process implementation built on the same fontations stack this
//! lineage already uses for glyph metrics, shaping, and rasterization.

use crate::model::FontStyle;
use memmap2::Mmap;
use read_fonts::FontRef;
use skrifa::instance::Size;
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef as SkrifaFontRef, MetadataProvider};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use zeno::{Command, Mask, Transform};

/// Resolves `(family, style, name)` to device-unit widths under the three
/// measurement modes of §4.3. Implementations must never fail to resolve a
/// typeface — the resolver always yields some typeface, falling back to a
/// default (§4.3 "Typeface resolution fallback chain").
pub trait FontManager: Send + Sync {
    fn measure_fast(&self, family: &str, style: FontStyle, name: &str, size: f64, line: &str) -> f64;
    fn measure_accurate(&self, family: &str, style: FontStyle, name: &str, size: f64, line: &str) -> f64;
    fn measure_pixel_perfect(&self, family: &str, style: FontStyle, name: &str, size: f64, line: &str) -> f64;
}

struct LoadedFont {
    #[allow(dead_code)]
    mmap: Arc<Mmap>,
    font_ref: FontRef<'static>,
}

/// Registers fonts by `(family, style)` and `name`, and measures text
/// against them via skrifa (FAST/PIXEL_PERFECT metrics), HarfBuzz
/// (ACCURATE, kerning-aware shaping) and zeno (PIXEL_PERFECT rasterization).
pub struct GlyphFontManager {
    by_family_style: HashMap<(String, FontStyle), Arc<LoadedFont>>,
    by_name: HashMap<String, Arc<LoadedFont>>,
    default: Arc<LoadedFont>,
}

impl GlyphFontManager {
    /// Builds a font manager from `(name, family, style, path)` entries —
    /// the animation's `fonts.list[]` (§6) joined against files resolved by
    /// the caller (system font lookup is the graphics library's concern;
    /// this constructor only needs file paths already resolved). The first
    /// entry doubles as the legacy default (§4.3 chain step iv).
    pub fn new(entries: &[(String, String, FontStyle, &Path)]) -> std::io::Result<Self> {
        let mut by_family_style = HashMap::new();
        let mut by_name = HashMap::new();
        let mut default = None;

        for (name, family, style, path) in entries {
            let loaded = Arc::new(Self::load(path)?);
            by_family_style.insert((family.clone(), *style), loaded.clone());
            by_name.insert(name.clone(), loaded.clone());
            if default.is_none() {
                default = Some(loaded);
            }
        }

        let default = default.ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "no fonts registered")
        })?;

        Ok(Self {
            by_family_style,
            by_name,
            default,
        })
    }

    fn load(path: &Path) -> std::io::Result<LoadedFont> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let mmap = Arc::new(mmap);
        // SAFETY: the mmap is kept alive for the lifetime of `LoadedFont`
        // via the `Arc` stored alongside the borrowed `FontRef`.
        let data: &'static [u8] = unsafe { std::slice::from_raw_parts(mmap.as_ptr(), mmap.len()) };
        let font_ref = FontRef::new(data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        Ok(LoadedFont { mmap, font_ref })
    }

    /// Typeface resolution fallback chain (§4.3): (i) `(family, style)`;
    /// (ii) `(name, Normal)`; (iii) legacy-construct `name`; (iv) default.
    fn resolve(&self, family: &str, style: FontStyle, name: &str) -> &LoadedFont {
        if let Some(f) = self.by_family_style.get(&(family.to_string(), style)) {
            return f;
        }
        if style != FontStyle::Normal {
            if let Some(f) = self.by_family_style.get(&(family.to_string(), FontStyle::Normal)) {
                return f;
            }
        }
        if let Some(f) = self.by_name.get(name) {
            return f;
        }
        &self.default
    }

    fn skrifa_ref<'a>(font_ref: &'a FontRef<'a>) -> SkrifaFontRef<'a> {
        SkrifaFontRef::from_index(font_ref.data().as_bytes(), 0).expect("single-font data registered by fonts.list")
    }
}

impl FontManager for GlyphFontManager {
    fn measure_fast(&self, family: &str, style: FontStyle, name: &str, size: f64, line: &str) -> f64 {
        let font = self.resolve(family, style, name);
        let skrifa_font = Self::skrifa_ref(&font.font_ref);
        let glyph_metrics = skrifa_font.glyph_metrics(Size::new(size as f32), skrifa::instance::LocationRef::default());
        let charmap = skrifa_font.charmap();
        let mut width = 0.0f64;
        for ch in line.chars() {
            let gid = charmap.map(ch).unwrap_or_default();
            if let Some(advance) = glyph_metrics.advance_width(gid) {
                width += advance as f64;
            }
        }
        width
    }

    fn measure_accurate(&self, family: &str, style: FontStyle, name: &str, size: f64, line: &str) -> f64 {
        if line.is_empty() {
            return 0.0;
        }
        let font = self.resolve(family, style, name);
        let hb_face = harfbuzz_rs::Face::from_bytes(font.font_ref.data().as_bytes(), 0);
        let mut hb_font = harfbuzz_rs::Font::new(hb_face);
        hb_font.set_scale((size * 64.0) as i32, (size * 64.0) as i32);
        let buffer = harfbuzz_rs::UnicodeBuffer::new().add_str(line);
        let output = harfbuzz_rs::shape(&hb_font, buffer, &[]);
        output
            .get_glyph_positions()
            .iter()
            .map(|p| p.x_advance as f64 / 64.0)
            .sum()
    }

    fn measure_pixel_perfect(&self, family: &str, style: FontStyle, name: &str, size: f64, line: &str) -> f64 {
        if line.is_empty() {
            return 0.0;
        }
        let font = self.resolve(family, style, name);
        let skrifa_font = Self::skrifa_ref(&font.font_ref);
        let charmap = skrifa_font.charmap();
        let outlines = skrifa_font.outline_glyphs();
        let glyph_metrics = skrifa_font.glyph_metrics(Size::new(size as f32), skrifa::instance::LocationRef::default());

        const PAD: f32 = 20.0;
        let mut pen_x: f32 = PAD;
        let mut commands: Vec<Command> = Vec::new();

        for ch in line.chars() {
            let gid = charmap.map(ch).unwrap_or_default();
            if let Some(outline) = outlines.get(gid) {
                let mut pen = ZenoPen::new(pen_x, PAD);
                let _ = outline.draw(
                    DrawSettings::unhinted(Size::new(size as f32), skrifa::instance::LocationRef::default()),
                    &mut pen,
                );
                commands.extend(pen.commands);
            }
            pen_x += glyph_metrics.advance_width(gid).unwrap_or(0.0);
        }

        if commands.is_empty() {
            return 0.0;
        }

        let width_px = (pen_x + 2.0 * PAD).ceil() as usize;
        let height_px = (size as f32 + 2.0 * PAD).ceil().max(1.0) as usize;
        let (mask, placement) = Mask::new(&commands)
            .transform(Some(Transform::IDENTITY))
            .size(width_px as u32, height_px as u32)
            .render();

        let mut left = None;
        let mut right = None;
        for y in 0..placement.height as usize {
            for x in 0..placement.width as usize {
                let idx = y * placement.width as usize + x;
                if idx < mask.len() && mask[idx] != 0 {
                    left = Some(left.map_or(x, |l: usize| l.min(x)));
                    right = Some(right.map_or(x, |r: usize| r.max(x)));
                }
            }
        }

        match (left, right) {
            // 1px safety margin for aliased edges (§9 open question, kept).
            (Some(l), Some(r)) => (r - l + 2) as f64,
            _ => 0.0,
        }
    }
}

/// Emits zeno path commands from skrifa outlines, Y-flipped (font space has
/// Y-up, raster space has Y-down) and offset by the current pen position.
struct ZenoPen {
    pen_x: f32,
    pen_y: f32,
    commands: Vec<Command>,
}

impl ZenoPen {
    fn new(pen_x: f32, pen_y: f32) -> Self {
        Self {
            pen_x,
            pen_y,
            commands: Vec::new(),
        }
    }

    fn pt(&self, x: f32, y: f32) -> (f32, f32) {
        (self.pen_x + x, self.pen_y - y)
    }
}

impl OutlinePen for ZenoPen {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.commands.push(Command::MoveTo(zeno::Point::new(x, y)));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.commands.push(Command::LineTo(zeno::Point::new(x, y)));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let (cx0, cy0) = self.pt(cx0, cy0);
        let (x, y) = self.pt(x, y);
        self.commands.push(Command::QuadTo(
            zeno::Point::new(cx0, cy0),
            zeno::Point::new(x, y),
        ));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let (cx0, cy0) = self.pt(cx0, cy0);
        let (cx1, cy1) = self.pt(cx1, cy1);
        let (x, y) = self.pt(x, y);
        self.commands.push(Command::CurveTo(
            zeno::Point::new(cx0, cy0),
            zeno::Point::new(cx1, cy1),
            zeno::Point::new(x, y),
        ));
    }

    fn close(&mut self) {
        self.commands.push(Command::Close);
    }
}

/// A dependency-free stand-in used when the caller has no real font files to
/// register (the `render` binary's default, since font resolution is the
/// external graphics library's job per §1). Approximates every mode with the
/// same average-advance-width heuristic (0.55 em per character, typical for
/// proportional Latin text) rather than glyph data. Callers embedding
/// `flipbook` with real fonts available should construct `GlyphFontManager`
/// instead for faithful measurement.
pub struct HeuristicFontManager {
    average_advance_em: f64,
}

impl Default for HeuristicFontManager {
    fn default() -> Self {
        Self { average_advance_em: 0.55 }
    }
}

impl FontManager for HeuristicFontManager {
    fn measure_fast(&self, _family: &str, _style: FontStyle, _name: &str, size: f64, line: &str) -> f64 {
        line.chars().count() as f64 * size * self.average_advance_em
    }

    fn measure_accurate(&self, _family: &str, _style: FontStyle, _name: &str, size: f64, line: &str) -> f64 {
        line.chars().count() as f64 * size * self.average_advance_em
    }

    fn measure_pixel_perfect(&self, _family: &str, _style: FontStyle, _name: &str, size: f64, line: &str) -> f64 {
        if line.is_empty() {
            0.0
        } else {
            line.chars().count() as f64 * size * self.average_advance_em + 1.0
        }
    }
}

/// Deterministic fixed-advance font manager used by unit tests that exercise
/// the sizer/measurer control flow without needing real font files on disk.
#[derive(Default)]
pub struct MockFontManager {
    pub advance_per_char: f64,
}

impl MockFontManager {
    pub fn new(advance_per_char: f64) -> Self {
        Self { advance_per_char }
    }
}

impl FontManager for MockFontManager {
    fn measure_fast(&self, _family: &str, _style: FontStyle, _name: &str, size: f64, line: &str) -> f64 {
        line.chars().count() as f64 * self.advance_per_char * (size / 100.0)
    }

    fn measure_accurate(&self, _family: &str, _style: FontStyle, _name: &str, size: f64, line: &str) -> f64 {
        line.chars().count() as f64 * self.advance_per_char * (size / 100.0)
    }

    fn measure_pixel_perfect(&self, _family: &str, _style: FontStyle, _name: &str, size: f64, line: &str) -> f64 {
        if line.is_empty() {
            0.0
        } else {
            line.chars().count() as f64 * self.advance_per_char * (size / 100.0) + 2.0
        }
    }
}
