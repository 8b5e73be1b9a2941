// this_file: src/measure.rs
//! C4 Text Measurer — dispatches to one of three measurement modes and
//! returns the maximum line width after splitting on line breaks (§4.3).

use crate::fontmanager::FontManager;
use crate::model::FontStyle;

/// The three measurement modes of §4.3.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementMode {
    Fast,
    #[default]
    Accurate,
    PixelPerfect,
}

impl MeasurementMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Some(Self::Fast),
            "accurate" => Some(Self::Accurate),
            "pixel-perfect" | "pixel_perfect" => Some(Self::PixelPerfect),
            _ => None,
        }
    }
}

/// Measures the rendered width of `text` under `(family, style, name, size)`
/// in the given mode. Splits on `\r`, `\n`, `\r\n` and returns the widest
/// line (§4.3 Contract).
pub fn measure_width(
    fm: &dyn FontManager,
    family: &str,
    style: FontStyle,
    name: &str,
    size: f64,
    text: &str,
    mode: MeasurementMode,
) -> f64 {
    split_lines(text)
        .iter()
        .map(|line| match mode {
            MeasurementMode::Fast => fm.measure_fast(family, style, name, size, line),
            MeasurementMode::Accurate => fm.measure_accurate(family, style, name, size, line),
            MeasurementMode::PixelPerfect => fm.measure_pixel_perfect(family, style, name, size, line),
        })
        .fold(0.0, f64::max)
}

/// Splits `text` on `\r\n`, `\r`, and `\n`, treating `\r\n` as a single break.
fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return vec![""];
    }
    text.split("\r\n")
        .flat_map(|s| s.split(['\r', '\n']))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fontmanager::MockFontManager;

    #[test]
    fn empty_text_has_zero_width() {
        let fm = MockFontManager::new(10.0);
        let w = measure_width(&fm, "F", FontStyle::Normal, "F", 100.0, "", MeasurementMode::Accurate);
        assert_eq!(w, 0.0);
    }

    #[test]
    fn multiline_takes_the_widest_line() {
        let fm = MockFontManager::new(10.0);
        let w = measure_width(
            &fm,
            "F",
            FontStyle::Normal,
            "F",
            100.0,
            "a\r\nbbbbb\rc",
            MeasurementMode::Accurate,
        );
        assert_eq!(w, fm.measure_accurate("F", FontStyle::Normal, "F", 100.0, "bbbbb"));
    }

    #[test]
    fn crlf_is_one_break_not_two() {
        assert_eq!(split_lines("a\r\nb"), vec!["a", "b"]);
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!(MeasurementMode::parse("fast"), Some(MeasurementMode::Fast));
        assert_eq!(MeasurementMode::parse("PIXEL-PERFECT"), Some(MeasurementMode::PixelPerfect));
        assert_eq!(MeasurementMode::parse("bogus"), None);
    }
}
