// this_file: src/sizer.rs
//! C3 Text Sizer — binary search for a font size that fits a padded target
//! width (§4.4).

use crate::fontmanager::FontManager;
use crate::measure::{measure_width, MeasurementMode};
use crate::model::FontStyle;

/// Outcome of the sizing search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeResult {
    Fits(f64),
    DidNotFit,
}

/// Default text-padding factor applied to the raw target width (§4.4 Padding).
pub const DEFAULT_TEXT_PADDING: f64 = 0.97;

#[allow(clippy::too_many_arguments)]
pub fn choose_size(
    fm: &dyn FontManager,
    family: &str,
    style: FontStyle,
    name: &str,
    text: &str,
    current_size: f64,
    min_size: f64,
    max_size: f64,
    target_width: f64,
    mode: MeasurementMode,
) -> SizeResult {
    if text.is_empty() {
        return SizeResult::Fits(current_size);
    }

    let width_at = |size: f64| measure_width(fm, family, style, name, size, text, mode);

    let w0 = width_at(current_size);
    if w0 <= target_width {
        let best = binary_search_grow(&width_at, current_size, max_size, target_width, 10);
        return SizeResult::Fits(best.min(max_size));
    }

    let w_min = width_at(min_size);
    if w_min > target_width {
        return SizeResult::DidNotFit;
    }

    let best = binary_search_shrink(&width_at, min_size, current_size, target_width, 15);
    SizeResult::Fits(best)
}

/// Finds the largest size in `[lo, hi]` whose measured width is `<= target`,
/// assuming width is monotonically non-decreasing in size and `width(lo) <= target`
/// (§4.4 step 2: search upward from a known-fitting size).
fn binary_search_grow(width_at: &dyn Fn(f64) -> f64, lo: f64, hi: f64, target: f64, iterations: u32) -> f64 {
    let (mut lo, mut hi) = (lo, hi);
    let mut best = lo;
    for _ in 0..iterations {
        let mid = (lo + hi) / 2.0;
        if width_at(mid) <= target {
            best = mid;
            lo = mid;
        } else {
            hi = mid;
        }
    }
    best
}

/// Finds the largest size in `[lo, hi]` whose measured width is `<= target`,
/// assuming `width(lo) <= target < width(hi)` (§4.4 step 4: search downward
/// from a known-overflowing size), stopping early once the interval is tight.
fn binary_search_shrink(
    width_at: &dyn Fn(f64) -> f64,
    lo: f64,
    hi: f64,
    target: f64,
    max_iterations: u32,
) -> f64 {
    let (mut lo, mut hi) = (lo, hi);
    let mut best = lo;
    for _ in 0..max_iterations {
        if hi - lo < 0.1 {
            break;
        }
        let mid = (lo + hi) / 2.0;
        if width_at(mid) <= target {
            best = mid;
            lo = mid;
        } else {
            hi = mid;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fontmanager::MockFontManager;

    #[test]
    fn shrinks_when_text_too_wide() {
        let fm = MockFontManager::new(10.0);
        let result = choose_size(
            &fm,
            "F",
            FontStyle::Normal,
            "F",
            "A very very long title string that needs quite a bit of shrinking",
            100.0,
            20.0,
            200.0,
            485.0,
            MeasurementMode::Accurate,
        );
        match result {
            SizeResult::Fits(size) => {
                assert!(size < 100.0);
                let w = measure_width(
                    &fm,
                    "F",
                    FontStyle::Normal,
                    "F",
                    size,
                    "A very very long title string that needs quite a bit of shrinking",
                    MeasurementMode::Accurate,
                );
                assert!(w <= 485.0);
            }
            SizeResult::DidNotFit => panic!("expected a fit"),
        }
    }

    #[test]
    fn grows_when_text_fits_comfortably() {
        let fm = MockFontManager::new(10.0);
        let result = choose_size(&fm, "F", FontStyle::Normal, "F", "Title", 40.0, 20.0, 200.0, 485.0, MeasurementMode::Accurate);
        match result {
            SizeResult::Fits(size) => {
                assert!(size > 40.0);
                assert!(size <= 200.0);
            }
            SizeResult::DidNotFit => panic!("expected a fit"),
        }
    }

    #[test]
    fn reports_did_not_fit_when_min_size_overflows() {
        let fm = MockFontManager::new(10.0);
        let long_text = "x".repeat(500);
        let result = choose_size(&fm, "F", FontStyle::Normal, "F", &long_text, 100.0, 50.0, 100.0, 500.0, MeasurementMode::Accurate);
        assert_eq!(result, SizeResult::DidNotFit);
    }

    #[test]
    fn empty_text_keeps_original_size() {
        let fm = MockFontManager::new(10.0);
        let result = choose_size(&fm, "F", FontStyle::Normal, "F", "", 40.0, 20.0, 200.0, 485.0, MeasurementMode::Accurate);
        assert_eq!(result, SizeResult::Fits(40.0));
    }
}
