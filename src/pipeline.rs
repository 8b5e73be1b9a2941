// this_file: src/pipeline.rs
//! Wires C1 (locator), C2 (overrides), C3 (sizer), C4 (measurer), and C5
//! (mutator) together: the "Override Parser → {Text Sizer ⇄ Measurer ⇄ JSON
//! Locator} → JSON Mutator" leg of the data flow in §2.

use crate::fontmanager::FontManager;
use crate::locator::locate_layer;
use crate::measure::{measure_width, MeasurementMode};
use crate::model::{FontInfo, FontStyle, LayerModification};
use crate::mutator::apply_modifications;
use crate::overrides::OverrideDocument;
use crate::sizer::{choose_size, SizeResult};
use serde_json::Value;

/// One entry of the animation's `fonts.list[]` (§6).
#[derive(Debug, Clone)]
pub struct FontListEntry {
    pub name: String,
    pub family: String,
    pub style: FontStyle,
}

pub fn parse_fonts_list(root: &Value) -> Vec<FontListEntry> {
    root.get("fonts")
        .and_then(|f| f.get("list"))
        .and_then(|l| l.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    let name = e.get("fName")?.as_str()?.to_string();
                    let family = e.get("fFamily").and_then(|v| v.as_str()).unwrap_or(&name).to_string();
                    let style = e
                        .get("fStyle")
                        .and_then(|v| v.as_str())
                        .map(FontStyle::from_style_name)
                        .unwrap_or(FontStyle::Normal);
                    Some(FontListEntry { name, family, style })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn resolve_family_style(fonts_list: &[FontListEntry], font_name: &str) -> (String, FontStyle) {
    fonts_list
        .iter()
        .find(|e| e.name == font_name)
        .map(|e| (e.family.clone(), e.style))
        .unwrap_or_else(|| (font_name.to_string(), FontStyle::Normal))
}

/// Applies all text-layer overrides to `doc`, returning the mutated
/// document. Unknown layers and any single layer's failures are logged and
/// skipped; rendering always proceeds (§4.2 Errors, §4.5 Errors).
pub fn apply_text_overrides(
    doc: &str,
    overrides: &OverrideDocument,
    fonts_list: &[FontListEntry],
    fm: &dyn FontManager,
    animation_width: f64,
    text_padding: f64,
    mode: MeasurementMode,
) -> String {
    let mut mods = Vec::new();

    for (layer_name, ov) in &overrides.text_layers {
        let Some(loc) = locate_layer(doc, layer_name) else {
            log::warn!("override references unknown layer '{}'", layer_name);
            continue;
        };
        if !loc.is_text_layer {
            log::warn!("override references non-text layer '{}'", layer_name);
            continue;
        }
        let Some(style_range) = loc.style_range.clone() else {
            log::debug!("no text-data object found for layer '{}'", layer_name);
            continue;
        };

        let style_json: Value = match serde_json::from_str(&doc[style_range.clone()]) {
            Ok(v) => v,
            Err(e) => {
                log::debug!("style object for '{}' is not valid JSON: {}", layer_name, e);
                continue;
            }
        };

        let original_size = style_json.get("s").and_then(|v| v.as_f64()).unwrap_or(0.0);
        let original_text = style_json.get("t").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let font_name = style_json.get("f").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let box_width_from_style = style_json
            .get("sz")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|v| v.as_f64());

        let (family, style) = resolve_family_style(fonts_list, &font_name);

        // Text-box width precedence (§9): override's textBoxWidth > sz[0] > w.
        let raw_target_width = ov
            .text_box_width
            .or(box_width_from_style)
            .unwrap_or(animation_width);
        let target_width = raw_target_width * text_padding;

        let text_to_use = ov.value.clone().unwrap_or_else(|| original_text.clone());

        let info = FontInfo {
            family: family.clone(),
            style,
            name: font_name.clone(),
            size: original_size,
            text: text_to_use.clone(),
            text_box_width: raw_target_width,
        };

        let (final_text, optimal_size) = if ov.autofit_enabled() {
            let min = ov.min_size.unwrap();
            let max = ov.max_size.unwrap();
            match choose_size(fm, &info.family, info.style, &info.name, &text_to_use, original_size, min, max, target_width, mode) {
                SizeResult::Fits(size) => (text_to_use.clone(), size),
                SizeResult::DidNotFit => match &ov.fallback_text {
                    Some(fallback) => {
                        match choose_size(fm, &info.family, info.style, &info.name, fallback, original_size, min, max, target_width, mode) {
                            SizeResult::Fits(size) => (fallback.clone(), size),
                            SizeResult::DidNotFit => {
                                log::warn!("layer '{}': fallback text also does not fit, using minSize", layer_name);
                                (fallback.clone(), min)
                            }
                        }
                    }
                    None => {
                        log::warn!("layer '{}': text does not fit and no fallbackText set, using minSize", layer_name);
                        (text_to_use.clone(), min)
                    }
                },
            }
        } else {
            // No minSize/maxSize: autofit disabled, size stays as-authored
            // (§8 boundary behavior), only the text content may change.
            (text_to_use.clone(), original_size)
        };

        let original_width = measure_width(fm, &family, style, &font_name, original_size, &original_text, mode);
        let new_width = measure_width(fm, &family, style, &font_name, optimal_size, &final_text, mode);

        mods.push(LayerModification {
            layer_name: layer_name.clone(),
            text_to_use: final_text,
            optimal_size,
            original_width,
            new_width,
            style_range,
            animator_ranges: loc.animator_ranges,
        });
    }

    apply_modifications(doc, mods)
}
