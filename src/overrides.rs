// this_file: src/overrides.rs
//! C2 Override Parser — typed records parsed from the override document
//! (§4.2, §3 "Override record" / "Image override record").

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A per-layer override record. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextLayerOverride {
    #[serde(rename = "minSize")]
    pub min_size: Option<f64>,
    #[serde(rename = "maxSize")]
    pub max_size: Option<f64>,
    #[serde(rename = "fallbackText")]
    pub fallback_text: Option<String>,
    #[serde(rename = "textBoxWidth")]
    pub text_box_width: Option<f64>,
    pub value: Option<String>,
}

impl TextLayerOverride {
    /// Autofit is enabled only when both bounds are present (§3).
    pub fn autofit_enabled(&self) -> bool {
        self.min_size.is_some() && self.max_size.is_some()
    }

    fn validate(&self, layer_name: &str) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if !(max > min && min > 0.0) {
                return Err(Error::InvalidOverride(format!(
                    "layer '{}': maxSize ({}) must be > minSize ({}) > 0",
                    layer_name, max, min
                )));
            }
        }
        if let Some(w) = self.text_box_width {
            if w <= 0.0 {
                return Err(Error::InvalidOverride(format!(
                    "layer '{}': textBoxWidth must be > 0, got {}",
                    layer_name, w
                )));
            }
        }
        Ok(())
    }
}

/// A per-asset image override record (§3).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImageLayerOverride {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
}

impl ImageLayerOverride {
    /// Resolves the final path per §3: if `filePath` is empty, `fileName`
    /// must be the full path; otherwise `filePath + fileName`, with a
    /// relative `filePath` resolved against `override_dir`.
    pub fn resolve_path(&self, override_dir: &Path) -> Option<PathBuf> {
        let file_name = self.file_name.as_deref().unwrap_or("");
        match self.file_path.as_deref() {
            None | Some("") => {
                if file_name.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(file_name))
                }
            }
            Some(file_path) => {
                let base = Path::new(file_path);
                let base = if base.is_relative() {
                    override_dir.join(base)
                } else {
                    base.to_path_buf()
                };
                Some(base.join(file_name))
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOverrideDocument {
    #[serde(rename = "textLayers")]
    text_layers: HashMap<String, TextLayerOverride>,
    #[serde(rename = "imageLayers")]
    image_layers: HashMap<String, ImageLayerOverride>,
}

/// The parsed override document: named-layer text overrides and per-asset
/// image overrides. Unknown top-level keys are ignored by serde's default
/// `#[serde(default)]` field handling.
#[derive(Debug, Clone, Default)]
pub struct OverrideDocument {
    pub text_layers: HashMap<String, TextLayerOverride>,
    pub image_layers: HashMap<String, ImageLayerOverride>,
}

/// Parses `raw` as an override document. On any parse/validation failure,
/// logs an error and returns an empty document so rendering can proceed
/// (§4.2 Errors, §7.2 layer-local).
pub fn parse_override_document(raw: &str) -> OverrideDocument {
    match parse_override_document_strict(raw) {
        Ok(doc) => doc,
        Err(e) => {
            log::error!("invalid override document, proceeding without overrides: {}", e);
            OverrideDocument::default()
        }
    }
}

fn parse_override_document_strict(raw: &str) -> Result<OverrideDocument> {
    let parsed: RawOverrideDocument = serde_json::from_str(raw)?;
    for (name, ov) in &parsed.text_layers {
        ov.validate(name)?;
    }
    let mut text_layers = HashMap::with_capacity(parsed.text_layers.len());
    for (name, mut ov) in parsed.text_layers {
        normalize_value(&mut ov.value);
        normalize_value(&mut ov.fallback_text);
        text_layers.insert(name, ov);
    }
    Ok(OverrideDocument {
        text_layers,
        image_layers: parsed.image_layers,
    })
}

/// Folds ``/ASCII ETX and `\n` to `\r`, the line break the rasterizer
/// recognizes inside text content (§4.2 Normalization).
fn normalize_value(value: &mut Option<String>) {
    if let Some(v) = value {
        let folded: String = v
            .chars()
            .map(|c| if c == '\u{3}' || c == '\n' { '\r' } else { c })
            .collect();
        *v = folded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_and_image_layers() {
        let raw = r#"{
            "textLayers": {"Title": {"minSize": 20, "maxSize": 200, "value": "Hi"}},
            "imageLayers": {"logo": {"filePath": "assets", "fileName": "logo.png"}}
        }"#;
        let doc = parse_override_document(raw);
        assert!(doc.text_layers["Title"].autofit_enabled());
        assert_eq!(doc.text_layers["Title"].value.as_deref(), Some("Hi"));
        assert!(doc.image_layers.contains_key("logo"));
    }

    #[test]
    fn invalid_size_bounds_are_rejected_document_wide() {
        let raw = r#"{"textLayers": {"Title": {"minSize": 200, "maxSize": 20}}}"#;
        let doc = parse_override_document(raw);
        assert!(doc.text_layers.is_empty());
    }

    #[test]
    fn malformed_json_yields_empty_document() {
        let doc = parse_override_document("{not json");
        assert!(doc.text_layers.is_empty());
        assert!(doc.image_layers.is_empty());
    }

    #[test]
    fn normalizes_line_breaks() {
        let raw = r#"{"textLayers": {"T": {"value": "ab\nc"}}}"#;
        let doc = parse_override_document(raw);
        assert_eq!(doc.text_layers["T"].value.as_deref(), Some("ab\rc"));
    }

    #[test]
    fn image_override_resolves_relative_path() {
        let ov = ImageLayerOverride {
            file_path: Some("assets".into()),
            file_name: Some("logo.png".into()),
        };
        let resolved = ov.resolve_path(Path::new("/work/input")).unwrap();
        assert_eq!(resolved, PathBuf::from("/work/input/assets/logo.png"));
    }

    #[test]
    fn image_override_with_empty_file_path_uses_full_filename() {
        let ov = ImageLayerOverride {
            file_path: None,
            file_name: Some("/abs/logo.png".into()),
        };
        let resolved = ov.resolve_path(Path::new("/work/input")).unwrap();
        assert_eq!(resolved, PathBuf::from("/abs/logo.png"));
    }
}
