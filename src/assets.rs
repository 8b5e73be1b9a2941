// this_file: src/assets.rs
//! Image override application (§6 Assets, §4.2/§3 "Image override record").
//! Rewrites `u`/`p` of non-embedded assets; `e=1` (embedded data URI) assets
//! are never touched (§9 open question, settled).

use crate::overrides::ImageLayerOverride;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Applies `image_layers` overrides to the animation document's `assets[]`
/// array, keyed by asset `id`. Runs before the text-layer locator pass,
/// since it rewrites the document structurally via a full JSON round-trip
/// rather than the byte-preserving text surgery the layer pipeline uses.
pub fn apply_image_overrides(doc: &str, image_layers: &HashMap<String, ImageLayerOverride>, override_dir: &Path) -> String {
    if image_layers.is_empty() {
        return doc.to_string();
    }

    let mut root: Value = match serde_json::from_str(doc) {
        Ok(v) => v,
        Err(e) => {
            log::error!("cannot parse animation document for image overrides: {}", e);
            return doc.to_string();
        }
    };

    let Some(assets) = root.get_mut("assets").and_then(|a| a.as_array_mut()) else {
        return doc.to_string();
    };

    for asset in assets.iter_mut() {
        let Some(id) = asset.get("id").and_then(|v| v.as_str()).map(str::to_string) else {
            continue;
        };
        let Some(ov) = image_layers.get(&id) else {
            continue;
        };
        let embedded = asset.get("e").and_then(|v| v.as_i64()) == Some(1);
        if embedded {
            log::debug!("asset '{}' is embedded (e=1), skipping image override", id);
            continue;
        }
        let Some(resolved) = ov.resolve_path(override_dir) else {
            log::warn!("image override for asset '{}' has neither filePath nor fileName", id);
            continue;
        };
        let dir = resolved.parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
        let file = resolved.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_default();
        asset["u"] = Value::String(dir);
        asset["p"] = Value::String(file);
    }

    serde_json::to_string(&root).unwrap_or_else(|_| doc.to_string())
}
