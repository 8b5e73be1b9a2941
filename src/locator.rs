// this_file: src/locator.rs
//! C1 JSON Locator — finds named-layer substructures inside the animation
//! document by text search and brace-balancing, without building a full
//! JSON model (§4.1, §9 "regex-driven JSON surgery").

use regex::Regex;
use std::ops::Range;

/// Byte-range window a bounded brace/bracket scan is allowed to cover before
/// giving up and reporting "not found" instead of scanning unbounded regions.
const SCAN_WINDOW: usize = 5000;
/// Window used when checking whether a `"type"`/`"t"` field is in range of a
/// candidate layer's `name` field.
const TYPE_WINDOW: usize = 1000;

/// What the locator found for one named text layer.
#[derive(Debug, Clone, Default)]
pub struct LayerLocation {
    /// Byte offset of the layer's `"nm"` field (the key, not the value).
    pub name_offset: usize,
    /// Whether a `"ty":5` field was found within [`TYPE_WINDOW`] bytes.
    pub is_text_layer: bool,
    /// Byte range of the text style object (`t.d.k[0].s`), if found.
    pub style_range: Option<Range<usize>>,
    /// Byte ranges of each position-animator keyframe's `"s":[x,y,z]` array.
    pub animator_ranges: Vec<Range<usize>>,
}

/// Locates a layer named `layer_name` inside `doc`. Never fails fatally —
/// returns `None` when the layer cannot be found by any of the three lookup
/// strategies (§4.1 Algorithm).
pub fn locate_layer(doc: &str, layer_name: &str) -> Option<LayerLocation> {
    let name_offset = find_name_offset(doc, layer_name)?;
    let is_text_layer = has_text_type_nearby(doc, name_offset);

    let mut loc = LayerLocation {
        name_offset,
        is_text_layer,
        style_range: None,
        animator_ranges: Vec::new(),
    };

    if !is_text_layer {
        return Some(loc);
    }

    if let Some(t_range) = find_text_data_object(doc, name_offset) {
        loc.style_range = find_style_range(doc, t_range.clone());
        loc.animator_ranges = find_animator_ranges(doc, t_range);
    }

    Some(loc)
}

/// Strategy (1)+(2): anchored regex search, escaped then unescaped.
/// Strategy (3): linear scan comparing quoted values. Strategy 3 is
/// authoritative; 1 and 2 are fast paths that must agree with it in the
/// common case but a mismatch is resolved by falling through to 3.
fn find_name_offset(doc: &str, layer_name: &str) -> Option<usize> {
    let escaped = regex::escape(layer_name);
    if let Ok(re) = Regex::new(&format!(r#""nm"\s*:\s*"{}""#, escaped)) {
        if let Some(m) = re.find(doc) {
            return Some(m.start());
        }
    }
    if let Ok(re) = Regex::new(&format!(r#""nm"\s*:\s*"{}""#, layer_name)) {
        if let Some(m) = re.find(doc) {
            return Some(m.start());
        }
    }
    linear_scan_name(doc, layer_name)
}

fn linear_scan_name(doc: &str, layer_name: &str) -> Option<usize> {
    let bytes = doc.as_bytes();
    let key = b"\"nm\"";
    let mut i = 0;
    while let Some(rel) = find_sub(&bytes[i..], key) {
        let key_pos = i + rel;
        let mut cursor = key_pos + key.len();
        while cursor < bytes.len() && (bytes[cursor] as char).is_whitespace() {
            cursor += 1;
        }
        if cursor < bytes.len() && bytes[cursor] == b':' {
            cursor += 1;
            while cursor < bytes.len() && (bytes[cursor] as char).is_whitespace() {
                cursor += 1;
            }
            if cursor < bytes.len() && bytes[cursor] == b'"' {
                if let Some(value) = extract_quoted_string(doc, cursor) {
                    if value == layer_name {
                        return Some(key_pos);
                    }
                }
            }
        }
        i = key_pos + key.len();
    }
    None
}

/// Extracts the unescaped contents of the quoted string starting at `quote_idx`
/// (the index of the opening `"`), honoring backslash escapes.
fn extract_quoted_string(doc: &str, quote_idx: usize) -> Option<String> {
    let bytes = doc.as_bytes();
    if bytes.get(quote_idx) != Some(&b'"') {
        return None;
    }
    let mut out = String::new();
    let mut i = quote_idx + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => return Some(out),
            b'\\' if i + 1 < bytes.len() => {
                out.push(bytes[i + 1] as char);
                i += 2;
            }
            b => {
                out.push(b as char);
                i += 1;
            }
        }
    }
    None
}

fn find_sub(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn has_text_type_nearby(doc: &str, name_offset: usize) -> bool {
    let start = name_offset.saturating_sub(TYPE_WINDOW);
    let end = (name_offset + TYPE_WINDOW).min(doc.len());
    let window = &doc[start..end];
    let re = Regex::new(r#""ty"\s*:\s*5\b"#).unwrap();
    re.is_match(window)
}

/// Locates the layer's text-data object (`t`): skips `t`-keyed occurrences
/// whose value starts with a digit (keyframe times) and selects the first
/// whose value starts with `{` and whose first 100 bytes contain `"d"`.
fn find_text_data_object(doc: &str, name_offset: usize) -> Option<Range<usize>> {
    let bytes = doc.as_bytes();
    let search_start = name_offset;
    let search_end = (name_offset + SCAN_WINDOW).min(bytes.len());
    let mut cursor = search_start;

    while cursor < search_end {
        let rel = find_sub(&bytes[cursor..search_end], b"\"t\"")?;
        let key_pos = cursor + rel;
        let mut v = key_pos + 3;
        while v < bytes.len() && (bytes[v] as char).is_whitespace() {
            v += 1;
        }
        if v >= bytes.len() || bytes[v] != b':' {
            cursor = key_pos + 3;
            continue;
        }
        v += 1;
        while v < bytes.len() && (bytes[v] as char).is_whitespace() {
            v += 1;
        }
        if v >= bytes.len() {
            return None;
        }
        if bytes[v] == b'{' {
            let probe_end = (v + 100).min(bytes.len());
            if find_sub(&bytes[v..probe_end], b"\"d\"").is_some() {
                if let Some(end) = scan_balanced(bytes, v, b'{', b'}', SCAN_WINDOW) {
                    return Some(v..end);
                }
            }
        }
        cursor = key_pos + 3;
    }
    None
}

/// Within the text-data object, navigates `d.k[0].s` to the style object.
fn find_style_range(doc: &str, t_range: Range<usize>) -> Option<Range<usize>> {
    let bytes = doc.as_bytes();
    let d_key = find_sub(&bytes[t_range.clone()], b"\"d\"")? + t_range.start;
    let d_obj_start = find_char_after(bytes, d_key, b'{', t_range.end)?;
    let d_obj_end = scan_balanced(bytes, d_obj_start, b'{', b'}', SCAN_WINDOW)?;

    let k_key = find_sub(&bytes[d_obj_start..d_obj_end], b"\"k\"")? + d_obj_start;
    let k_arr_start = find_char_after(bytes, k_key, b'[', d_obj_end)?;
    let first_elem_start = find_char_after(bytes, k_arr_start, b'{', d_obj_end)?;
    let first_elem_end = scan_balanced(bytes, first_elem_start, b'{', b'}', SCAN_WINDOW)?;

    let s_key = find_sub(&bytes[first_elem_start..first_elem_end], b"\"s\"")? + first_elem_start;
    let s_obj_start = find_char_after(bytes, s_key, b'{', first_elem_end)?;
    let s_obj_end = scan_balanced(bytes, s_obj_start, b'{', b'}', SCAN_WINDOW)?;

    Some(s_obj_start..s_obj_end)
}

/// Within the text-data object, finds the `"a":[...]` text-animators array
/// and collects every keyframe's `"s":[x,y,z]` start-value array range.
fn find_animator_ranges(doc: &str, t_range: Range<usize>) -> Vec<Range<usize>> {
    let bytes = doc.as_bytes();
    let mut out = Vec::new();

    let Some(a_rel) = find_sub(&bytes[t_range.clone()], b"\"a\":[") else {
        return out;
    };
    let a_key = a_rel + t_range.start;
    let Some(arr_start) = find_char_after(bytes, a_key, b'[', t_range.end) else {
        return out;
    };
    let Some(arr_end) = scan_balanced(bytes, arr_start, b'[', b']', SCAN_WINDOW) else {
        return out;
    };

    let mut cursor = arr_start;
    while cursor < arr_end {
        let Some(rel) = find_sub(&bytes[cursor..arr_end], b"\"p\":{") else {
            break;
        };
        let p_key = cursor + rel;
        let Some(p_start) = find_char_after(bytes, p_key, b'{', arr_end) else {
            break;
        };
        let Some(p_end) = scan_balanced(bytes, p_start, b'{', b'}', SCAN_WINDOW) else {
            break;
        };

        if let Some(k_rel) = find_sub(&bytes[p_start..p_end], b"\"k\":[") {
            let k_key = p_start + k_rel;
            if let Some(k_start) = find_char_after(bytes, k_key, b'[', p_end) {
                if let Some(k_end) = scan_balanced(bytes, k_start, b'[', b']', SCAN_WINDOW) {
                    collect_keyframe_starts(bytes, k_start, k_end, &mut out);
                }
            }
        }
        cursor = p_end;
    }

    out
}

fn collect_keyframe_starts(bytes: &[u8], start: usize, end: usize, out: &mut Vec<Range<usize>>) {
    let mut cursor = start;
    while cursor < end {
        let Some(rel) = find_sub(&bytes[cursor..end], b"\"s\":[") else {
            break;
        };
        let s_key = cursor + rel;
        let Some(arr_start) = find_char_after(bytes, s_key, b'[', end) else {
            break;
        };
        let Some(arr_end) = scan_balanced(bytes, arr_start, b'[', b']', SCAN_WINDOW) else {
            break;
        };
        out.push(arr_start..arr_end);
        cursor = arr_end;
    }
}

/// Finds the first occurrence of `ch` at or after `from`, bounded by `limit`.
fn find_char_after(bytes: &[u8], from: usize, ch: u8, limit: usize) -> Option<usize> {
    let limit = limit.min(bytes.len());
    (from..limit).find(|&i| bytes[i] == ch)
}

/// Counts matching open/close brackets starting at `open_idx` (which must be
/// `open`), bounded by `max_window` bytes, returning the index just past the
/// matching close bracket. Returns `None` if the window is exhausted first
/// (malformed/truncated input), per §4.1's bounded-scan requirement.
fn scan_balanced(bytes: &[u8], open_idx: usize, open: u8, close: u8, max_window: usize) -> Option<usize> {
    if bytes.get(open_idx) != Some(&open) {
        return None;
    }
    let limit = (open_idx + max_window).min(bytes.len());
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut i = open_idx;
    while i < limit {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 1;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(i + 1);
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> String {
        r#"{"layers":[{"nm":"Title","ty":5,"t":{"d":{"k":[{"s":{"s":100,"f":"Arial","t":"A","sz":[500,200]}}]},"a":[{"a":{"p":{"k":[{"s":[-600,0,0]},{"s":[0,0,0]}]}}}]}}]}"#.to_string()
    }

    #[test]
    fn finds_name_and_type() {
        let doc = sample_doc();
        let loc = locate_layer(&doc, "Title").unwrap();
        assert!(loc.is_text_layer);
        assert_eq!(&doc[loc.name_offset..loc.name_offset + 4], "\"nm\"");
    }

    #[test]
    fn finds_style_object() {
        let doc = sample_doc();
        let loc = locate_layer(&doc, "Title").unwrap();
        let range = loc.style_range.unwrap();
        let style = &doc[range];
        assert!(style.contains("\"s\":100"));
        assert!(style.contains("\"t\":\"A\""));
    }

    #[test]
    fn finds_animator_keyframes() {
        let doc = sample_doc();
        let loc = locate_layer(&doc, "Title").unwrap();
        assert_eq!(loc.animator_ranges.len(), 2);
        assert_eq!(&doc[loc.animator_ranges[0].clone()], "[-600,0,0]");
    }

    #[test]
    fn missing_layer_returns_none() {
        let doc = sample_doc();
        assert!(locate_layer(&doc, "Nope").is_none());
    }

    #[test]
    fn non_text_layer_has_no_style_range() {
        let doc = r#"{"layers":[{"nm":"Shape","ty":4}]}"#;
        let loc = locate_layer(doc, "Shape").unwrap();
        assert!(!loc.is_text_layer);
        assert!(loc.style_range.is_none());
    }
}
