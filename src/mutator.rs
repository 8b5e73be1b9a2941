// this_file: src/mutator.rs
//! C5 JSON Mutator — applies computed [`LayerModification`]s back into the
//! animation document text (§4.5).

use crate::model::LayerModification;
use log::{error, warn};
use std::ops::Range;

/// Applies all modifications to `doc`, in reverse document order (by style
/// range start) so earlier byte offsets stay valid as later ones are
/// rewritten (§4.5 Ordering). Any modification whose byte ranges can't be
/// matched is skipped and logged; the document is left untouched for that
/// layer (§4.5 Errors).
pub fn apply_modifications(doc: &str, mut mods: Vec<LayerModification>) -> String {
    mods.sort_by_key(|m| std::cmp::Reverse(m.style_range.start));

    let mut out = doc.to_string();
    for m in &mods {
        if let Err(e) = apply_one(&mut out, m) {
            error!("mutation failed for layer '{}': {}", m.layer_name, e);
        }
    }
    out
}

fn apply_one(doc: &mut String, m: &LayerModification) -> Result<(), String> {
    if m.style_range.end > doc.len() || m.style_range.start > m.style_range.end {
        return Err("style range out of bounds".into());
    }

    // Work from the end of the style object backward so earlier rewrites in
    // this same object (size, then text) don't invalidate later offsets.
    let style_before = doc[m.style_range.clone()].to_string();

    let with_text = rewrite_text_field(&style_before, &m.text_to_use)
        .ok_or_else(|| "could not find \"t\" field in style object".to_string())?;
    let with_size = rewrite_size_field(&with_text, m.optimal_size)
        .ok_or_else(|| "could not find \"s\" field in style object".to_string())?;

    doc.replace_range(m.style_range.clone(), &with_size);

    let delta = with_size.len() as isize - style_before.len() as isize;
    apply_animator_shift(doc, m, delta)?;

    Ok(())
}

/// (a) Font size: replaces the numeric `"s"` field's value, formatted to one
/// fractional digit.
fn rewrite_size_field(style: &str, new_size: f64) -> Option<String> {
    let key_pos = style.find("\"s\"")?;
    let colon = style[key_pos..].find(':')? + key_pos + 1;
    let mut v_start = colon;
    while v_start < style.len() && style.as_bytes()[v_start].is_ascii_whitespace() {
        v_start += 1;
    }
    let mut v_end = v_start;
    let bytes = style.as_bytes();
    while v_end < bytes.len() && (bytes[v_end].is_ascii_digit() || bytes[v_end] == b'.' || bytes[v_end] == b'-') {
        v_end += 1;
    }
    if v_end == v_start {
        return None;
    }
    let mut out = String::with_capacity(style.len());
    out.push_str(&style[..v_start]);
    out.push_str(&format!("{:.1}", new_size));
    out.push_str(&style[v_end..]);
    Some(out)
}

/// (b) Text content: replaces the quoted `"t"` field's content, escaping
/// backslashes first, then double-quotes, then `\r` to the JSON escape
/// `\u000D`, then tabs to the two-character sequence `\t`.
fn rewrite_text_field(style: &str, new_text: &str) -> Option<String> {
    let key_pos = style.find("\"t\"")?;
    let colon = style[key_pos..].find(':')? + key_pos + 1;
    let mut q_start = colon;
    while q_start < style.len() && style.as_bytes()[q_start] != b'"' {
        if !style.as_bytes()[q_start].is_ascii_whitespace() {
            return None;
        }
        q_start += 1;
    }
    let content_start = q_start + 1;
    let content_end = find_closing_quote(style, content_start)?;

    let escaped = escape_text(new_text);
    let mut out = String::with_capacity(style.len());
    out.push_str(&style[..content_start]);
    out.push_str(&escaped);
    out.push_str(&style[content_end..]);
    Some(out)
}

fn find_closing_quote(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\u000D"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// (c) Animator X-position: only when the new text grew wider than the
/// original (ΔW > 0), shifts every negative keyframe X further left by
/// |ΔW| (§4.5(c), §9 open question — the shrink case intentionally leaves
/// positions unchanged).
fn apply_animator_shift(doc: &mut String, m: &LayerModification, style_delta: isize) -> Result<(), String> {
    let delta_w = m.new_width - m.original_width;
    if delta_w <= 0.0 {
        return Ok(());
    }

    let mut ranges: Vec<Range<usize>> = m
        .animator_ranges
        .iter()
        .map(|r| shift_range(r, m.style_range.start, style_delta))
        .collect();
    ranges.sort_by_key(|r| std::cmp::Reverse(r.start));

    for range in ranges {
        if range.end > doc.len() {
            warn!("animator keyframe range out of bounds after shift, skipping");
            continue;
        }
        let array_text = doc[range.clone()].to_string();
        match shift_negative_x(&array_text, delta_w) {
            Some(shifted) => doc.replace_range(range, &shifted),
            None => warn!("could not parse animator keyframe array '{}', skipping", array_text),
        }
    }
    Ok(())
}

/// A byte range located before the style-object rewrite must be shifted by
/// the style object's length delta if it falls after the style object.
fn shift_range(range: &Range<usize>, style_start: usize, delta: isize) -> Range<usize> {
    if range.start >= style_start {
        let apply = |v: usize| (v as isize + delta).max(0) as usize;
        apply(range.start)..apply(range.end)
    } else {
        range.clone()
    }
}

/// Parses a `[x,y,z]` literal; if `x < 0`, shifts it further left by `|delta_w|`.
fn shift_negative_x(array_text: &str, delta_w: f64) -> Option<String> {
    let inner = array_text.trim_start_matches('[').trim_end_matches(']');
    let mut parts: Vec<&str> = inner.splitn(3, ',').collect();
    if parts.len() < 2 {
        return None;
    }
    let x: f64 = parts[0].trim().parse().ok()?;
    if x >= 0.0 {
        return Some(array_text.to_string());
    }
    let new_x = x - delta_w.abs();
    let formatted = format_number(new_x);
    parts[0] = &formatted;
    Some(format!("[{}]", parts.join(",")))
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_modification(style_range: Range<usize>, animator_ranges: Vec<Range<usize>>) -> LayerModification {
        LayerModification {
            layer_name: "Title".into(),
            text_to_use: "Hi there".into(),
            optimal_size: 42.5,
            original_width: 100.0,
            new_width: 250.0,
            style_range,
            animator_ranges,
        }
    }

    #[test]
    fn rewrites_size_and_text() {
        let style = r#"{"s":100,"f":"Arial","t":"A","sz":[500,200]}"#;
        let doc = format!("{{\"layers\":[{{\"t\":{{\"d\":{{\"k\":[{{\"s\":{}}}]}}}}}}}}]}}", style);
        let start = doc.find(style).unwrap();
        let range = start..start + style.len();
        let m = sample_modification(range, vec![]);
        let out = apply_modifications(&doc, vec![m]);
        assert!(out.contains("\"s\":42.5"));
        assert!(out.contains("\"t\":\"Hi there\""));
    }

    #[test]
    fn escapes_special_characters_in_text() {
        let style = r#"{"s":10,"t":"old"}"#;
        let doc = format!("{{\"x\":{}}}", style);
        let start = doc.find(style).unwrap();
        let mut m = sample_modification(start..start + style.len(), vec![]);
        m.text_to_use = "He said \"hi\"\r\tbye".into();
        let out = apply_modifications(&doc, vec![m]);
        assert!(out.contains("\"t\":\"He said \\\"hi\\\"\\u000D\\tbye\""));
    }

    #[test]
    fn shifts_negative_x_only_when_wider() {
        let style = r#"{"s":10,"t":"a"}"#;
        let animator = "[-600,0,0]";
        let doc = format!("{{\"style\":{},\"pos\":{}}}", style, animator);
        let style_start = doc.find(style).unwrap();
        let style_range = style_start..style_start + style.len();
        let anim_start = doc.find(animator).unwrap();
        let anim_range = anim_start..anim_start + animator.len();

        let m = sample_modification(style_range, vec![anim_range]);
        let out = apply_modifications(&doc, vec![m]);
        assert!(out.contains("[-750,0,0]"));
    }

    #[test]
    fn narrower_text_leaves_position_unchanged() {
        let style = r#"{"s":10,"t":"a"}"#;
        let animator = "[-600,0,0]";
        let doc = format!("{{\"style\":{},\"pos\":{}}}", style, animator);
        let style_start = doc.find(style).unwrap();
        let style_range = style_start..style_start + style.len();
        let anim_start = doc.find(animator).unwrap();
        let anim_range = anim_start..anim_start + animator.len();

        let mut m = sample_modification(style_range, vec![anim_range]);
        m.new_width = 50.0; // narrower than original_width (100.0)
        let out = apply_modifications(&doc, vec![m]);
        assert!(out.contains("[-600,0,0]"));
    }

    #[test]
    fn reverse_document_order_keeps_offsets_valid() {
        let style_a = r#"{"s":10,"t":"aaa"}"#;
        let style_b = r#"{"s":20,"t":"b"}"#;
        let doc = format!("{{\"first\":{},\"second\":{}}}", style_a, style_b);
        let a_start = doc.find(style_a).unwrap();
        let b_start = doc.find(style_b).unwrap();
        let m_a = sample_modification(a_start..a_start + style_a.len(), vec![]);
        let mut m_b = sample_modification(b_start..b_start + style_b.len(), vec![]);
        m_b.text_to_use = "B".into();
        let out = apply_modifications(&doc, vec![m_a, m_b]);
        assert!(out.contains("\"t\":\"Hi there\""));
        assert!(out.contains("\"t\":\"B\""));
    }
}
