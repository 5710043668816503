use crate::{ElementId, Host};

pub(crate) const MARGIN_PROPERTIES: [&str; 5] = [
    "margin",
    "margin-left",
    "margin-right",
    "margin-top",
    "margin-bottom",
];

/// Properties read from an element before pinning it: its bounds plus `display`.
pub(crate) const PIN_CSS_PROPERTIES: [&str; 10] = [
    "top",
    "left",
    "bottom",
    "right",
    "margin",
    "margin-left",
    "margin-right",
    "margin-top",
    "margin-bottom",
    "display",
];

/// Inline properties a pin rewrites on its element and restores on reset.
pub(crate) const PIN_RESTORE_PROPERTIES: [&str; 13] = [
    "top",
    "left",
    "bottom",
    "right",
    "margin",
    "margin-left",
    "margin-right",
    "margin-top",
    "margin-bottom",
    "width",
    "height",
    "position",
    "box-sizing",
];

/// Parses the leading number of a CSS value the way `parseFloat` does (`"12.5px"` → `12.5`).
///
/// Returns `NaN` when the value does not start with a number.
pub fn parse_float(value: &str) -> f64 {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_start {
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(f64::NAN)
}

/// `parse_float`, with anything unparsable treated as zero.
pub(crate) fn float_or_zero(value: &str) -> f64 {
    let v = parse_float(value);
    if v.is_finite() { v } else { 0.0 }
}

pub(crate) fn px(value: f64) -> String {
    format!("{value}px")
}

/// Display types whose vertical margins collapse with neighbours.
pub(crate) fn is_margin_collapse_type(display: &str) -> bool {
    matches!(
        display,
        "block" | "flex" | "list-item" | "table" | "-webkit-box"
    )
}

pub(crate) fn read_styles(
    host: &dyn Host,
    element: ElementId,
    properties: &[&'static str],
) -> Vec<(&'static str, String)> {
    properties
        .iter()
        .map(|&p| (p, host.computed_style(element, p)))
        .collect()
}

pub(crate) fn read_inline_styles(
    host: &dyn Host,
    element: ElementId,
    properties: &[&'static str],
) -> Vec<(&'static str, String)> {
    properties
        .iter()
        .map(|&p| (p, host.inline_style(element, p)))
        .collect()
}

pub(crate) fn write_styles<S: AsRef<str>>(
    host: &dyn Host,
    element: ElementId,
    styles: &[(&'static str, S)],
) {
    for (property, value) in styles {
        host.set_inline_style(element, property, value.as_ref());
    }
}

pub(crate) fn style_value<'a>(styles: &'a [(&'static str, String)], property: &str) -> &'a str {
    styles
        .iter()
        .find(|(p, _)| *p == property)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}
