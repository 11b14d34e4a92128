//! Single-tag markup extraction for console log lines.
//!
//! Game scripts often colour or annotate their console output by wrapping
//! a line in one tag:
//!
//! ```text
//! <font color='#ff0000'>Hello</font>
//! <log severity="3" tick="12345">Spawn queue empty</log>
//! ```
//!
//! [`extract`] finds the first `<log>` or `<font>` element in a line and
//! returns its attributes and inner text. It is a heuristic, not an HTML
//! parser: anything it cannot make sense of yields `None`, and the caller
//! falls back to the plain line.

use serde_json::{Number, Value};

/// Tag names recognized as a wrapping element (matched case-insensitively).
pub const RECOGNIZED_TAGS: [&str; 2] = ["log", "font"];

/// A wrapping element found in a console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    /// Lowercased tag name (`log` or `font`).
    pub tag: String,
    /// Attributes in source order. Names are lowercased; the first
    /// occurrence of a repeated name wins.
    pub attributes: Vec<(String, String)>,
    /// Inner text with nested tags removed, entities decoded, and
    /// surrounding whitespace trimmed.
    pub text: String,
}

/// Find the first recognized element in `line`.
///
/// A missing closing tag is tolerated (the text runs to the end of the
/// line). An opening tag that never terminates, or an attribute value
/// with an unbalanced quote, is not an element.
pub fn extract(line: &str) -> Option<Markup> {
    let mut search_from = 0_usize;
    while let Some(offset) = line.get(search_from..).and_then(|s| s.find('<')) {
        let after_lt = search_from.checked_add(offset)?.checked_add(1)?;
        if let Some(markup) = line.get(after_lt..).and_then(parse_element) {
            return Some(markup);
        }
        search_from = after_lt;
    }
    None
}

/// Coerce an attribute value to a JSON number when it starts with one,
/// otherwise keep the raw string.
///
/// Like a lenient float parse, leading whitespace is skipped and the
/// longest numeric prefix is used, so `"12px"` becomes `12` and `"3.5em"`
/// becomes `3.5`. Integers stay integers, decimals become floats.
/// Values without a numeric prefix (`red`, `NaN`, `Infinity`) stay strings.
pub fn coerce_attribute(raw: &str) -> Value {
    let Some(number) = numeric_prefix(raw.trim_start()) else {
        return Value::String(raw.to_owned());
    };
    if let Ok(int) = number.parse::<i64>() {
        return Value::from(int);
    }
    number
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(raw.to_owned()), Value::Number)
}

/// Longest leading decimal literal of `text`: an optional sign, digits
/// with at most one point, then an exponent if one with digits follows.
fn numeric_prefix(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let digits_at = |start: usize| {
        bytes
            .get(start..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_at(end);
    end = end.saturating_add(int_digits);

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_at(end.saturating_add(1));
        if int_digits > 0 || frac_digits > 0 {
            end = end.saturating_add(1).saturating_add(frac_digits);
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let signed = matches!(bytes.get(end.saturating_add(1)), Some(b'+' | b'-'));
        let exp_start = end.saturating_add(1).saturating_add(usize::from(signed));
        let exp_digits = digits_at(exp_start);
        if exp_digits > 0 {
            end = exp_start.saturating_add(exp_digits);
        }
    }
    text.get(..end)
}

/// Parse an element starting right after its `<`.
fn parse_element(rest: &str) -> Option<Markup> {
    let name_len = rest
        .find(|c: char| !is_name_char(c))
        .unwrap_or(rest.len());
    let tag = rest.get(..name_len)?.to_ascii_lowercase();
    if !RECOGNIZED_TAGS.contains(&tag.as_str()) {
        return None;
    }

    // The name must end at whitespace or the end of the tag, so that
    // `<logger>` is not mistaken for `<log>`.
    let after_name = rest.get(name_len..)?;
    match after_name.chars().next() {
        Some(c) if c.is_whitespace() || c == '>' || c == '/' => {}
        _ => return None,
    }

    let (attributes, after_tag, self_closing) = parse_attributes(after_name)?;
    let text = if self_closing {
        String::new()
    } else {
        inner_text(after_tag, &tag)
    };

    Some(Markup {
        tag,
        attributes,
        text,
    })
}

/// Parse attributes up to the end of the opening tag.
///
/// Returns the attributes, the input after the tag, and whether the tag
/// was self-closing.
fn parse_attributes(input: &str) -> Option<(Vec<(String, String)>, &str, bool)> {
    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("/>") {
            return Some((attributes, after, true));
        }
        if let Some(after) = rest.strip_prefix('>') {
            return Some((attributes, after, false));
        }
        if rest.is_empty() {
            return None;
        }

        let name_end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(rest.len());
        if name_end == 0 {
            // Stray `/` or `=`; both are one byte.
            rest = rest.get(1..)?;
            continue;
        }

        let name = rest.get(..name_end)?.to_ascii_lowercase();
        rest = rest.get(name_end..)?.trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let (raw, remaining) = attribute_value(after_eq.trim_start())?;
            rest = remaining;
            decode_entities(raw)
        } else {
            String::new()
        };

        if !attributes.iter().any(|(existing, _)| *existing == name) {
            attributes.push((name, value));
        }
    }
}

/// Split a quoted or unquoted attribute value from the rest of the tag.
fn attribute_value(input: &str) -> Option<(&str, &str)> {
    match input.chars().next()? {
        quote @ ('"' | '\'') => {
            let body = input.get(1..)?;
            let end = body.find(quote)?;
            Some((body.get(..end)?, body.get(end.checked_add(1)?..)?))
        }
        _ => {
            let end = input
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(input.len());
            Some((input.get(..end)?, input.get(end..)?))
        }
    }
}

/// Text between the opening tag and the first matching closing tag.
fn inner_text(after_tag: &str, tag: &str) -> String {
    let closing = format!("</{tag}");
    // ASCII lowercasing keeps byte offsets aligned with `after_tag`.
    let lowered = after_tag.to_ascii_lowercase();
    let inner = lowered
        .find(&closing)
        .and_then(|end| after_tag.get(..end))
        .unwrap_or(after_tag);
    decode_entities(&strip_tags(inner)).trim().to_owned()
}

/// Remove anything that looks like a tag.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(rest.get(..open).unwrap_or_default());
        let tail = rest.get(open..).unwrap_or_default();
        match tail.find('>') {
            Some(close) => rest = tail.get(close.saturating_add(1)..).unwrap_or_default(),
            None => {
                out.push_str(tail);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the handful of entities game scripts actually emit.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Characters allowed in a tag or attribute name.
const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')
}
