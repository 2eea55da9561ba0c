//! Loose conversions for untyped document values.
//!
//! Stored proposals come from a browser-era editor, so numbers, strings and
//! flags follow JavaScript's conversion rules: `null` reads as `0`, numeric
//! strings are accepted with surrounding whitespace, any non-empty string is
//! "true", and so on. Everything here is total; nothing panics on odd input.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n").expect("line break pattern is valid"));

/// Looks up `key` on a JSON object. Any other value has no fields.
pub fn field<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.as_object().and_then(|map| map.get(key))
}

/// Text form of a value, as `String(value)` would produce it.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => number_text(f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// `to_text` for a field that may be absent; absent and `null` give `default`.
pub fn text_or(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(v) => to_text(v),
    }
}

/// Shortest display form of a number: `10`, `8.875`, `-0.5`, switching to
/// exponent form (`1e+21`, `1e-7`) outside `[1e-6, 1e21)`.
pub fn number_text(n: f64) -> String {
    if n == 0.0 {
        // drops the sign of -0
        return "0".to_string();
    }
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{n}");
    }
    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

/// Numeric value of a field. Absent fields and unparseable input give NaN.
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(array @ Value::Array(_)) => parse_number(&to_text(array)),
        Some(Value::Object(_)) => f64::NAN,
    }
}

/// `to_number`, replaced by `default` unless finite.
pub fn finite_or(value: Option<&Value>, default: f64) -> f64 {
    let n = to_number(value);
    if n.is_finite() { n } else { default }
}

fn parse_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Identifier carried by a raw entity, if it has a usable one.
///
/// Non-empty strings and non-zero numbers count. Objects and arrays are
/// rejected rather than stringified so two of them cannot collide.
pub fn existing_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        n @ Value::Number(_) if truthy(n) => Some(to_text(n)),
        _ => None,
    }
}

/// A list of lines: either a JSON array (non-strings dropped) or one string
/// split on line breaks, trimmed, blank lines dropped.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(text)) => split_lines(text),
        _ => Vec::new(),
    }
}

pub fn split_lines(text: &str) -> Vec<String> {
    LINE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_matches_string_conversion() {
        assert_eq!(to_text(&json!("abc")), "abc");
        assert_eq!(to_text(&json!(12)), "12");
        assert_eq!(to_text(&json!(2.5)), "2.5");
        assert_eq!(to_text(&json!(4.0)), "4");
        assert_eq!(to_text(&json!(true)), "true");
        assert_eq!(to_text(&json!([1, null, "x"])), "1,,x");
        assert_eq!(to_text(&json!({ "a": 1 })), "[object Object]");
    }

    #[test]
    fn large_and_tiny_numbers_use_exponent_form() {
        assert_eq!(number_text(1e21), "1e+21");
        assert_eq!(number_text(-1.5e22), "-1.5e+22");
        assert_eq!(number_text(1e-7), "1e-7");
        assert_eq!(number_text(2.5e-9), "2.5e-9");
        assert_eq!(number_text(1e20), "100000000000000000000");
        assert_eq!(number_text(0.000001), "0.000001");
        assert_eq!(number_text(-0.0), "0");
        assert_eq!(number_text(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(to_text(&json!(1e-7)), "1e-7");
    }

    #[test]
    fn text_or_uses_default_for_missing_and_null() {
        assert_eq!(text_or(None, "LS"), "LS");
        assert_eq!(text_or(Some(&Value::Null), "LS"), "LS");
        assert_eq!(text_or(Some(&json!("")), "LS"), "");
        assert_eq!(text_or(Some(&json!("SF")), "LS"), "SF");
    }

    #[test]
    fn numbers_follow_loose_conversion() {
        assert!(to_number(None).is_nan());
        assert_eq!(to_number(Some(&Value::Null)), 0.0);
        assert_eq!(to_number(Some(&json!(true))), 1.0);
        assert_eq!(to_number(Some(&json!("  12.5 "))), 12.5);
        assert_eq!(to_number(Some(&json!(""))), 0.0);
        assert_eq!(to_number(Some(&json!("1e3"))), 1000.0);
        assert_eq!(to_number(Some(&json!("0x1F"))), 31.0);
        assert_eq!(to_number(Some(&json!([]))), 0.0);
        assert_eq!(to_number(Some(&json!([7]))), 7.0);
        assert!(to_number(Some(&json!([1, 2]))).is_nan());
        assert!(to_number(Some(&json!("12abc"))).is_nan());
        assert!(to_number(Some(&json!("inf"))).is_nan());
        assert!(to_number(Some(&json!({}))).is_nan());
        assert_eq!(to_number(Some(&json!("-Infinity"))), f64::NEG_INFINITY);
    }

    #[test]
    fn finite_or_replaces_non_finite() {
        assert_eq!(finite_or(None, 1.0), 1.0);
        assert_eq!(finite_or(Some(&json!("Infinity")), 1.0), 1.0);
        assert_eq!(finite_or(Some(&json!("abc")), 0.0), 0.0);
        assert_eq!(finite_or(Some(&json!("4")), 1.0), 4.0);
    }

    #[test]
    fn truthiness() {
        assert!(!truthy(&Value::Null));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!("false")));
        assert!(truthy(&json!([])));
        assert!(truthy(&json!(-1)));
    }

    #[test]
    fn ids_keep_strings_and_numbers_only() {
        assert_eq!(existing_id(Some(&json!("p1"))), Some("p1".to_string()));
        assert_eq!(existing_id(Some(&json!(42))), Some("42".to_string()));
        assert_eq!(existing_id(Some(&json!(0))), None);
        assert_eq!(existing_id(Some(&json!(""))), None);
        assert_eq!(existing_id(Some(&json!({ "x": 1 }))), None);
        assert_eq!(existing_id(None), None);
    }

    #[test]
    fn string_lists_accept_arrays_or_text() {
        assert_eq!(
            string_list(Some(&json!(["a", 1, " b ", null]))),
            vec!["a".to_string(), " b ".to_string()]
        );
        assert_eq!(
            string_list(Some(&json!("Shop drawings\r\n\n  Field measure  \n"))),
            vec!["Shop drawings".to_string(), "Field measure".to_string()]
        );
        assert!(string_list(Some(&json!(5))).is_empty());
        assert!(string_list(None).is_empty());
    }
}
