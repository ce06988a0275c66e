//! Flexible input coercion for MCP tool arguments (spec §4.I).
//!
//! LLM tool callers are inconsistent about whether a list-valued parameter
//! is sent as a JSON array, a single scalar, or a delimited string. These
//! helpers accept all the common shapes instead of surfacing a validation
//! error for a reasonable variation.

use crate::error::{Error, Result};
use serde_json::Value;

/// Coerce a JSON value into `Option<Vec<i64>>`.
///
/// Accepts: `null` -> `None`; a JSON array of numbers/numeric strings; a
/// single number; a numeric string; a JSON-array-shaped string
/// (`"[3, 7]"`); a comma-separated string (`"3,7"`).
///
/// # Errors
///
/// Returns [`Error::Validation`] if `value` cannot be coerced.
pub fn coerce_to_int_list(value: Option<&Value>, param_name: &str) -> Result<Option<Vec<i64>>> {
    let Some(value) = value else { return Ok(None) };
    if value.is_null() {
        return Ok(None);
    }

    match value {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(value_to_i64(item, param_name)?);
            }
            Ok(Some(out))
        }
        Value::Number(_) => Ok(Some(vec![value_to_i64(value, param_name)?])),
        Value::String(s) => coerce_string_to_int_list(s, param_name),
        other => Err(Error::validation(
            param_name,
            format!("cannot coerce {other} to a list of integers"),
        )),
    }
}

fn value_to_i64(value: &Value, param_name: &str) -> Result<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| Error::validation(param_name, format!("'{value}' is not an integer")))
}

fn coerce_string_to_int_list(raw: &str, param_name: &str) -> Result<Option<Vec<i64>>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                out.push(value_to_i64(item, param_name)?);
            }
            return Ok(Some(out));
        }
    }

    if trimmed.contains(',') {
        let mut out = Vec::new();
        for part in trimmed.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            out.push(
                part.parse::<i64>()
                    .map_err(|_| Error::validation(param_name, format!("invalid integer '{part}'")))?,
            );
        }
        return Ok(Some(out));
    }

    let parsed: i64 = trimmed
        .parse()
        .map_err(|_| Error::validation(param_name, format!("invalid integer string '{trimmed}'")))?;
    Ok(Some(vec![parsed]))
}

/// Coerce a JSON value into `Option<Vec<String>>`, with the same accepted
/// shapes as [`coerce_to_int_list`] for strings instead of integers.
/// Empty entries are dropped. When `required` is true, `None` or an
/// all-empty result is an error.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the value cannot be coerced, or if
/// `required` is true and the coerced result is empty.
pub fn coerce_to_str_list(
    value: Option<&Value>,
    required: bool,
    param_name: &str,
) -> Result<Option<Vec<String>>> {
    let value = match value {
        Some(v) if !v.is_null() => v,
        _ => {
            return if required {
                Err(Error::validation(param_name, "is required"))
            } else {
                Ok(None)
            }
        }
    };

    let result = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_trimmed_string)
            .collect::<Vec<_>>(),
        Value::String(s) => coerce_string_to_str_list(s),
        other => {
            return Err(Error::validation(
                param_name,
                format!("cannot coerce {other} to a list of strings"),
            ))
        }
    };

    if required && result.is_empty() {
        return Err(Error::validation(param_name, "cannot be empty"));
    }
    if result.is_empty() && !required {
        return Ok(None);
    }
    Ok(Some(result))
}

fn value_to_trimmed_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn coerce_string_to_str_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
            return items.iter().filter_map(value_to_trimmed_string).collect();
        }
    }

    if trimmed.contains(',') {
        return trimmed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    vec![trimmed.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_int_list_is_none() {
        assert_eq!(coerce_to_int_list(Some(&Value::Null), "p").unwrap(), None);
        assert_eq!(coerce_to_int_list(None, "p").unwrap(), None);
    }

    #[test]
    fn single_int_becomes_singleton_list() {
        assert_eq!(coerce_to_int_list(Some(&json!(3)), "p").unwrap(), Some(vec![3]));
    }

    #[test]
    fn json_array_string_parses() {
        assert_eq!(
            coerce_to_int_list(Some(&json!("[3, 7]")), "p").unwrap(),
            Some(vec![3, 7])
        );
    }

    #[test]
    fn comma_separated_string_parses() {
        assert_eq!(coerce_to_int_list(Some(&json!("3,7")), "p").unwrap(), Some(vec![3, 7]));
    }

    #[test]
    fn single_numeric_string_parses() {
        assert_eq!(coerce_to_int_list(Some(&json!("3")), "p").unwrap(), Some(vec![3]));
    }

    #[test]
    fn invalid_string_is_error() {
        assert!(coerce_to_int_list(Some(&json!("abc")), "p").is_err());
    }

    #[test]
    fn single_str_becomes_singleton_list() {
        assert_eq!(
            coerce_to_str_list(Some(&json!("tag1")), false, "p").unwrap(),
            Some(vec!["tag1".to_string()])
        );
    }

    #[test]
    fn comma_separated_str_list_parses() {
        assert_eq!(
            coerce_to_str_list(Some(&json!("tag1,tag2")), false, "p").unwrap(),
            Some(vec!["tag1".to_string(), "tag2".to_string()])
        );
    }

    #[test]
    fn required_empty_str_list_is_error() {
        assert!(coerce_to_str_list(Some(&json!("")), true, "p").is_err());
        assert!(coerce_to_str_list(None, true, "p").is_err());
    }

    #[test]
    fn json_array_string_of_strings_parses() {
        assert_eq!(
            coerce_to_str_list(Some(&json!("[\"a\", \"b\"]")), false, "p").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }
}
