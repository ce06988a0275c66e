//! Strict query-parameter parsing (spec §6).
//!
//! Deliberately the opposite of a lenient `unwrap_or_default().clamp(...)`
//! style: an unparseable or out-of-range parameter is a `400` naming the
//! offending field, never silently coerced to a default.

use crate::error::ApiError;
use forgetful_core::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use forgetful_core::error::Error;
use forgetful_core::storage::pagination::Page;
use std::collections::HashMap;

type Params = HashMap<String, String>;

fn get<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str)
}

/// Parse an optional `usize` query parameter.
///
/// # Errors
///
/// Returns [`ApiError`] (400) if present but not a valid non-negative integer.
pub fn parse_usize(params: &Params, key: &str) -> Result<Option<usize>, ApiError> {
    match get(params, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ApiError(Error::validation(key, format!("'{raw}' is not a non-negative integer")))),
    }
}

/// Parse an optional `u8` query parameter.
///
/// # Errors
///
/// Returns [`ApiError`] (400) if present but not a valid `u8`.
pub fn parse_u8(params: &Params, key: &str) -> Result<Option<u8>, ApiError> {
    match get(params, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u8>()
            .map(Some)
            .map_err(|_| ApiError(Error::validation(key, format!("'{raw}' is not an integer in 0..=255")))),
    }
}

/// Parse an optional boolean query parameter (`"true"`/`"false"`).
///
/// # Errors
///
/// Returns [`ApiError`] (400) if present but not exactly `"true"` or `"false"`.
pub fn parse_bool(params: &Params, key: &str, default: bool) -> Result<bool, ApiError> {
    match get(params, key) {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(raw) => Err(ApiError(Error::validation(
            key,
            format!("'{raw}' is not 'true' or 'false'"),
        ))),
    }
}

/// Parse `limit`/`offset` into a [`Page`], rejecting (rather than
/// clamping) an out-of-range `limit` or a negative/unparseable `offset`.
///
/// # Errors
///
/// Returns [`ApiError`] (400) for a malformed `offset`, a `limit` of `0`,
/// or a `limit` exceeding [`MAX_PAGE_LIMIT`].
pub fn parse_pagination(params: &Params) -> Result<Page, ApiError> {
    let offset = parse_usize(params, "offset")?.unwrap_or(0);
    let limit = parse_usize(params, "limit")?.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit == 0 {
        return Err(ApiError(Error::validation("limit", "must be at least 1")));
    }
    if limit > MAX_PAGE_LIMIT {
        return Err(ApiError(Error::validation(
            "limit",
            format!("must not exceed {MAX_PAGE_LIMIT}"),
        )));
    }
    Ok(Page { offset, limit })
}

/// Parse a comma-separated list query parameter (e.g. `tags=a,b,c`).
/// Absent or empty yields `None`.
#[must_use]
pub fn parse_csv(params: &Params, key: &str) -> Option<Vec<String>> {
    get(params, key).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

/// Parse a query parameter against a fixed set of allowed values.
///
/// # Errors
///
/// Returns [`ApiError`] (400) if the parameter is present but not one of
/// `allowed`.
pub fn parse_enum<'a>(
    params: &'a Params,
    key: &str,
    allowed: &[&str],
    default: &'a str,
) -> Result<&'a str, ApiError> {
    match get(params, key) {
        None => Ok(default),
        Some(raw) if allowed.contains(&raw) => Ok(allowed.iter().find(|a| **a == raw).copied().unwrap_or(default)),
        Some(raw) => Err(ApiError(Error::validation(
            key,
            format!("'{raw}' is not one of {allowed:?}"),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn pagination_defaults_when_absent() {
        let page = parse_pagination(&params(&[])).unwrap();
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn pagination_rejects_zero_limit() {
        assert!(parse_pagination(&params(&[("limit", "0")])).is_err());
    }

    #[test]
    fn pagination_rejects_limit_over_max() {
        assert!(parse_pagination(&params(&[("limit", "1000")])).is_err());
    }

    #[test]
    fn pagination_rejects_negative_offset() {
        assert!(parse_pagination(&params(&[("offset", "-1")])).is_err());
    }

    #[test]
    fn parse_enum_rejects_unknown_value() {
        assert!(parse_enum(&params(&[("sort_order", "sideways")]), "sort_order", &["asc", "desc"], "desc").is_err());
    }

    #[test]
    fn parse_enum_accepts_known_value() {
        let v = parse_enum(&params(&[("sort_order", "asc")]), "sort_order", &["asc", "desc"], "desc").unwrap();
        assert_eq!(v, "asc");
    }

    #[test]
    fn csv_splits_and_trims() {
        assert_eq!(
            parse_csv(&params(&[("tags", "a, b ,c")]), "tags"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }
}
