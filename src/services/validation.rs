use crate::constants::limits::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::errors::GatewayError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_object(&self, value: &Value, label: &str) -> Result<Map<String, Value>, GatewayError> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| GatewayError::invalid_params(format!("{} must be an object", label)))
    }

    /// Header maps from tool arguments: blank keys and nulls dropped, scalars stringified.
    pub fn ensure_headers(&self, value: Option<&Value>) -> Result<Map<String, Value>, GatewayError> {
        let Some(value) = value else {
            return Ok(Default::default());
        };
        if value.is_null() {
            return Ok(Default::default());
        }
        let obj = value
            .as_object()
            .ok_or_else(|| GatewayError::invalid_params("Headers must be an object"))?;
        let mut out = Map::new();
        for (key, val) in obj.iter() {
            if key.trim().is_empty() || val.is_null() {
                continue;
            }
            let rendered = val
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| val.to_string());
            out.insert(key.trim().to_string(), Value::String(rendered));
        }
        Ok(out)
    }

    pub fn is_email(&self, value: &str) -> bool {
        EMAIL_RE.is_match(value)
    }

    /// Parses an absolute http(s) URL; any other scheme is rejected.
    pub fn ensure_http_url(&self, raw: &str, label: &str) -> Result<url::Url, GatewayError> {
        let parsed = url::Url::parse(raw.trim()).map_err(|_| {
            GatewayError::invalid_params(format!("Invalid {} format", label))
                .with_hint("Please provide a valid HTTP or HTTPS URL")
                .with_details(serde_json::json!({ "url": raw }))
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            _ => Err(GatewayError::invalid_params(format!("Invalid {} format", label))
                .with_hint("Please provide a valid HTTP or HTTPS URL")
                .with_details(serde_json::json!({ "url": raw }))),
        }
    }

    /// `limit`/`offset` query values: absent → defaults, limit capped, negatives rejected.
    pub fn ensure_page(
        &self,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> Result<(i64, i64), GatewayError> {
        let limit = match limit.map(str::trim).filter(|v| !v.is_empty()) {
            None => DEFAULT_PAGE_LIMIT,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    GatewayError::invalid_params("limit must be a positive integer")
                })?
                .min(MAX_PAGE_LIMIT),
        };
        let offset = match offset.map(str::trim).filter(|v| !v.is_empty()) {
            None => 0,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| {
                    GatewayError::invalid_params("offset must be a non-negative integer")
                })?,
        };
        Ok((limit, offset))
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern() {
        let v = Validation::new();
        assert!(v.is_email("test@example.com"));
        assert!(!v.is_email("invalid-email"));
        assert!(!v.is_email("a b@example.com"));
        assert!(!v.is_email("user@localhost"));
    }

    #[test]
    fn page_defaults_and_caps() {
        let v = Validation::new();
        assert_eq!(v.ensure_page(None, None).unwrap(), (100, 0));
        assert_eq!(v.ensure_page(Some("5000"), Some("10")).unwrap(), (1000, 10));
        assert!(v.ensure_page(Some("abc"), None).is_err());
        assert!(v.ensure_page(Some("10"), Some("-1")).is_err());
    }

    #[test]
    fn http_url_rejects_other_schemes() {
        let v = Validation::new();
        assert!(v.ensure_http_url("https://api.example.com/openapi.json", "URL").is_ok());
        let err = v.ensure_http_url("ftp://example.com/spec", "URL").unwrap_err();
        assert_eq!(err.message, "Invalid URL format");
        assert!(v.ensure_http_url("not a url", "URL").is_err());
    }

    #[test]
    fn headers_are_stringified() {
        let v = Validation::new();
        let out = v
            .ensure_headers(Some(&serde_json::json!({"X-Count": 3, " ": "skip", "X-Null": null})))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out["X-Count"], "3");
    }
}
