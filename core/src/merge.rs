//! Per-call option merging.
//!
//! `merge_options` overlays call options on a client's baseline, derives
//! the `authorization` and `content-type` headers and the request body, and
//! validates the proxy and timeouts. It is pure: neither input is modified.
//!
//! Body sources are checked in the order `json`, `form_params`,
//! `multipart`. Each truthy source sets `content-type`, so the last one
//! wins the header; each fills `body` only while it is still empty, so the
//! first one (or a pre-set `body`) wins the payload.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::error::HttpError;
use crate::http::Body;
use crate::options::{lowercase_names, Options, RequestOptions};
use crate::proxy::normalize_proxy;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data; charset=UTF-8";

/// Merge `call` over `defaults` and resolve the result.
pub fn merge_options(defaults: &Options, call: &Options) -> Result<RequestOptions, HttpError> {
    let merged = defaults.overlay(call);

    let mut headers = merged
        .headers
        .as_ref()
        .map(lowercase_names)
        .unwrap_or_default();

    if let Some(auth) = merged.auth.as_ref().filter(|auth| auth.is_truthy()) {
        headers
            .entry("authorization".to_string())
            .or_insert_with(|| auth.header_value());
    }

    let body = derive_body(&merged, &mut headers)?;
    let proxy = merged.proxy.as_ref().map(normalize_proxy).transpose()?;

    Ok(RequestOptions {
        allow_redirects: merged.allow_redirects.unwrap_or(true),
        connect_timeout: seconds(merged.connect_timeout)?,
        debug: merged.debug.unwrap_or(false),
        delay: Duration::from_micros(merged.delay.unwrap_or(0)),
        http_errors: merged.http_errors.unwrap_or(true),
        ssl_verify: merged.ssl_verify.unwrap_or(true),
        timeout: seconds(merged.timeout)?,
        headers,
        body,
        proxy,
    })
}

fn derive_body(
    merged: &Options,
    headers: &mut BTreeMap<String, String>,
) -> Result<Option<Body>, HttpError> {
    let mut body = merged.body.clone().map(Body::Text);

    if let Some(json) = merged.json.as_ref().filter(|json| is_truthy(json)) {
        headers.insert("content-type".to_string(), JSON_CONTENT_TYPE.to_string());
        if body.is_none() {
            // serde_json leaves non-ASCII characters unescaped.
            body = Some(Body::Text(serde_json::to_string(json)?));
        }
    }

    if let Some(form) = merged.form_params.as_ref().filter(|form| !form.is_empty()) {
        headers.insert("content-type".to_string(), FORM_CONTENT_TYPE.to_string());
        if body.is_none() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(form)
                .finish();
            body = Some(Body::Text(encoded));
        }
    }

    if let Some(parts) = merged.multipart.as_ref().filter(|parts| !parts.is_empty()) {
        headers.insert("content-type".to_string(), MULTIPART_CONTENT_TYPE.to_string());
        if body.is_none() {
            body = Some(Body::Multipart(parts.clone()));
        }
    }

    Ok(body)
}

/// Loose truthiness for the `json` option: null, false, zero and empty
/// values do not produce a body.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty() && text != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn seconds(value: Option<f64>) -> Result<Option<Duration>, HttpError> {
    match value {
        None => Ok(None),
        Some(secs) if secs == 0.0 => Ok(None),
        // Rejects negative, non-finite and out-of-range values alike.
        Some(secs) => Duration::try_from_secs_f64(secs).map(Some).map_err(|_| {
            HttpError::TypeValidation("timeout must be a non-negative number".to_string())
        }),
    }
}
