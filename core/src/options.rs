//! Request options: the caller-facing `Options` set and the resolved
//! `RequestOptions` a handler receives.
//!
//! # Design
//! Every key of `Options` is optional so a per-call set only names what it
//! overrides. The baseline comes from `Options::defaults()`, an explicit
//! value rather than shared global state; `Client` deep-merges constructor
//! options into its own copy once and never mutates it afterward.
//!
//! `Options` derives serde so an option set can be loaded from a JSON
//! config file with `Options::from_json`.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HttpError;
use crate::http::{Body, MultipartPart};
use crate::proxy::{Proxy, ProxyOption};

pub const DEFAULT_CONNECT_TIMEOUT: f64 = 10.0;
pub const DEFAULT_TIMEOUT: f64 = 30.0;
pub const USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// Credentials for the `authorization` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Auth {
    /// Encoded as `Basic base64(username:password)`.
    Basic { username: String, password: String },
    /// Used verbatim as the header value.
    Header(String),
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            Auth::Basic { .. } => true,
            Auth::Header(value) => !value.is_empty(),
        }
    }

    pub fn header_value(&self) -> String {
        match self {
            Auth::Basic { username, password } => {
                let credentials = format!("{username}:{password}");
                format!(
                    "Basic {}",
                    base64::engine::general_purpose::STANDARD.encode(credentials)
                )
            }
            Auth::Header(value) => value.clone(),
        }
    }
}

/// Per-call or per-client option set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_redirects: Option<bool>,
    /// Seconds; `0` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    /// Microseconds to sleep before the handler fires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_errors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_verify: Option<bool>,
    /// Seconds; `0` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_params: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multipart: Option<Vec<MultipartPart>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyOption>,
}

impl Options {
    /// Baseline every `Client` starts from.
    pub fn defaults() -> Self {
        Self {
            allow_redirects: Some(true),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            debug: Some(false),
            delay: Some(0),
            http_errors: Some(true),
            ssl_verify: Some(true),
            timeout: Some(DEFAULT_TIMEOUT),
            headers: Some(BTreeMap::from([(
                "user-agent".to_string(),
                USER_AGENT.to_string(),
            )])),
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, HttpError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Recursive merge used once at client construction.
    ///
    /// Scalars from `overlay` replace; `headers` and `form_params` merge
    /// key by key; `json` objects merge recursively.
    pub fn deep_merge(&self, overlay: &Options) -> Options {
        Options {
            allow_redirects: overlay.allow_redirects.or(self.allow_redirects),
            connect_timeout: overlay.connect_timeout.or(self.connect_timeout),
            debug: overlay.debug.or(self.debug),
            delay: overlay.delay.or(self.delay),
            http_errors: overlay.http_errors.or(self.http_errors),
            ssl_verify: overlay.ssl_verify.or(self.ssl_verify),
            timeout: overlay.timeout.or(self.timeout),
            auth: overlay.auth.clone().or_else(|| self.auth.clone()),
            json: match (&self.json, &overlay.json) {
                (Some(base), Some(over)) => Some(merge_json(base, over)),
                (base, over) => over.clone().or_else(|| base.clone()),
            },
            form_params: merge_maps(&self.form_params, &overlay.form_params),
            multipart: overlay.multipart.clone().or_else(|| self.multipart.clone()),
            body: overlay.body.clone().or_else(|| self.body.clone()),
            headers: merge_header_maps(&self.headers, &overlay.headers),
            proxy: overlay.proxy.clone().or_else(|| self.proxy.clone()),
        }
    }

    /// Shallow merge used on every call: any key set in `call` replaces the
    /// corresponding key here entirely.
    pub fn overlay(&self, call: &Options) -> Options {
        let call = call.clone();
        let base = self.clone();
        Options {
            allow_redirects: call.allow_redirects.or(base.allow_redirects),
            connect_timeout: call.connect_timeout.or(base.connect_timeout),
            debug: call.debug.or(base.debug),
            delay: call.delay.or(base.delay),
            http_errors: call.http_errors.or(base.http_errors),
            ssl_verify: call.ssl_verify.or(base.ssl_verify),
            timeout: call.timeout.or(base.timeout),
            auth: call.auth.or(base.auth),
            json: call.json.or(base.json),
            form_params: call.form_params.or(base.form_params),
            multipart: call.multipart.or(base.multipart),
            body: call.body.or(base.body),
            headers: call.headers.or(base.headers),
            proxy: call.proxy.or(base.proxy),
        }
    }
}

fn merge_maps(
    base: &Option<BTreeMap<String, String>>,
    overlay: &Option<BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    match (base, overlay) {
        (Some(base), Some(overlay)) => {
            let mut merged = base.clone();
            merged.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(merged)
        }
        (base, overlay) => overlay.clone().or_else(|| base.clone()),
    }
}

// Header names differ only by case across sources, so compare lowercased.
fn merge_header_maps(
    base: &Option<BTreeMap<String, String>>,
    overlay: &Option<BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    merge_maps(
        &base.as_ref().map(lowercase_names),
        &overlay.as_ref().map(lowercase_names),
    )
}

pub(crate) fn lowercase_names(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
        .collect()
}

fn merge_json(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                let next = match merged.get(key) {
                    Some(existing) => merge_json(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Options after merging and validation, as seen by a `Handler`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub allow_redirects: bool,
    pub connect_timeout: Option<Duration>,
    pub debug: bool,
    pub delay: Duration,
    pub http_errors: bool,
    pub ssl_verify: bool,
    pub timeout: Option<Duration>,
    /// Lowercased names.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Body>,
    pub proxy: Option<Proxy>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            allow_redirects: true,
            connect_timeout: Some(Duration::from_secs_f64(DEFAULT_CONNECT_TIMEOUT)),
            debug: false,
            delay: Duration::ZERO,
            http_errors: true,
            ssl_verify: true,
            timeout: Some(Duration::from_secs_f64(DEFAULT_TIMEOUT)),
            headers: BTreeMap::from([("user-agent".to_string(), USER_AGENT.to_string())]),
            body: None,
            proxy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn basic_auth_is_base64_encoded() {
        assert_eq!(Auth::basic("u", "p").header_value(), "Basic dTpw");
        assert_eq!(
            Auth::basic("Aladdin", "open sesame").header_value(),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn auth_deserializes_from_either_shape() {
        let basic: Auth = serde_json::from_value(json!({"username": "u", "password": "p"})).unwrap();
        assert_eq!(basic, Auth::basic("u", "p"));
        let header: Auth = serde_json::from_value(json!("Bearer abc")).unwrap();
        assert_eq!(header, Auth::Header("Bearer abc".to_string()));
    }

    #[test]
    fn from_json_reads_a_config() {
        let options = Options::from_json(
            r#"{"timeout": 2.5, "delay": 100, "headers": {"X-Team": "core"}, "proxy": "socks5://h:1080"}"#,
        )
        .unwrap();
        assert_eq!(options.timeout, Some(2.5));
        assert_eq!(options.delay, Some(100));
        assert_eq!(options.proxy, Some(ProxyOption::Url("socks5://h:1080".to_string())));
    }

    #[test]
    fn from_json_rejects_unknown_keys_and_negative_delay() {
        assert!(matches!(
            Options::from_json(r#"{"verify": false}"#),
            Err(HttpError::Json(_))
        ));
        assert!(Options::from_json(r#"{"delay": -5}"#).is_err());
    }

    #[test]
    fn deep_merge_keeps_default_headers() {
        let constructor = Options::default().header("X-Api-Key", "secret");
        let merged = Options::defaults().deep_merge(&constructor);
        let headers = merged.headers.unwrap();
        assert_eq!(headers.get("x-api-key").map(String::as_str), Some("secret"));
        assert_eq!(headers.get("user-agent").map(String::as_str), Some(USER_AGENT));
        assert_eq!(merged.timeout, Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn deep_merge_recurses_into_json_objects() {
        let base = Options {
            json: Some(json!({"a": {"x": 1}, "b": 1})),
            ..Options::default()
        };
        let overlay = Options {
            json: Some(json!({"a": {"y": 2}})),
            ..Options::default()
        };
        let merged = base.deep_merge(&overlay);
        assert_eq!(merged.json, Some(json!({"a": {"x": 1, "y": 2}, "b": 1})));
    }

    #[test]
    fn overlay_replaces_headers_wholesale() {
        let call = Options::default().header("accept", "text/plain");
        let merged = Options::defaults().overlay(&call);
        let headers = merged.headers.unwrap();
        assert_eq!(headers.len(), 1);
        assert!(headers.get("user-agent").is_none());
        assert_eq!(merged.http_errors, Some(true));
    }

    #[test]
    fn overlay_leaves_both_inputs_untouched() {
        let defaults = Options::defaults();
        let call = Options {
            timeout: Some(1.0),
            ..Options::default()
        };
        let _ = defaults.overlay(&call);
        assert_eq!(defaults, Options::defaults());
        assert_eq!(call.timeout, Some(1.0));
    }
}
