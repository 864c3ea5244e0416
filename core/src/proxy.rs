//! Proxy option parsing and validation.
//!
//! A proxy can be given as a URL string (`socks5://host:1080`) or as a map
//! with `type`, `hostname` and `port`. Both normalize to `Proxy`. The check
//! runs on every merge; nothing is cached.

use std::borrow::Cow;
use std::fmt;

use ::http::Uri;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HttpError;

/// Raw `proxy` option as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProxyOption {
    Url(String),
    Fields(Map<String, Value>),
    Other(Value),
}

impl From<&str> for ProxyOption {
    fn from(url: &str) -> Self {
        ProxyOption::Url(url.to_string())
    }
}

impl From<Proxy> for ProxyOption {
    fn from(proxy: Proxy) -> Self {
        let mut fields = Map::new();
        fields.insert("type".into(), Value::from(proxy.kind.as_str()));
        fields.insert("hostname".into(), Value::from(proxy.hostname));
        fields.insert("port".into(), Value::from(proxy.port));
        ProxyOption::Fields(fields)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyType {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyType {
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "http" => Some(ProxyType::Http),
            "https" => Some(ProxyType::Https),
            "socks4" => Some(ProxyType::Socks4),
            "socks5" => Some(ProxyType::Socks5),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ProxyType::Http => "http",
            ProxyType::Https => "https",
            ProxyType::Socks4 => "socks4",
            ProxyType::Socks5 => "socks5",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized proxy descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    pub kind: ProxyType,
    pub hostname: String,
    pub port: u16,
}

impl Proxy {
    /// Render as `scheme://hostname:port`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.kind, self.hostname, self.port)
    }
}

fn config(message: &str) -> HttpError {
    HttpError::Config(message.to_string())
}

fn invalid(message: &str) -> HttpError {
    HttpError::TypeValidation(message.to_string())
}

/// Validate a raw proxy option and turn it into a `Proxy`.
pub fn normalize_proxy(option: &ProxyOption) -> Result<Proxy, HttpError> {
    match option {
        ProxyOption::Url(url) => parse_proxy_url(url),
        ProxyOption::Fields(fields) => proxy_from_fields(fields),
        ProxyOption::Other(_) => Err(invalid("proxy must be an array")),
    }
}

fn parse_proxy_url(raw: &str) -> Result<Proxy, HttpError> {
    let candidate = if raw.contains("://") {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(format!("http://{raw}"))
    };
    let uri: Uri = candidate
        .parse()
        .map_err(|_| config("cannot parse proxy"))?;

    let hostname = uri
        .host()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| config("host is not present in proxy url"))?;
    let port = explicit_port(&uri)?;
    let kind = ProxyType::parse(uri.scheme_str().unwrap_or("http"))
        .ok_or_else(|| invalid("proxy type is invalid"))?;

    Ok(Proxy {
        kind,
        hostname: hostname.to_string(),
        port,
    })
}

/// Uri keeps an explicit default port, so `http://host:80` still passes. A
/// port that is written but does not fit a u16 is unparseable, not absent.
fn explicit_port(uri: &Uri) -> Result<u16, HttpError> {
    if let Some(port) = uri.port_u16() {
        return Ok(port);
    }
    let written = uri
        .authority()
        .map(|authority| {
            let host_port = authority
                .as_str()
                .rsplit_once('@')
                .map_or(authority.as_str(), |(_, host_port)| host_port);
            host_port
                .rsplit_once(':')
                .map(|(_, port)| port)
                .filter(|port| !port.is_empty() && !port.contains(']'))
                .is_some()
        })
        .unwrap_or(false);
    if written {
        Err(config("cannot parse proxy"))
    } else {
        Err(config("port is not present in proxy url"))
    }
}

fn proxy_from_fields(fields: &Map<String, Value>) -> Result<Proxy, HttpError> {
    let kind = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(ProxyType::parse)
        .ok_or_else(|| invalid("proxy type is invalid"))?;
    let hostname = fields
        .get("hostname")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("proxy hostname is invalid"))?;
    let port = fields
        .get("port")
        .and_then(numeric_port)
        .ok_or_else(|| invalid("proxy port is invalid"))?;

    Ok(Proxy {
        kind,
        hostname: hostname.to_string(),
        port,
    })
}

/// Accept integers and integer-valued strings within the u16 range.
fn numeric_port(value: &Value) -> Option<u16> {
    let number = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        })?,
        Value::String(text) => text.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u16::try_from(number).ok()
}
