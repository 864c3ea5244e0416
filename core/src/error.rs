//! Error types for the courier client.
//!
//! # Design
//! Option problems and status problems share one enum so callers match a
//! single type. `Config` and `TypeValidation` come out of option merging,
//! before any I/O happens. The three status variants are produced only after
//! a completed exchange and keep both halves of it, boxed so the happy path
//! `Result` stays small.

use std::fmt;

use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A completed exchange whose status was classified as a failure.
#[derive(Debug, Clone)]
pub struct BadResponse {
    pub request: HttpRequest,
    pub response: HttpResponse,
}

impl fmt::Display for BadResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} returned {}",
            self.request.method, self.request.uri, self.response.status
        )
    }
}

/// Errors returned by `Client` and the option merger.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A proxy URL could not be parsed or is missing a host or port.
    #[error("{0}")]
    Config(String),

    /// An option has the wrong shape, e.g. a proxy map with an unknown type.
    #[error("{0}")]
    TypeValidation(String),

    /// The server answered with a 4xx status.
    #[error("client error: {0}")]
    Client(Box<BadResponse>),

    /// The server answered with a 5xx status.
    #[error("server error: {0}")]
    Server(Box<BadResponse>),

    /// The server answered with a status of 600 or above.
    #[error("unexpected response: {0}")]
    Response(Box<BadResponse>),

    /// JSON options could not be encoded, or a JSON config could not be read.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The handler failed before a response was received.
    #[error("transport failed: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl HttpError {
    pub fn transport(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        HttpError::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    fn bad_response(&self) -> Option<&BadResponse> {
        match self {
            HttpError::Client(bad) | HttpError::Server(bad) | HttpError::Response(bad) => {
                Some(bad)
            }
            _ => None,
        }
    }

    /// Status code of the response, for the status-derived variants.
    pub fn status(&self) -> Option<u16> {
        self.bad_response().map(|bad| bad.response.status)
    }

    pub fn request(&self) -> Option<&HttpRequest> {
        self.bad_response().map(|bad| &bad.request)
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.bad_response().map(|bad| &bad.response)
    }

    /// Take ownership of the response carried by a status error.
    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            HttpError::Client(bad) | HttpError::Server(bad) | HttpError::Response(bad) => {
                Some(bad.response)
            }
            _ => None,
        }
    }
}

/// Map a completed exchange to `Ok` or the status-range error.
///
/// Anything below 400 is a success; 3xx responses the handler chose not to
/// follow are returned as-is.
pub fn classify(request: HttpRequest, response: HttpResponse) -> Result<HttpResponse, HttpError> {
    let status = response.status;
    if status < 400 {
        return Ok(response);
    }
    let bad = Box::new(BadResponse { request, response });
    Err(match status {
        400..=499 => HttpError::Client(bad),
        500..=599 => HttpError::Server(bad),
        _ => HttpError::Response(bad),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            uri: "http://localhost/items".to_string(),
            headers: Default::default(),
            body: None,
        }
    }

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn success_range_passes_through() {
        for status in [200, 204, 302, 399] {
            let resp = classify(request(), response(status)).unwrap();
            assert_eq!(resp.status, status);
        }
    }

    #[test]
    fn four_hundreds_are_client_errors() {
        let err = classify(request(), response(404)).unwrap_err();
        assert!(matches!(err, HttpError::Client(_)));
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.request().unwrap().uri, "http://localhost/items");
    }

    #[test]
    fn five_hundreds_are_server_errors() {
        let err = classify(request(), response(503)).unwrap_err();
        assert!(matches!(err, HttpError::Server(_)));
        assert_eq!(err.to_string(), "server error: GET http://localhost/items returned 503");
    }

    #[test]
    fn six_hundred_and_up_is_a_response_error() {
        for status in [600, 799] {
            let err = classify(request(), response(status)).unwrap_err();
            assert!(matches!(err, HttpError::Response(_)));
        }
    }

    #[test]
    fn config_errors_display_their_message() {
        let err = HttpError::Config("cannot parse proxy".to_string());
        assert_eq!(err.to_string(), "cannot parse proxy");
        assert!(err.status().is_none());
        assert!(err.into_response().is_none());
    }
}
