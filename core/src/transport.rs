//! Default `Handler` backed by ureq.
//!
//! # Design
//! An agent is configured per call from the resolved options, since every
//! call may carry its own timeouts, proxy and TLS setting. Status codes are
//! returned as data (`http_status_as_error(false)`); classification belongs
//! to `Client`.

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::HttpError;
use crate::handler::Handler;
use crate::http::{Body, HttpRequest, HttpResponse, MultipartPart};
use crate::options::RequestOptions;

#[derive(Debug, Clone, Copy, Default)]
pub struct UreqHandler;

impl UreqHandler {
    pub fn new() -> Self {
        Self
    }

    fn agent(&self, options: &RequestOptions) -> Result<ureq::Agent, HttpError> {
        let mut config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(options.timeout)
            .timeout_connect(options.connect_timeout);
        if !options.allow_redirects {
            config = config.max_redirects(0);
        }
        if !options.ssl_verify {
            config = config.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }
        if let Some(proxy) = &options.proxy {
            let proxy = ureq::Proxy::new(&proxy.url())
                .map_err(|source| HttpError::transport("proxy rejected by transport", source))?;
            config = config.proxy(Some(proxy));
        }
        Ok(config.build().new_agent())
    }
}

impl Handler for UreqHandler {
    fn fire(
        &self,
        request: &HttpRequest,
        options: &RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        let agent = self.agent(options)?;
        let (content_type, payload) = encode_body(request.body.as_ref());

        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.uri.as_str());
        for (name, value) in &request.headers {
            if content_type.is_some() && name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(content_type) = &content_type {
            builder = builder.header("content-type", content_type.as_str());
        }

        if options.debug {
            info!(method = %request.method, uri = %request.uri, "sending request");
        }

        let mut response = match payload {
            Some(bytes) => run(&agent, request, builder.body(bytes)),
            None => run(&agent, request, builder.body(())),
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|source| HttpError::transport("failed to read response body", source))?;

        if options.debug {
            info!(method = %request.method, uri = %request.uri, status, "received response");
        } else {
            debug!(status, "received response");
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn run<S: ureq::AsSendBody>(
    agent: &ureq::Agent,
    request: &HttpRequest,
    outgoing: Result<ureq::http::Request<S>, ureq::http::Error>,
) -> Result<ureq::http::Response<ureq::Body>, HttpError> {
    let outgoing =
        outgoing.map_err(|source| HttpError::transport("invalid request", source))?;
    agent.run(outgoing).map_err(|source| {
        HttpError::transport(format!("{} {}", request.method, request.uri), source)
    })
}

/// Returns the content-type override (multipart only) and the wire bytes.
fn encode_body(body: Option<&Body>) -> (Option<String>, Option<Vec<u8>>) {
    match body {
        None => (None, None),
        Some(Body::Text(text)) => (None, Some(text.as_bytes().to_vec())),
        Some(Body::Multipart(parts)) => {
            let boundary = format!("courier-{}", Uuid::new_v4().simple());
            let payload = encode_multipart(&boundary, parts);
            (
                Some(format!("multipart/form-data; boundary={boundary}")),
                Some(payload.into_bytes()),
            )
        }
    }
}

fn encode_multipart(boundary: &str, parts: &[MultipartPart]) -> String {
    let mut out = String::new();
    for part in parts {
        out.push_str(&format!("--{boundary}\r\n"));
        out.push_str(&format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quotes(&part.name)
        ));
        if let Some(filename) = &part.filename {
            out.push_str(&format!("; filename=\"{}\"", escape_quotes(filename)));
        }
        out.push_str("\r\n");
        if let Some(content_type) = &part.content_type {
            out.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        out.push_str("\r\n");
        out.push_str(&part.contents);
        out.push_str("\r\n");
    }
    out.push_str(&format!("--{boundary}--\r\n"));
    out
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "%22")
}
