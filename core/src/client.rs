//! Blocking HTTP client facade.
//!
//! # Design
//! `Client` holds a baseline `Options` and a shared `Handler`, and nothing
//! else. Each call runs the same linear pipeline: merge the call options
//! over the baseline, build the request, sleep for `delay`, fire through the
//! handler, then classify the status. There are no retries and no redirect
//! logic here; `allow_redirects` is the handler's business.
//!
//! The baseline is fixed at construction. `set_handler` takes `&mut self`,
//! so a handler cannot be swapped while calls borrow the same client.

use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::error::{classify, HttpError};
use crate::handler::Handler;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::merge::merge_options;
use crate::options::{Options, RequestOptions};
use crate::transport::UreqHandler;

#[derive(Clone)]
pub struct Client {
    options: Options,
    handler: Arc<dyn Handler>,
}

impl Client {
    /// Client with the stock defaults.
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            options: Options::defaults(),
            handler,
        }
    }

    /// Client whose baseline is `options` deep-merged over the defaults.
    pub fn with_options(options: Options, handler: Arc<dyn Handler>) -> Self {
        Self {
            options: Options::defaults().deep_merge(&options),
            handler,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }

    pub fn set_handler(&mut self, handler: Arc<dyn Handler>) {
        self.handler = handler;
    }

    /// Send a request and classify the response status.
    ///
    /// Statuses below 400 return `Ok`. 4xx, 5xx and 600+ map to
    /// `HttpError::Client`, `Server` and `Response` unless the merged
    /// options turn `http_errors` off.
    pub fn request(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &Options,
    ) -> Result<HttpResponse, HttpError> {
        let resolved = merge_options(&self.options, options).map_err(|err| {
            debug!(%method, uri, error = %err, "rejected request options");
            err
        })?;
        let request = HttpRequest::new(method, uri, &resolved);
        let response = self.fire(&request, &resolved)?;
        debug!(%method, uri, status = response.status, "request completed");

        if !resolved.http_errors {
            return Ok(response);
        }
        classify(request, response)
    }

    pub fn get(&self, uri: &str, options: &Options) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Get, uri, options)
    }

    pub fn post(&self, uri: &str, options: &Options) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Post, uri, options)
    }

    pub fn put(&self, uri: &str, options: &Options) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Put, uri, options)
    }

    pub fn patch(&self, uri: &str, options: &Options) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Patch, uri, options)
    }

    pub fn delete(&self, uri: &str, options: &Options) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Delete, uri, options)
    }

    pub fn head(&self, uri: &str, options: &Options) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Head, uri, options)
    }

    /// Hand a built request to the handler, sleeping for `delay` first.
    ///
    /// The sleep blocks the calling thread.
    pub fn fire(
        &self,
        request: &HttpRequest,
        options: &RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        if !options.delay.is_zero() {
            debug!(delay_us = options.delay.as_micros() as u64, "delaying request");
            thread::sleep(options.delay);
        }
        self.handler.fire(request, options)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Arc::new(UreqHandler::new()))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
