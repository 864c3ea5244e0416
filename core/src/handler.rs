//! The transport boundary.
//!
//! `Client` never touches the network itself. A `Handler` receives the built
//! request together with the resolved options and performs the exchange.
//! It is expected to honor `timeout`, `connect_timeout`, `ssl_verify`,
//! `allow_redirects`, `debug` and `proxy`, or to ignore them knowingly.

use crate::error::HttpError;
use crate::http::{HttpRequest, HttpResponse};
use crate::options::RequestOptions;

pub trait Handler: Send + Sync {
    fn fire(
        &self,
        request: &HttpRequest,
        options: &RequestOptions,
    ) -> Result<HttpResponse, HttpError>;
}

/// Closures work as handlers, which keeps stubs in tests short.
impl<F> Handler for F
where
    F: Fn(&HttpRequest, &RequestOptions) -> Result<HttpResponse, HttpError> + Send + Sync,
{
    fn fire(
        &self,
        request: &HttpRequest,
        options: &RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        self(request, options)
    }
}
