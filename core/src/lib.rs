//! Blocking HTTP client facade with pluggable transport.
//!
//! # Overview
//! `Client` merges per-call `Options` over its baseline, builds an
//! `HttpRequest`, hands it to a `Handler` and maps the response status to a
//! typed `HttpError`. The network exchange itself belongs to the handler;
//! `UreqHandler` is the stock one.
//!
//! # Design
//! - Option merging (`merge_options`) is pure and runs on every call, so
//!   proxy and timeout validation never rely on cached state.
//! - `Options` is the caller-facing set with every key optional;
//!   `RequestOptions` is the validated result a handler receives.
//! - Status classification happens once, after the handler returns:
//!   4xx → `Client`, 5xx → `Server`, 600+ → `Response`.

pub mod client;
pub mod error;
pub mod handler;
pub mod http;
pub mod merge;
pub mod options;
pub mod proxy;
pub mod transport;

pub use crate::client::Client;
pub use crate::error::{BadResponse, HttpError};
pub use crate::handler::Handler;
pub use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse, MultipartPart};
pub use crate::merge::merge_options;
pub use crate::options::{Auth, Options, RequestOptions};
pub use crate::proxy::{Proxy, ProxyOption, ProxyType};
pub use crate::transport::UreqHandler;
