//! Transport seam.
//!
//! [`HttpClient`] executes a finalized [`Request`] and buffers the whole
//! response. The `httpc` crate provides a hyper-based implementation; tests
//! and custom transports implement it directly.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::HeaderMap;
/// use httpc_core::{HttpClient, Request, Response, Result};
///
/// /// Answers every request with an empty `204`.
/// struct NoContent;
///
/// impl HttpClient for NoContent {
///     async fn execute(&self, _request: Request<Bytes>) -> Result<Response<Bytes>> {
///         Ok(Response::new(204, HeaderMap::new(), Bytes::new()))
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the buffered response.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails:
    /// - connection errors
    /// - TLS errors
    /// - I/O errors while reading the body
    ///
    /// A non-success status is not an error at this level.
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        self.as_ref().execute(request)
    }
}

impl<C: HttpClient> HttpClient for &C {
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).execute(request)
    }
}
