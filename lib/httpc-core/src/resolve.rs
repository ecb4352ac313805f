//! Response resolution: content-type keyed decoders and error handlers.
//!
//! A [`Resolver`] splits responses by status first, then by content type:
//!
//! - success status: the [`Decoder`] registered for the content-type token
//!   turns the body into a `T`, or [`Error::NoAvailableDecoder`] is returned;
//! - any other status: the [`ErrorHandler`] registered for the token (or the
//!   default one) turns the response into an [`Error`].
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::HeaderMap;
//! use httpc_core::{Error, JsonDecoder, Resolver, Response};
//!
//! #[derive(Debug, serde::Deserialize)]
//! struct User { id: u64 }
//!
//! let resolver = Resolver::<User>::new()
//!     .with_decoder("application/json", JsonDecoder)
//!     .with_error_handler("text/plain", |response: &Response| {
//!         Error::api(String::from_utf8_lossy(response.body()).into_owned())
//!     });
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("content-type", "application/json; charset=utf-8".parse().unwrap());
//! let user = resolver.resolve(Response::new(200, headers, Bytes::from(r#"{"id":7}"#)))?;
//! assert_eq!(user.id, 7);
//! # Ok::<(), httpc_core::Error>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::HeaderMap;

use crate::{Error, Response, Result, content_type_token};

// ============================================================================
// Decoders
// ============================================================================

/// Turns a buffered response body into a `T`.
///
/// The returned `Result` is the only success signal: an empty value is a
/// valid value. Implemented for closures `Fn(&Bytes) -> Result<T>`.
pub trait Decoder<T>: Send + Sync {
    /// Decode the body.
    fn decode(&self, body: &Bytes) -> Result<T>;
}

impl<T, F> Decoder<T> for F
where
    F: Fn(&Bytes) -> Result<T> + Send + Sync,
{
    fn decode(&self, body: &Bytes) -> Result<T> {
        self(body)
    }
}

/// Returns the body as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesDecoder;

impl Decoder<Bytes> for BytesDecoder {
    fn decode(&self, body: &Bytes) -> Result<Bytes> {
        Ok(body.clone())
    }
}

impl Decoder<Vec<u8>> for BytesDecoder {
    fn decode(&self, body: &Bytes) -> Result<Vec<u8>> {
        Ok(body.to_vec())
    }
}

/// Decodes the body as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl Decoder<String> for TextDecoder {
    fn decode(&self, body: &Bytes) -> Result<String> {
        Ok(String::from_utf8(body.to_vec())?)
    }
}

/// Decodes a JSON body with path-aware errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl<T: serde::de::DeserializeOwned> Decoder<T> for JsonDecoder {
    fn decode(&self, body: &Bytes) -> Result<T> {
        crate::from_json(body)
    }
}

/// Decodes an `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormDecoder;

impl<T: serde::de::DeserializeOwned> Decoder<T> for FormDecoder {
    fn decode(&self, body: &Bytes) -> Result<T> {
        crate::from_form(body)
    }
}

// ============================================================================
// Error Handlers
// ============================================================================

/// Turns a non-success response into an [`Error`].
///
/// Implemented for closures `Fn(&Response) -> Error`.
pub trait ErrorHandler: Send + Sync {
    /// Build the error for this response.
    fn handle(&self, response: &Response) -> Error;
}

impl<F> ErrorHandler for F
where
    F: Fn(&Response) -> Error + Send + Sync,
{
    fn handle(&self, response: &Response) -> Error {
        self(response)
    }
}

/// Packages status and raw body into [`Error::Http`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, response: &Response) -> Error {
        Error::http(response.status(), response.body().clone())
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Decoder and error-handler registry for one target type `T`.
pub struct Resolver<T> {
    decoders: HashMap<String, Arc<dyn Decoder<T>>>,
    error_handlers: HashMap<String, Arc<dyn ErrorHandler>>,
    default_error_handler: Arc<dyn ErrorHandler>,
    is_success: fn(u16) -> bool,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            decoders: self.decoders.clone(),
            error_handlers: self.error_handlers.clone(),
            default_error_handler: Arc::clone(&self.default_error_handler),
            is_success: self.is_success,
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut decoders: Vec<_> = self.decoders.keys().collect();
        decoders.sort();
        let mut error_handlers: Vec<_> = self.error_handlers.keys().collect();
        error_handlers.sort();
        f.debug_struct("Resolver")
            .field("decoders", &decoders)
            .field("error_handlers", &error_handlers)
            .finish_non_exhaustive()
    }
}

impl<T> Default for Resolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Resolver<T> {
    /// Empty registry: no decoder, default error handler, success = `200`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
            error_handlers: HashMap::new(),
            default_error_handler: Arc::new(DefaultErrorHandler),
            is_success: |status| status == 200,
        }
    }

    /// Register the decoder for a content type, replacing any previous one.
    ///
    /// The key is normalized like a response header (`"text/html; charset=x"`
    /// registers `text/html`). `type/*` and `*/*` act as fallbacks.
    #[must_use]
    pub fn with_decoder(mut self, content_type: &str, decoder: impl Decoder<T> + 'static) -> Self {
        self.decoders
            .insert(content_type_token(content_type), Arc::new(decoder));
        self
    }

    /// Register the error handler for a content type, replacing any previous one.
    #[must_use]
    pub fn with_error_handler(
        mut self,
        content_type: &str,
        handler: impl ErrorHandler + 'static,
    ) -> Self {
        self.error_handlers
            .insert(content_type_token(content_type), Arc::new(handler));
        self
    }

    /// Replace the fallback error handler.
    #[must_use]
    pub fn with_default_error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.default_error_handler = Arc::new(handler);
        self
    }

    /// Replace the success predicate (default: status is exactly `200`).
    #[must_use]
    pub fn success_when(mut self, is_success: fn(u16) -> bool) -> Self {
        self.is_success = is_success;
        self
    }

    /// Whether `status` takes the decoder path.
    #[must_use]
    pub fn is_success(&self, status: u16) -> bool {
        (self.is_success)(status)
    }

    /// Decoder for a content-type token: exact match, then `type/*`, then `*/*`.
    #[must_use]
    pub fn decoder_for(&self, token: &str) -> Option<Arc<dyn Decoder<T>>> {
        let wildcard = token
            .split_once('/')
            .map(|(kind, _)| format!("{kind}/*"));

        self.decoders
            .get(token)
            .or_else(|| wildcard.and_then(|key| self.decoders.get(&key)))
            .or_else(|| self.decoders.get("*/*"))
            .cloned()
    }

    /// Error handler for a content-type token, or the default one.
    #[must_use]
    pub fn error_handler_for(&self, token: &str) -> &dyn ErrorHandler {
        self.error_handlers
            .get(token)
            .unwrap_or(&self.default_error_handler)
            .as_ref()
    }

    /// Classify a response and select its decoder, without decoding yet.
    ///
    /// # Errors
    ///
    /// - the error handler's output for a non-success status;
    /// - [`Error::NoAvailableDecoder`] when no decoder matches the content type.
    pub fn classify(&self, response: Response) -> Result<ResponseResult<T>> {
        let token = response.content_type();

        if !self.is_success(response.status()) {
            return Err(self.error_handler_for(&token).handle(&response));
        }

        let decoder = self
            .decoder_for(&token)
            .ok_or_else(|| Error::no_available_decoder(token))?;
        Ok(ResponseResult { response, decoder })
    }

    /// Classify and decode a response.
    pub fn resolve(&self, response: Response) -> Result<T> {
        self.classify(response)?.into_value()
    }
}

impl Resolver<Bytes> {
    /// Raw body for any content type.
    #[must_use]
    pub fn bytes() -> Self {
        Self::new().with_decoder("*/*", BytesDecoder)
    }
}

impl Resolver<String> {
    /// UTF-8 body for any content type.
    #[must_use]
    pub fn text() -> Self {
        Self::new().with_decoder("*/*", TextDecoder)
    }
}

impl<T: serde::de::DeserializeOwned> Resolver<T> {
    /// JSON body for `application/json`.
    #[must_use]
    pub fn json() -> Self {
        Self::new().with_decoder(crate::ContentType::Json.as_str(), JsonDecoder)
    }
}

// ============================================================================
// Response Result
// ============================================================================

/// A successful response together with the decoder selected for it.
///
/// [`decode`](Self::decode) runs the decoder on every call; decoded values
/// are not cached.
pub struct ResponseResult<T> {
    response: Response,
    decoder: Arc<dyn Decoder<T>>,
}

impl<T> fmt::Debug for ResponseResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseResult")
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

impl<T> ResponseResult<T> {
    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.response.status()
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        self.response.body()
    }

    /// The underlying response.
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Run the decoder on the body.
    pub fn decode(&self) -> Result<T> {
        self.decoder.decode(self.response.body())
    }

    /// Decode and drop the response.
    pub fn into_value(self) -> Result<T> {
        self.decode()
    }

    /// Give up on decoding and keep the raw response.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;
    use http::HeaderValue;
    use http::header::CONTENT_TYPE;

    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct User {
        id: u64,
        name: String,
    }

    #[derive(Debug, derive_more::Display, derive_more::Error)]
    #[display("api error {code}")]
    struct ApiError {
        code: String,
    }

    fn response(status: u16, content_type: Option<&'static str>, body: &'static str) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        Response::new(status, headers, Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn success_uses_matching_decoder() {
        let resolver = Resolver::<User>::json();
        let user = resolver
            .resolve(response(
                200,
                Some("application/json; charset=utf-8"),
                r#"{"id":1,"name":"Alice"}"#,
            ))
            .expect("decoded");

        assert_eq!(
            user,
            User {
                id: 1,
                name: "Alice".to_string()
            }
        );
    }

    #[test]
    fn success_without_decoder_is_reported() {
        let resolver = Resolver::<User>::json();
        let result = resolver.resolve(response(200, Some("text/csv"), "id,name"));

        let_assert!(Err(Error::NoAvailableDecoder { content_type }) = result);
        assert_eq!(content_type, "text/csv");
    }

    #[test]
    fn missing_content_type_has_empty_token() {
        let result = Resolver::<User>::json().resolve(response(200, None, "{}"));
        let_assert!(Err(Error::NoAvailableDecoder { content_type }) = result);
        assert!(content_type.is_empty());
    }

    #[test]
    fn decoder_error_is_propagated() {
        let result = Resolver::<User>::json().resolve(response(200, Some("application/json"), "{"));
        assert!(matches!(result, Err(Error::JsonDeserialization { .. })));
    }

    #[test]
    fn empty_value_is_a_valid_result() {
        let resolver = Resolver::<Vec<u64>>::json();
        let values = resolver
            .resolve(response(200, Some("application/json"), "[]"))
            .expect("empty array decodes");
        assert!(values.is_empty());

        let body = Resolver::bytes()
            .resolve(response(200, None, ""))
            .expect("empty body decodes");
        assert!(body.is_empty());
    }

    #[test]
    fn last_registration_wins() {
        let resolver = Resolver::<String>::new()
            .with_decoder("text/plain", |_: &Bytes| -> Result<String> {
                Ok("first".to_string())
            })
            .with_decoder("text/plain; charset=utf-8", |_: &Bytes| -> Result<String> {
                Ok("second".to_string())
            });

        let value = resolver
            .resolve(response(200, Some("text/plain"), "ignored"))
            .expect("decoded");
        assert_eq!(value, "second");
    }

    #[test]
    fn wildcard_fallbacks() {
        let resolver = Resolver::<String>::new()
            .with_decoder("text/*", TextDecoder)
            .with_decoder("*/*", |body: &Bytes| -> Result<String> {
                Ok(format!("{} bytes", body.len()))
            });

        let html = resolver
            .resolve(response(200, Some("text/html"), "<p>"))
            .expect("text");
        assert_eq!(html, "<p>");

        let binary = resolver
            .resolve(response(200, Some("image/png"), "abcd"))
            .expect("any");
        assert_eq!(binary, "4 bytes");
    }

    #[test]
    fn failure_uses_default_handler() {
        let result = Resolver::<User>::json().resolve(response(
            404,
            Some("application/json"),
            r#"{"error":"missing"}"#,
        ));

        let_assert!(Err(err) = result);
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.body().map(Bytes::as_ref),
            Some(br#"{"error":"missing"}"#.as_slice())
        );
    }

    #[test]
    fn failure_uses_content_type_handler() {
        let resolver = Resolver::<User>::json().with_error_handler(
            "application/problem+json",
            |response: &Response| {
                Error::api(ApiError {
                    code: String::from_utf8_lossy(response.body()).into_owned(),
                })
            },
        );

        let problem = resolver.resolve(response(
            422,
            Some("application/problem+json; charset=utf-8"),
            "E42",
        ));
        let_assert!(Err(Error::Api(inner)) = problem);
        assert_eq!(inner.to_string(), "api error E42");

        // other content types still get the default handler
        let plain = resolver.resolve(response(422, Some("text/plain"), "nope"));
        let_assert!(Err(Error::Http { status: 422, .. }) = plain);
    }

    #[test]
    fn non_200_success_is_an_error_by_default() {
        let result = Resolver::bytes().resolve(response(201, None, "created"));
        assert_eq!(result.expect_err("201 is not 200").status(), Some(201));

        let resolver = Resolver::bytes().success_when(|status| (200..300).contains(&status));
        let body = resolver
            .resolve(response(201, None, "created"))
            .expect("2xx accepted");
        assert_eq!(body.as_ref(), b"created");
    }

    #[test]
    fn replaced_default_handler() {
        let resolver =
            Resolver::bytes().with_default_error_handler(|_: &Response| Error::Timeout);
        let result = resolver.resolve(response(500, None, ""));
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[test]
    fn response_result_decodes_on_demand() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let resolver = Resolver::<usize>::new().with_decoder(
            "*/*",
            move |body: &Bytes| -> Result<usize> {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(body.len())
            },
        );

        let result = resolver
            .classify(response(200, Some("text/plain"), "hello"))
            .expect("success");
        assert_eq!(result.status(), 200);
        assert_eq!(result.decode().expect("first"), 5);
        assert_eq!(result.decode().expect("second"), 5);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(result.into_value().expect("last"), 5);
    }
}
