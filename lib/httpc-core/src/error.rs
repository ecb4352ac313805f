//! Error types for httpc.

use bytes::Bytes;
use derive_more::{Display, Error, From};

/// Main error type for httpc operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Non-success HTTP status, produced by the default error handler.
    ///
    /// The body is buffered once when the response is received and kept here,
    /// so reading it never touches the network again.
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase (or the bare status code when unknown).
        message: String,
        /// Response body.
        #[error(not(source))]
        body: Bytes,
    },

    /// Error produced by a content-type specific error handler.
    #[display("{_0}")]
    #[from(skip)]
    Api(#[error(not(source))] Box<dyn std::error::Error + Send + Sync>),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout, from the client configuration or a call deadline.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The caller's cancellation token fired before the response arrived.
    #[display("request cancelled")]
    #[from(skip)]
    Cancelled,

    /// Invalid request configuration (bad header, bad method token...).
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// I/O error while reading an attachment.
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form / query string serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_html_form::ser::Error),

    /// Form URL-encoded deserialization error.
    #[display("form deserialization error: {_0}")]
    #[from(skip)]
    FormDeserialization(#[error(not(source))] String),

    /// Response body is not valid UTF-8.
    #[display("invalid UTF-8 body: {_0}")]
    #[from]
    Utf8(std::string::FromUtf8Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// No decoder is registered for the response content type.
    #[display("no available decoder for content type '{content_type}'")]
    #[from(skip)]
    NoAvailableDecoder {
        /// Content-type token of the response.
        content_type: String,
    },

    /// No body encoder exists for the selected content type.
    #[display("no available encoder for content type '{content_type}'")]
    #[from(skip)]
    NoAvailableEncoder {
        /// Content-type token selected on the request.
        content_type: String,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error from a status code and the response body.
    ///
    /// The message is the canonical reason phrase of the status.
    #[must_use]
    pub fn http(status: u16, body: impl Into<Bytes>) -> Self {
        let message = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .map_or_else(|| status.to_string(), str::to_string);
        Self::Http {
            status,
            message,
            body: body.into(),
        }
    }

    /// Wrap an error produced by a custom error handler.
    #[must_use]
    pub fn api(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Api(error.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create the "no decoder registered" error.
    #[must_use]
    pub fn no_available_decoder(content_type: impl Into<String>) -> Self {
        Self::NoAvailableDecoder {
            content_type: content_type.into(),
        }
    }

    /// Create the "no encoder registered" error.
    #[must_use]
    pub fn no_available_encoder(content_type: impl Into<String>) -> Self {
        Self::NoAvailableEncoder {
            content_type: content_type.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if the call was cancelled by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns the response body if this is an HTTP error.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Returns `None` if this is not an HTTP error.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Debug, Deserialize)]
    /// struct ApiError {
    ///     code: String,
    /// }
    ///
    /// if let Err(e) = call.get(url).await {
    ///     if let Some(Ok(api_error)) = e.decode_body::<ApiError>() {
    ///         eprintln!("API error: {}", api_error.code);
    ///     }
    /// }
    /// ```
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}
