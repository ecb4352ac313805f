//! HTTP request builder with typed, content-type driven response decoding.
//!
//! A [`Call`] collects method, query, headers, credentials and body encoding
//! through chained calls, then a verb sends it and decodes the response:
//!
//! - status `200` (or whatever [`Call::success_when`] accepts) goes to the
//!   [`Decoder`] registered for the response content type;
//! - any other status goes to the matching [`ErrorHandler`], by default
//!   producing [`Error::Http`] with the status and the raw body.
//!
//! # Example
//!
//! ```no_run
//! use httpc::{BytesAttachment, Call, FileAttachment};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct Profile<'a> {
//!     name: &'a str,
//!     age: u32,
//!     scores: Vec<u32>,
//! }
//!
//! #[derive(Deserialize)]
//! struct Receipt {
//!     id: u64,
//! }
//!
//! # async fn run() -> httpc::Result<()> {
//! let profile = Profile { name: "Jane Doe", age: 25, scores: vec![100, 90, 80] };
//!
//! // url-encoded form
//! let receipt: Receipt = Call::json()
//!     .post("https://api.example.com/profiles", &profile)
//!     .await?;
//!
//! // multipart with two file parts
//! let receipt: Receipt = Call::json()
//!     .post_multipart(
//!         "https://api.example.com/uploads",
//!         &profile,
//!         vec![
//!             BytesAttachment::new("data1", "data1.txt", "hello").boxed(),
//!             FileAttachment::open("data2", "report.pdf")?.boxed(),
//!         ],
//!     )
//!     .await?;
//! # let _ = receipt.id;
//! # Ok(())
//! # }
//! ```
//!
//! Requests go through [`HyperClient::shared`] unless another [`HttpClient`]
//! is given with [`Call::client`].

mod call;
mod client;
mod config;
mod connector;
pub mod dispatch;
pub mod middleware;
pub mod prelude;

pub use call::{Call, HeaderSource};
pub use client::{
    BoxedService, HyperClient, HyperClientBuilder, ServiceFuture, SharedClient,
};
pub use config::{ClientConfig, ClientConfigBuilder};

// Re-export tower for middleware composition
pub use tower;

// Cancellation tokens accepted by `Call::cancel_on`
pub use tokio_util::sync::CancellationToken;

// Re-export core types
pub use httpc_core::{
    Attachment, BytesAttachment, BytesDecoder, ContentType, Decoder, DefaultErrorHandler,
    EncodedBody, Encoding, Error, ErrorHandler, FileAttachment, FormDecoder, HttpClient,
    JsonDecoder, MultipartWriter, PartWriter, Request, RequestBuilder, Resolver, Response,
    ResponseResult, Result, TextDecoder, Values, content_type_token, from_form, from_json,
    to_json, to_values,
};

// Re-export http types for methods, status codes and headers
pub use httpc_core::{HeaderMap, Method, StatusCode, header};

pub use url;
