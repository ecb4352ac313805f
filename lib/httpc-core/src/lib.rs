//! Core types and traits for the httpc request helper.
//!
//! This crate provides the transport-independent pieces of httpc:
//! - [`Request`] and [`RequestBuilder`] - finalized HTTP requests
//! - [`Response`] - buffered HTTP responses
//! - [`Values`] - ordered multi-value mapping for queries and forms
//! - [`Encoding`], [`EncodedBody`] - form, multipart and JSON request bodies
//! - [`MultipartWriter`] and [`Attachment`] - streaming file parts
//! - [`Resolver`], [`Decoder`], [`ErrorHandler`] - content-type driven decoding
//! - [`Error`] and [`Result`] - error handling
//! - [`HttpClient`] - transport trait
//! - [`Method`], [`StatusCode`], [`HeaderMap`] and [`header`] (re-exported from `http`)

mod attachment;
mod body;
mod client;
mod error;
mod multipart;
pub mod prelude;
mod request;
mod resolve;
mod response;
mod values;

pub use attachment::{Attachment, BytesAttachment, FileAttachment, attach_all, copy_part};
pub use body::{
    ContentType, EncodedBody, Encoding, content_type_token, encode_form, encode_json,
    encode_multipart, encode_multipart_with, from_form, from_json, to_json, to_values,
};
pub use client::HttpClient;
pub use error::{Error, Result};
pub use multipart::{MultipartWriter, PartWriter};
pub use request::{Request, RequestBuilder, parse_header};
pub use resolve::{
    BytesDecoder, Decoder, DefaultErrorHandler, ErrorHandler, FormDecoder, JsonDecoder, Resolver,
    ResponseResult, TextDecoder,
};
pub use response::Response;
pub use values::Values;

// Re-export http crate types for methods, status codes and headers
pub use http::{HeaderMap, Method, StatusCode, header};
