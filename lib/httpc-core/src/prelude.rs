//! Prelude module for convenient imports.
//!
//! ```ignore
//! use httpc_core::prelude::*;
//! ```

pub use crate::{
    Attachment, BytesAttachment, ContentType, Decoder, Encoding, Error, ErrorHandler,
    FileAttachment, HttpClient, JsonDecoder, Method, Request, Response, ResponseResult, Resolver,
    Result, TextDecoder, Values,
};
