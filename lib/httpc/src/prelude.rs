//! Prelude module for convenient imports.
//!
//! ```ignore
//! use httpc::prelude::*;
//! ```

pub use crate::{
    Attachment, BytesAttachment, Call, CancellationToken, ContentType, Decoder, Error,
    ErrorHandler, FileAttachment, HttpClient, HyperClient, JsonDecoder, Method, Resolver,
    Response, ResponseResult, Result, StatusCode, TextDecoder, header,
};
pub use serde::{Deserialize, Serialize};
