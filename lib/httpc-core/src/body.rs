//! Body encoding: parameter flattening, form / multipart / JSON bodies.

use bytes::Bytes;

use crate::attachment::{Attachment, attach_all};
use crate::{Error, MultipartWriter, Result, Values};

/// Well-known content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Multipart form content type (`multipart/form-data`).
    MultipartFormData,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::MultipartFormData => "multipart/form-data",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extract the content-type token of a `Content-Type` header value.
///
/// The value is trimmed, cut at the first `;` and lower-cased.
///
/// ```
/// use httpc_core::content_type_token;
///
/// assert_eq!(content_type_token(" application/json; charset=utf-8"), "application/json");
/// ```
#[must_use]
pub fn content_type_token(header_value: &str) -> String {
    header_value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Wire encoding of a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// `application/x-www-form-urlencoded`.
    #[default]
    FormUrlEncoded,
    /// `multipart/form-data` with a generated boundary.
    Multipart,
    /// `application/json`.
    Json,
}

impl Encoding {
    /// Select the encoding for a content-type header value or token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAvailableEncoder`] for any other content type.
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let token = content_type_token(content_type);
        match token.as_str() {
            "application/x-www-form-urlencoded" => Ok(Self::FormUrlEncoded),
            "multipart/form-data" => Ok(Self::Multipart),
            "application/json" => Ok(Self::Json),
            _ => Err(Error::no_available_encoder(token)),
        }
    }

    /// Content type produced by this encoding (without boundary parameter).
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        match self {
            Self::FormUrlEncoded => ContentType::FormUrlEncoded,
            Self::Multipart => ContentType::MultipartFormData,
            Self::Json => ContentType::Json,
        }
    }
}

/// An encoded request body with its `Content-Type` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    content_type: String,
    body: Bytes,
}

impl EncodedBody {
    /// Creates an encoded body.
    #[must_use]
    pub fn new(content_type: impl Into<String>, body: Bytes) -> Self {
        Self {
            content_type: content_type.into(),
            body,
        }
    }

    /// `Content-Type` header value (includes the boundary for multipart).
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Encoded bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Byte length of the encoded body.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Consume into (content type, body).
    #[must_use]
    pub fn into_parts(self) -> (String, Bytes) {
        (self.content_type, self.body)
    }
}

/// Flatten a value into key/value pairs.
///
/// Field names are the serde names; `Vec<T>` fields produce repeated keys and
/// fields skipped by `#[serde(skip_serializing_if = ...)]` are omitted.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as flat pairs
/// (nested structs, maps of maps...).
///
/// # Example
///
/// ```
/// use httpc_core::to_values;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Params { name: String, scores: Vec<u32> }
///
/// let values = to_values(&Params { name: "Jane".into(), scores: vec![100, 90] })?;
/// assert_eq!(values.get_all("scores"), ["100", "90"]);
/// # Ok::<(), httpc_core::Error>(())
/// ```
pub fn to_values<T: serde::Serialize + ?Sized>(value: &T) -> Result<Values> {
    let encoded = serde_html_form::to_string(value)?;
    Ok(Values::parse(&encoded))
}

/// Encode values as an `application/x-www-form-urlencoded` body.
#[must_use]
pub fn encode_form(values: &Values) -> EncodedBody {
    EncodedBody::new(
        ContentType::FormUrlEncoded.as_str(),
        Bytes::from(values.encode()),
    )
}

/// Encode values and attachments as a `multipart/form-data` body.
///
/// Every pair is written as a form field, then each attachment writes itself.
/// The first failure aborts the encoding and is returned unchanged; remaining
/// attachments are dropped unwritten.
pub fn encode_multipart(
    values: &Values,
    attachments: impl IntoIterator<Item = Box<dyn Attachment>>,
) -> Result<EncodedBody> {
    encode_multipart_with(MultipartWriter::new(), values, attachments)
}

/// Same as [`encode_multipart`] with a caller-provided writer.
pub fn encode_multipart_with(
    mut writer: MultipartWriter,
    values: &Values,
    attachments: impl IntoIterator<Item = Box<dyn Attachment>>,
) -> Result<EncodedBody> {
    for (key, value) in values.pairs() {
        writer.write_field(key, value)?;
    }
    attach_all(&mut writer, attachments)?;

    let (content_type, body) = writer.finish();
    Ok(EncodedBody::new(content_type, body))
}

/// Encode a value as an `application/json` body.
pub fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<EncodedBody> {
    Ok(EncodedBody::new(ContentType::Json.as_str(), to_json(value)?))
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use httpc_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so the error names the field that failed
/// (e.g. "user.address.city").
///
/// # Example
///
/// ```
/// use httpc_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let user: User = from_json(br#"{"name":"Alice"}"#).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| Error::json_deserialization(e.path().to_string(), e.inner().to_string()))
}

/// Deserialize an `application/x-www-form-urlencoded` body.
pub fn from_form<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_html_form::from_bytes(bytes).map_err(|e| Error::FormDeserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::BytesAttachment;

    #[derive(serde::Serialize)]
    struct Params {
        name: String,
        age: u32,
        scores: Vec<u32>,
        #[serde(skip_serializing_if = "String::is_empty")]
        description: String,
    }

    fn jane() -> Params {
        Params {
            name: "Jane Doe".to_string(),
            age: 25,
            scores: vec![100, 90, 80],
            description: String::new(),
        }
    }

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(ContentType::MultipartFormData.to_string(), "multipart/form-data");
    }

    #[test]
    fn token_is_trimmed_and_truncated() {
        assert_eq!(
            content_type_token("application/json; charset=utf-8"),
            "application/json"
        );
        assert_eq!(content_type_token("  Text/HTML  "), "text/html");
        assert_eq!(content_type_token(""), "");
    }

    #[test]
    fn encoding_selection() {
        assert_eq!(
            Encoding::from_content_type("application/json; charset=utf-8").expect("json"),
            Encoding::Json
        );
        assert_eq!(
            Encoding::from_content_type("multipart/form-data").expect("multipart"),
            Encoding::Multipart
        );
        assert_eq!(Encoding::default(), Encoding::FormUrlEncoded);

        let err = Encoding::from_content_type("application/xml").expect_err("unsupported");
        assert!(matches!(
            err,
            Error::NoAvailableEncoder { ref content_type } if content_type == "application/xml"
        ));
    }

    #[test]
    fn to_values_flattens_struct() {
        let values = to_values(&jane()).expect("encode");

        assert_eq!(values.get("name"), Some("Jane Doe"));
        assert_eq!(values.get("age"), Some("25"));
        assert_eq!(values.get_all("scores"), ["100", "90", "80"]);
        assert_eq!(values.get("description"), None);
    }

    #[test]
    fn form_body_round_trips_as_strings() {
        let body = encode_form(&to_values(&jane()).expect("encode"));
        assert_eq!(body.content_type(), "application/x-www-form-urlencoded");
        assert_eq!(body.content_length(), body.body().len());

        let decoded: HashMap<String, Vec<String>> = from_form(body.body()).expect("decode");
        let field = |key: &str| decoded.get(key).cloned().unwrap_or_default();
        assert_eq!(field("name"), ["Jane Doe"]);
        assert_eq!(field("age"), ["25"]);
        assert_eq!(field("scores"), ["100", "90", "80"]);
    }

    #[test]
    fn multipart_body_has_fields_then_files() {
        let values = to_values(&jane()).expect("encode");
        let attachments = vec![BytesAttachment::new("data1", "data1.txt", "hello").boxed()];

        let body =
            encode_multipart_with(MultipartWriter::with_boundary("xyz"), &values, attachments)
                .expect("multipart");

        assert_eq!(body.content_type(), "multipart/form-data; boundary=xyz");
        let text = String::from_utf8_lossy(body.body());
        let name = text.find("name=\"name\"").expect("name field");
        let file = text.find("name=\"data1\"").expect("file part");
        assert!(name < file);
        assert_eq!(text.matches("name=\"scores\"").count(), 3);
    }

    #[test]
    fn json_body() {
        let body = encode_json(&serde_json::json!({"name": "Alice"})).expect("json");
        assert_eq!(body.content_type(), "application/json");
        assert_eq!(body.body().as_ref(), br#"{"name":"Alice"}"#);
    }

    #[test]
    fn from_json_missing_field_error_with_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let err = from_json::<User>(br#"{"address":{}}"#).expect_err("should fail");
        let msg = err.to_string();
        assert!(msg.contains("address"), "Expected path 'address' in error: {msg}");
        assert!(msg.contains("city"), "Expected field 'city' in error: {msg}");
    }
}
