//! Request builder.
//!
//! A [`Call`] accumulates the configuration of one request through chained,
//! consuming methods, then a verb ([`get`](Call::get), [`post`](Call::post),
//! [`post_multipart`](Call::post_multipart), [`post_json`](Call::post_json),
//! [`send`](Call::send)) encodes the body, finalizes the request, dispatches
//! it, and resolves the response into a `T`.
//!
//! # Example
//!
//! ```no_run
//! use httpc::Call;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct Search<'a> { q: &'a str, page: u32 }
//!
//! #[derive(Deserialize)]
//! struct Hits { total: u64 }
//!
//! # async fn run() -> httpc::Result<()> {
//! let hits: Hits = Call::json()
//!     .header("Accept", "application/json")
//!     .basic_auth("user", "secret")
//!     .get_with("https://api.example.com/search", &Search { q: "rust", page: 1 })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Configuration mistakes that cannot be caught by the type system (an invalid
//! header name, a bad method token, parameters that do not flatten) are kept
//! and reported by the verb, before anything is sent.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::header::{
    AUTHORIZATION, CACHE_CONTROL, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue,
};
use http::{HeaderMap, Method};
use httpc_core::{
    Attachment, Decoder, EncodedBody, Encoding, ErrorHandler, Resolver, ResponseResult, Values,
    encode_form, encode_json, encode_multipart, parse_header, to_values,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::dispatch::{DispatchOptions, dispatch};
use crate::{Error, HttpClient, Request, Result, SharedClient};

// ============================================================================
// Header Sources
// ============================================================================

/// Header collections accepted by [`Call::headers`].
///
/// Implemented for [`HeaderMap`] (multiplicities preserved), hash and B-tree
/// maps of strings, and vectors or arrays of string pairs.
pub trait HeaderSource {
    /// Append every header of this source to `headers`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] on the first invalid name or value.
    fn merge_into(self, headers: &mut HeaderMap) -> Result<()>;
}

impl HeaderSource for HeaderMap {
    fn merge_into(self, headers: &mut HeaderMap) -> Result<()> {
        let mut current = None;
        for (name, value) in self {
            if let Some(name) = name {
                current = Some(name);
            }
            if let Some(name) = &current {
                headers.append(name.clone(), value);
            }
        }
        Ok(())
    }
}

fn append_pairs<K, V>(
    headers: &mut HeaderMap,
    pairs: impl IntoIterator<Item = (K, V)>,
) -> Result<()>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (name, value) in pairs {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        headers.append(name, value);
    }
    Ok(())
}

impl<K: AsRef<str>, V: AsRef<str>, S> HeaderSource for HashMap<K, V, S> {
    fn merge_into(self, headers: &mut HeaderMap) -> Result<()> {
        append_pairs(headers, self)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> HeaderSource for BTreeMap<K, V> {
    fn merge_into(self, headers: &mut HeaderMap) -> Result<()> {
        append_pairs(headers, self)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> HeaderSource for Vec<(K, V)> {
    fn merge_into(self, headers: &mut HeaderMap) -> Result<()> {
        append_pairs(headers, self)
    }
}

impl<K: AsRef<str>, V: AsRef<str>, const N: usize> HeaderSource for [(K, V); N] {
    fn merge_into(self, headers: &mut HeaderMap) -> Result<()> {
        append_pairs(headers, self)
    }
}

// ============================================================================
// Request Parts
// ============================================================================

/// Everything a [`Call`] accumulates before a verb finalizes it.
#[derive(Debug, Default)]
struct RequestParts {
    method: Option<Method>,
    query: Values,
    headers: HeaderMap,
    credentials: Option<(String, String)>,
    keep_alive: bool,
    content_type: Option<String>,
    options: DispatchOptions,
    deferred: Option<Error>,
}

impl RequestParts {
    /// Keep the first configuration error, reported when the call runs.
    fn defer(&mut self, error: Error) {
        self.deferred.get_or_insert(error);
    }

    fn encoding(&self) -> Result<Encoding> {
        self.content_type
            .as_deref()
            .map_or(Ok(Encoding::default()), Encoding::from_content_type)
    }

    fn finalize(
        self,
        method: Option<Method>,
        url: &str,
        body: Result<Option<EncodedBody>>,
    ) -> Result<(Request<Bytes>, DispatchOptions)> {
        if let Some(error) = self.deferred {
            return Err(error);
        }
        let body = body?;

        let url = url::Url::parse(url)?;
        let mut query = self.query;
        if let Some(embedded) = url.query().map(str::to_owned) {
            query.extend_from_encoded(&embedded);
        }

        let method = method.or(self.method).unwrap_or(Method::GET);
        let mut headers = self.headers;

        if method != Method::GET {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }

        if let Some((username, password)) = &self.credentials
            && !username.is_empty()
            && !password.is_empty()
        {
            headers.insert(AUTHORIZATION, basic_auth_value(username, password)?);
        }

        if !self.keep_alive {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
        }

        let mut builder = Request::builder(method, url).raw_query(&query.encode());
        if let Some(encoded) = body {
            let content_length = HeaderValue::from(encoded.content_length());
            let (content_type, bytes) = encoded.into_parts();
            let content_type = HeaderValue::from_str(&content_type)
                .map_err(|e| Error::invalid_request(format!("invalid content type: {e}")))?;
            headers.insert(CONTENT_TYPE, content_type);
            headers.insert(CONTENT_LENGTH, content_length);
            builder = builder.body(bytes);
        }

        Ok((builder.headers(headers).build(), self.options))
    }
}

fn basic_auth_value(username: &str, password: &str) -> Result<HeaderValue> {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|e| Error::invalid_request(format!("invalid basic auth header: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

fn encode_params<P: Serialize + ?Sized>(encoding: Encoding, params: &P) -> Result<EncodedBody> {
    match encoding {
        Encoding::FormUrlEncoded => Ok(encode_form(&to_values(params)?)),
        Encoding::Multipart => encode_multipart(&to_values(params)?, []),
        Encoding::Json => encode_json(params),
    }
}

// ============================================================================
// Call
// ============================================================================

/// Builder and executor for one HTTP request decoded into a `T`.
///
/// Every configuration method consumes the builder and returns it; every verb
/// consumes it for good, so one `Call` is exactly one request.
///
/// Without [`client`](Self::client), requests go through
/// [`HyperClient::shared`](crate::HyperClient::shared).
pub struct Call<T, C = SharedClient> {
    parts: RequestParts,
    resolver: Resolver<T>,
    client: C,
}

impl<T, C: fmt::Debug> fmt::Debug for Call<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("parts", &self.parts)
            .field("resolver", &self.resolver)
            .field("client", &self.client)
            .finish()
    }
}

impl<T> Default for Call<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Call<T> {
    /// New call with no decoder registered, using the shared default client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(Resolver::new())
    }

    /// New call using the given decoders and error handlers.
    #[must_use]
    pub fn with_resolver(resolver: Resolver<T>) -> Self {
        Self {
            parts: RequestParts::default(),
            resolver,
            client: SharedClient,
        }
    }
}

impl Call<Bytes> {
    /// Call returning the raw body, whatever its content type.
    #[must_use]
    pub fn bytes() -> Self {
        Self::with_resolver(Resolver::bytes())
    }
}

impl Call<String> {
    /// Call returning the body as UTF-8 text, whatever its content type.
    #[must_use]
    pub fn text() -> Self {
        Self::with_resolver(Resolver::text())
    }
}

impl<T: serde::de::DeserializeOwned> Call<T> {
    /// Call decoding `application/json` bodies.
    #[must_use]
    pub fn json() -> Self {
        Self::with_resolver(Resolver::json())
    }
}

impl<T, C: HttpClient> Call<T, C> {
    // ========================================================================
    // Request Configuration
    // ========================================================================

    /// Set the method used by [`send`](Self::send) and [`fetch`](Self::fetch).
    ///
    /// Accepts a [`Method`] or any method token (`"PATCH"`, `"PURGE"`...).
    #[must_use]
    pub fn method<M>(mut self, method: M) -> Self
    where
        Method: TryFrom<M>,
        <Method as TryFrom<M>>::Error: fmt::Display,
    {
        match Method::try_from(method) {
            Ok(method) => self.parts.method = Some(method),
            Err(e) => self
                .parts
                .defer(Error::invalid_request(format!("invalid method: {e}"))),
        }
        self
    }

    /// Append one header value, keeping previous values of the same name.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match parse_header(name.as_ref(), value.as_ref()) {
            Ok((name, value)) => {
                self.parts.headers.append(name, value);
            }
            Err(e) => self.parts.defer(e),
        }
        self
    }

    /// Merge a collection of headers.
    #[must_use]
    pub fn headers(mut self, source: impl HeaderSource) -> Self {
        if let Err(e) = source.merge_into(&mut self.parts.headers) {
            self.parts.defer(e);
        }
        self
    }

    /// Send `Authorization: Basic ...`, only if both parts are non-empty.
    #[must_use]
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.parts.credentials = Some((username.into(), password.into()));
        self
    }

    /// Allow the connection to be reused (default: `Connection: close`).
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.parts.keep_alive = keep_alive;
        self
    }

    /// Replace the query with the flattened fields of `params`.
    ///
    /// Pairs already present in the URL given to the verb are kept and sent
    /// after these.
    #[must_use]
    pub fn query<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        match to_values(params) {
            Ok(values) => self.parts.query = values,
            Err(e) => self.parts.defer(e),
        }
        self
    }

    /// Set one query entry, replacing previous values of `key`.
    #[must_use]
    pub fn query_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.query.set(key, value);
        self
    }

    /// Select the body encoding of [`post`](Self::post) by content type.
    ///
    /// Only `application/x-www-form-urlencoded` (default),
    /// `multipart/form-data` and `application/json` can be encoded; any other
    /// value makes `post` fail with [`Error::NoAvailableEncoder`].
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.parts.content_type = Some(content_type.into());
        self
    }

    /// Abort the call with [`Error::Cancelled`] when `token` fires.
    #[must_use]
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.parts.options.cancel = Some(token);
        self
    }

    /// Abort the call with [`Error::Timeout`] after `deadline`.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.parts.options.deadline = Some(deadline);
        self
    }

    /// Send through `client` instead of the shared default client.
    #[must_use]
    pub fn client<C2: HttpClient>(self, client: C2) -> Call<T, C2> {
        Call {
            parts: self.parts,
            resolver: self.resolver,
            client,
        }
    }

    // ========================================================================
    // Response Configuration
    // ========================================================================

    /// Replace all decoders and error handlers.
    #[must_use]
    pub fn resolver(mut self, resolver: Resolver<T>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Register the decoder for a response content type.
    #[must_use]
    pub fn decoder(mut self, content_type: &str, decoder: impl Decoder<T> + 'static) -> Self {
        self.resolver = self.resolver.with_decoder(content_type, decoder);
        self
    }

    /// Register the error handler for a response content type.
    #[must_use]
    pub fn error_handler(mut self, content_type: &str, handler: impl ErrorHandler + 'static) -> Self {
        self.resolver = self.resolver.with_error_handler(content_type, handler);
        self
    }

    /// Replace the error handler used when no content type matches.
    #[must_use]
    pub fn default_error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.resolver = self.resolver.with_default_error_handler(handler);
        self
    }

    /// Replace the success predicate (default: status is exactly `200`).
    #[must_use]
    pub fn success_when(mut self, is_success: fn(u16) -> bool) -> Self {
        self.resolver = self.resolver.success_when(is_success);
        self
    }

    // ========================================================================
    // Verbs
    // ========================================================================

    /// `GET url`.
    pub async fn get(self, url: &str) -> Result<T> {
        self.run(Some(Method::GET), url, Ok(None))
            .await?
            .into_value()
    }

    /// `GET url` with `params` as query (see [`query`](Self::query)).
    pub async fn get_with<P: Serialize + ?Sized>(self, url: &str, params: &P) -> Result<T> {
        self.query(params).get(url).await
    }

    /// `POST url` with `params` encoded as selected by
    /// [`content_type`](Self::content_type) (url-encoded form by default).
    pub async fn post<P: Serialize + ?Sized>(self, url: &str, params: &P) -> Result<T> {
        let body = self
            .parts
            .encoding()
            .and_then(|encoding| encode_params(encoding, params))
            .map(Some);

        self.run(Some(Method::POST), url, body)
            .await?
            .into_value()
    }

    /// `POST url` with a `multipart/form-data` body.
    ///
    /// Every flattened pair of `params` becomes a form field, then each
    /// attachment writes its file part. The first failing attachment aborts
    /// the call with its error; the following ones are dropped unwritten.
    ///
    /// Without attachments the body is a url-encoded form.
    pub async fn post_multipart<P, I>(self, url: &str, params: &P, attachments: I) -> Result<T>
    where
        P: Serialize + ?Sized,
        I: IntoIterator<Item = Box<dyn Attachment>>,
    {
        let mut attachments = attachments.into_iter().peekable();
        let body = if attachments.peek().is_none() {
            to_values(params).map(|values| encode_form(&values))
        } else {
            to_values(params).and_then(|values| encode_multipart(&values, attachments))
        };

        self.run(Some(Method::POST), url, body.map(Some))
            .await?
            .into_value()
    }

    /// `POST url` with `params` as an `application/json` body.
    pub async fn post_json<P: Serialize + ?Sized>(self, url: &str, params: &P) -> Result<T> {
        let body = encode_json(params).map(Some);
        self.run(Some(Method::POST), url, body)
            .await?
            .into_value()
    }

    /// Send the configured [`method`](Self::method) (default `GET`) without body.
    pub async fn send(self, url: &str) -> Result<T> {
        self.fetch(url).await?.into_value()
    }

    /// Like [`send`](Self::send), but return the response handle undecoded.
    ///
    /// The status has been checked and a decoder selected; decoding happens on
    /// [`ResponseResult::decode`].
    pub async fn fetch(self, url: &str) -> Result<ResponseResult<T>> {
        self.run(None, url, Ok(None)).await
    }

    async fn run(
        self,
        method: Option<Method>,
        url: &str,
        body: Result<Option<EncodedBody>>,
    ) -> Result<ResponseResult<T>> {
        let Self {
            parts,
            resolver,
            client,
        } = self;

        let (request, options) = parts.finalize(method, url, body)?;
        let response = dispatch(&client, request, options).await?;
        resolver.classify(response)
    }
}
