//! Tower middleware layers for the default client.
//!
//! Layers wrap the transport of a [`HyperClient`](crate::HyperClient) and see
//! every finalized request and buffered response. Add them with
//! [`HyperClientBuilder::layer`](crate::HyperClientBuilder::layer), or use the
//! [`with_logging`](crate::HyperClientBuilder::with_logging) helper.
//!
//! # Available Layers
//!
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`
//!
//! Any other tower layer over `Request<Bytes>` / `Response<Bytes>` with
//! [`Error`](crate::Error) as error type fits too.

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
