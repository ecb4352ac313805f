//! Dispatcher: runs one finalized request through an [`HttpClient`].
//!
//! The exchange is raced against the caller's cancellation token and bounded
//! by the call deadline. Transport errors are returned as produced by the
//! client.

use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, warn};

use crate::{Error, HttpClient, Request, Response, Result};

/// Per-call execution limits.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Aborts the exchange with [`Error::Cancelled`] when fired.
    pub cancel: Option<CancellationToken>,
    /// Aborts the exchange with [`Error::Timeout`] when elapsed.
    pub deadline: Option<Duration>,
}

/// Execute `request` and return the buffered response.
///
/// A token that is already cancelled stops the call before anything is sent.
pub async fn dispatch<C: HttpClient>(
    client: &C,
    request: Request<Bytes>,
    options: DispatchOptions,
) -> Result<Response<Bytes>> {
    let span = debug_span!("httpc", method = %request.method(), url = %request.url());
    let DispatchOptions { cancel, deadline } = options;

    async move {
        debug!("dispatching request");
        let start = Instant::now();

        let exchange = async {
            match deadline {
                Some(deadline) => tokio::time::timeout(deadline, client.execute(request))
                    .await
                    .unwrap_or_else(|_elapsed| Err(Error::Timeout)),
                None => client.execute(request).await,
            }
        };

        let result = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(Error::Cancelled),
                    result = exchange => result,
                }
            }
            None => exchange.await,
        };

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(response) => debug!(status = response.status(), elapsed_ms, "response received"),
            Err(err) => warn!(error = %err, elapsed_ms, "request failed"),
        }

        result
    }
    .instrument(span)
    .await
}
