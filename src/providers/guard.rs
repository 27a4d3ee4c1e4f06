use crate::error::{ProviderError, ProviderErrorKind};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run an external call with a deadline and the request's cancellation token.
///
/// Expiry maps to `Timeout`, cancellation to `Cancelled`, and any error from
/// the call itself to `Failed`.
pub async fn guarded<T, F>(
    operation: &str,
    timeout: Duration,
    cancel: &CancellationToken,
    call: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProviderErrorKind::Cancelled),
        result = tokio::time::timeout(timeout, call) => match result {
            Err(_) => Err(ProviderErrorKind::Timeout),
            Ok(Err(error)) => Err(ProviderErrorKind::Failed(format!("{error:#}"))),
            Ok(Ok(value)) => Ok(value),
        },
    };

    outcome.map_err(|kind| {
        let error = ProviderError::new(operation, kind);
        tracing::warn!(operation, %error, "external call failed");
        error
    })
}
