//! Cooperative cancellation shared by one build invocation

use std::future::Future;

pub use tokio_util::sync::CancellationToken;

use crate::error::{GantryError, Result};

/// Checkpoint: fail with [`GantryError::Cancelled`] once the token fired
pub fn check_cancelled(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(GantryError::Cancelled)
    } else {
        Ok(())
    }
}

/// Race an operation against the token.
///
/// The operation is dropped when the token fires first.
pub async fn run_cancellable<F, T>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(GantryError::Cancelled),
        result = fut => result,
    }
}
