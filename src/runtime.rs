//! Bridge from async callers to the synchronous Diesel ports.

use crate::domain::errors::DomainError;

/// Runs a synchronous repository call on the blocking thread pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, DomainError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))?
}
