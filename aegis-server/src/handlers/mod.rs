//! HTTP handlers

pub mod health;
pub mod detect;
pub mod logs;
pub mod dashboard;
pub mod export;
pub mod sitrep;

use crate::AppResult;

/// Run file-backed work off the async executor
pub(crate) async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
