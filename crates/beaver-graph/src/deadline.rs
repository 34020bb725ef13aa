//! Wall-clock bound for top-level routines.

use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Result};

/// Run `fut`, failing with a timeout error if it exceeds `limit`.
pub async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => bail!("{what} timed out after {}s", limit.as_secs()),
    }
}
