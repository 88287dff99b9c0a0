use crate::utils::error::{DevReadyError, Result};
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            interval: Duration::from_millis(250),
        }
    }
}

impl WaitOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Polls `check` until it returns true. The first check runs immediately.
pub async fn wait_until<F>(mut check: F, options: WaitOptions) -> Result<()>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() <= options.timeout {
        if check() {
            return Ok(());
        }
        tokio::time::sleep(options.interval).await;
    }

    Err(DevReadyError::WaitTimeout {
        timeout_ms: options.timeout.as_millis(),
    })
}

/// Same as [`wait_until`] for checks that have to await, such as HTTP requests.
/// Each check is cut off once the overall timeout is spent, so a check that
/// hangs counts as failed instead of stretching the wait.
pub async fn wait_until_async<F, Fut>(mut check: F, options: WaitOptions) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    while start.elapsed() <= options.timeout {
        let remaining = options.timeout.saturating_sub(start.elapsed());
        if let Ok(true) = tokio::time::timeout(remaining, check()).await {
            return Ok(());
        }
        tokio::time::sleep(options.interval).await;
    }

    Err(DevReadyError::WaitTimeout {
        timeout_ms: options.timeout.as_millis(),
    })
}
