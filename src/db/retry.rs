// Retry of database operations that fail for transient reasons

use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;

pub const MAX_ATTEMPTS: usize = 5;
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Bounded exponential backoff for transient database failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            min_delay: Duration::from_secs(1),
            max_delay: MAX_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn delays(&self) -> impl Iterator<Item = Duration> {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
            .with_jitter()
            .build()
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempt budget is spent. The last error is returned.
    ///
    /// `op` may run again after a write it issued has committed (the
    /// connection can drop before the reply arrives), so writes passed here
    /// should tolerate being replayed.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, sqlx::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let mut delays = self.delays();
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if is_transient(&err) => match delays.next() {
                    Some(delay) => {
                        tracing::warn!(
                            operation,
                            attempt,
                            error = %err,
                            "Transient database failure - retrying in {:?}",
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        tracing::error!(operation, attempt, error = %err, "Retry budget exhausted");
                        return Err(err);
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }
}

/// Errors worth retrying: broken connections, pool exhaustion and the
/// SQLSTATE classes PostgreSQL uses for recoverable conditions
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| is_transient_sqlstate(&code))
            .unwrap_or(false),
        _ => false,
    }
}

fn is_transient_sqlstate(code: &str) -> bool {
    // 08: connection exception, 53: insufficient resources
    code.starts_with("08")
        || code.starts_with("53")
        || matches!(
            code,
            "40001" | "40P01" | "55P03" | "57P01" | "57P02" | "57P03" | "58000" | "58030"
        )
}
