//! Ordered fallback pipelines.
//!
//! Every "try A, else B, else C" chain in the wallet is expressed as a list of
//! [`Attempt`]s handed to [`first_success`]. Attempts are lazy: an attempt's
//! future is only polled after every earlier attempt has failed, and the
//! remaining attempts are dropped unpolled once one succeeds.

use crate::error::{Result, WalletError};
use futures_util::future::BoxFuture;
use std::future::Future;

pub struct Attempt<'a, T> {
    name: &'static str,
    run: BoxFuture<'a, Result<T>>,
}

pub fn attempt<'a, T, F>(name: &'static str, fut: F) -> Attempt<'a, T>
where
    F: Future<Output = Result<T>> + Send + 'a,
{
    Attempt {
        name,
        run: Box::pin(fut),
    }
}

/// Result of a pipeline that found a working strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success<T> {
    pub strategy: &'static str,
    pub value: T,
    /// Failures recorded before the winning strategy, in order.
    pub failures: Vec<(&'static str, String)>,
}

/// Run `attempts` in order and return the first `Ok`.
///
/// Fails with [`WalletError::Exhausted`] listing every strategy's error when
/// none of them succeeds.
pub async fn first_success<'a, T>(label: &str, attempts: Vec<Attempt<'a, T>>) -> Result<Success<T>> {
    let mut failures = Vec::new();

    for Attempt { name, run } in attempts {
        tracing::debug!("[{}] trying {}", label, name);
        match run.await {
            Ok(value) => {
                tracing::debug!("[{}] {} succeeded", label, name);
                return Ok(Success {
                    strategy: name,
                    value,
                    failures,
                });
            }
            Err(e) => {
                tracing::warn!("[{}] {} failed: {}", label, name, e);
                failures.push((name, e.to_string()));
            }
        }
    }

    let summary = if failures.is_empty() {
        "no strategies configured".to_string()
    } else {
        failures
            .iter()
            .map(|(name, err)| format!("{name}: {err}"))
            .collect::<Vec<_>>()
            .join("; ")
    };
    Err(WalletError::Exhausted {
        label: label.to_string(),
        summary,
    })
}
