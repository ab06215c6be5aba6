// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Panic-safe task spawning for executor workers.
//!
//! A panicking plugin must not take down the whole executor: `join_supervised`
//! converts a panic or cancellation into a `StreamyError::Internal` so the
//! caller can fold it into the step's result instead of propagating it.

use streamy_domain::StreamyError;
use tokio::task::JoinHandle;

pub type SupervisedResult<T> = Result<T, StreamyError>;

/// Spawns a future on the tokio runtime, returning a handle whose join
/// result is already normalized into a `StreamyError`.
pub fn spawn_supervised<T>(future: impl std::future::Future<Output = T> + Send + 'static) -> JoinHandle<T>
where
    T: Send + 'static,
{
    tokio::spawn(future)
}

/// Awaits a handle produced by `spawn_supervised`, mapping panics and
/// cancellations to a `StreamyError::Internal` rather than propagating the
/// `JoinError`.
pub async fn join_supervised<T>(handle: JoinHandle<T>) -> SupervisedResult<T> {
    match handle.await {
        Ok(value) => Ok(value),
        Err(join_err) if join_err.is_panic() => {
            tracing::error!(error = %join_err, "worker task panicked");
            Err(StreamyError::Internal(format!("worker panicked: {join_err}")))
        }
        Err(join_err) if join_err.is_cancelled() => {
            tracing::debug!("worker task cancelled");
            Err(StreamyError::Cancelled("worker task was cancelled".to_string()))
        }
        Err(join_err) => {
            tracing::error!(error = %join_err, "worker task failed");
            Err(StreamyError::Internal(join_err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn normal_completion_returns_value() {
        let handle = spawn_supervised(async { 42 });
        assert_eq!(join_supervised(handle).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn panic_is_converted_to_internal_error() {
        let handle = spawn_supervised(async {
            panic!("boom");
            #[allow(unreachable_code)]
            0
        });
        let err = join_supervised(handle).await.unwrap_err();
        assert_eq!(err.code(), "internal");
    }

    #[tokio::test]
    async fn abort_is_converted_to_cancelled_error() {
        let handle = spawn_supervised(async {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        });
        handle.abort();
        let err = join_supervised(handle).await.unwrap_err();
        assert_eq!(err.code(), "cancelled");
    }
}
