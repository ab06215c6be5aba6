// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cooperative cancellation and per-call deadline contexts.
//!
//! Generalises the whole-process `CancellationToken`/`ShutdownCoordinator`
//! pair into a per-call root context: each `verify`/`apply` invocation owns
//! one [`CancellationToken`] and one root [`RunContext`], and every
//! dispatched step derives a child context with its own deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Cheap-to-clone cancellation signal shared by all workers of a single
/// verify/apply call. Cancelling is idempotent.
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called; a no-op if already cancelled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Root or child context carried through a verify/apply call. Holds the
/// shared cancellation signal plus a deadline specific to this context.
#[derive(Clone)]
pub struct RunContext {
    token: CancellationToken,
    deadline: Instant,
}

impl RunContext {
    /// Root context for a call: deadline = per-step timeout × max(1, step count).
    pub fn root(per_step_timeout: Duration, step_count: usize) -> Self {
        let multiplier = step_count.max(1) as u32;
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now() + per_step_timeout * multiplier,
        }
    }

    /// Derives a child context with the minimum of the remaining pipeline
    /// budget, the step's own timeout override, and a default.
    pub fn child(&self, step_timeout: Option<Duration>, default_timeout: Duration) -> Self {
        let own_budget = step_timeout.unwrap_or(default_timeout);
        let effective = self.remaining().min(own_budget);
        Self {
            token: self.token.clone(),
            deadline: Instant::now() + effective,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
