// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight refresh gate: at most one refresh call in flight, with a
//! FIFO queue of waiters resolved by the leader's outcome.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

/// Outcome shared with every queued waiter: the new access token, or the
/// reason the refresh failed.
pub type RefreshOutcome = Result<String, String>;

/// Result of [`RefreshGate::acquire_or_wait`].
pub enum Flight {
    /// No refresh was in flight; the caller must perform one and resolve
    /// the permit.
    Leader(RefreshPermit),
    /// A refresh is in flight; await its outcome.
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Coordinator ensuring at most one refresh call is outstanding.
///
/// The in-flight check and the waiter enqueue happen under one lock, so a
/// waiter can never be queued while nothing is in flight.
#[derive(Debug, Default)]
pub struct RefreshGate {
    state: Mutex<GateState>,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the leader if no refresh is in flight, otherwise join the
    /// queue. Waiters are resolved in the order they joined.
    pub fn acquire_or_wait(self: &Arc<Self>) -> Flight {
        let mut state = self.state.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            Flight::Waiter(rx)
        } else {
            state.in_flight = true;
            Flight::Leader(RefreshPermit { gate: Arc::clone(self), resolved: false })
        }
    }

    /// Resolve all queued waiters in FIFO order and reset to idle.
    fn finish(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.state.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Held by the refresh leader; resolving it wakes the queue.
///
/// Dropping the permit unresolved fails all waiters, so an abandoned
/// refresh cannot strand the queue.
pub struct RefreshPermit {
    gate: Arc<RefreshGate>,
    resolved: bool,
}

impl RefreshPermit {
    /// Publish the refresh outcome to every waiter and reset the gate.
    pub fn complete(mut self, outcome: RefreshOutcome) {
        self.resolved = true;
        self.gate.finish(outcome);
    }
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        if !self.resolved {
            self.gate.finish(Err("refresh abandoned".to_owned()));
        }
    }
}

/// Await a queued refresh outcome, bounded by `wait` and by `shutdown`.
pub async fn wait_for_outcome(
    rx: oneshot::Receiver<RefreshOutcome>,
    wait: Duration,
    shutdown: &CancellationToken,
) -> Result<String, ApiError> {
    tokio::select! {
        _ = shutdown.cancelled() => Err(ApiError::Shutdown),
        outcome = tokio::time::timeout(wait, rx) => match outcome {
            Err(_) => Err(ApiError::RefreshTimeout),
            Ok(Err(_)) => Err(ApiError::RefreshFailed { reason: "refresh abandoned".to_owned() }),
            Ok(Ok(Ok(token))) => Ok(token),
            Ok(Ok(Err(reason))) => Err(ApiError::RefreshFailed { reason }),
        },
    }
}

#[cfg(test)]
#[path = "singleflight_tests.rs"]
mod tests;
