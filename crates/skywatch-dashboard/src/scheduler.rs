//! Cancellable fixed-period timer.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Calls a tick callback every `period` until cancelled or dropped.
///
/// The first tick fires one full period after [`RefreshSchedule::start`];
/// the caller is expected to have run any immediate work itself.
#[derive(Debug)]
pub struct RefreshSchedule {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshSchedule {
    /// Spawn the timer task. Must be called from within a tokio runtime.
    pub fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let first = Instant::now() + period;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => on_tick(),
                }
            }
            tracing::debug!("Refresh schedule stopped");
        });

        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for RefreshSchedule {
    fn drop(&mut self) {
        self.token.cancel();
        self.handle.abort();
    }
}
