//! Freshness and replay protection.
//!
//! Every request header goes through [`FreshnessGuard::check`]: the timestamp
//! must lie within the skew window around the server clock, and the
//! `(id, nonce)` pair must not have been accepted before within that window.
//! Bewits never reach this module; they are bounded by their expiry alone.
//!
//! Records outlive their usefulness once `ts + window` has passed. They are
//! replaced lazily when the same pair shows up again, and a [`NonceSweeper`]
//! can purge them periodically so the store does not grow without bound.

use std::sync::Arc;
use std::time::Duration;

use hawkstack_core::{Clock, HawkConfig, InMemoryNonceStore, NonceRecord, NonceStore, Timestamp};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Timestamp skew and nonce replay checks over a shared [`NonceStore`].
#[derive(Debug, Clone)]
pub struct FreshnessGuard {
    store: Arc<dyn NonceStore>,
    window: i64,
}

impl FreshnessGuard {
    /// Create a guard accepting timestamps within `window_secs` of the server clock.
    #[must_use]
    pub fn new(store: Arc<dyn NonceStore>, window_secs: u64) -> Self {
        Self {
            store,
            window: i64::try_from(window_secs).unwrap_or(i64::MAX),
        }
    }

    /// Create a guard with an in-memory store and the configured skew window.
    #[must_use]
    pub fn from_config(config: &HawkConfig) -> Self {
        Self::new(Arc::new(InMemoryNonceStore::new()), config.timestamp_skew_secs)
    }

    /// The skew window in seconds.
    #[must_use]
    pub fn window(&self) -> i64 {
        self.window
    }

    /// The backing nonce store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn NonceStore> {
        &self.store
    }

    /// Check that `ts` lies within the window around `now` (inclusive).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StaleTimestamp`] carrying `now` otherwise.
    pub fn check_timestamp(&self, ts: Timestamp, now: Timestamp) -> AuthResult<()> {
        if now.abs_diff(ts) > self.window.unsigned_abs() {
            debug!(ts, now, window = self.window, "Timestamp outside skew window");
            return Err(AuthError::StaleTimestamp { now });
        }
        Ok(())
    }

    /// Run the timestamp check, then record the nonce.
    ///
    /// The nonce is only recorded when the timestamp is fresh, so a stale
    /// request never consumes a nonce.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StaleTimestamp`] or [`AuthError::ReplayedNonce`].
    pub fn check(&self, id: &str, nonce: &str, ts: Timestamp, now: Timestamp) -> AuthResult<()> {
        self.check_timestamp(ts, now)?;
        if !self
            .store
            .insert_if_absent(NonceRecord::new(id, nonce, ts), now, self.window)
        {
            debug!(id, ts, "Nonce already used within skew window");
            return Err(AuthError::ReplayedNonce);
        }
        Ok(())
    }

    /// Purge records that have left the window at `now`.
    pub fn sweep(&self, now: Timestamp) -> usize {
        self.store.sweep(now, self.window)
    }
}

/// Background task sweeping expired nonce records on a fixed period.
///
/// Must be spawned from within a tokio runtime. Dropping the sweeper
/// without calling [`NonceSweeper::shutdown`] leaves the task running until
/// the runtime stops.
#[derive(Debug)]
pub struct NonceSweeper {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl NonceSweeper {
    /// Spawn a sweeper for `guard`, reading time from `clock`.
    #[must_use]
    pub fn spawn(guard: FreshnessGuard, clock: Arc<dyn Clock>, period: Duration) -> Self {
        let (shutdown, mut stop) = oneshot::channel();
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = guard.sweep(clock.now());
                        if removed > 0 {
                            debug!(
                                removed,
                                remaining = guard.store().len(),
                                "Swept expired nonces"
                            );
                        }
                    }
                    _ = &mut stop => {
                        debug!("Nonce sweeper stopping");
                        break;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Spawn a sweeper with the configured period.
    #[must_use]
    pub fn from_config(guard: FreshnessGuard, clock: Arc<dyn Clock>, config: &HawkConfig) -> Self {
        Self::spawn(
            guard,
            clock,
            Duration::from_secs(config.nonce_sweep_interval_secs),
        )
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}
