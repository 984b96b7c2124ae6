//! At-least-once delivery means the same `signal_id` can reach the
//! signal-processing activity more than once; the dedupe store is what turns
//! that into exactly-once processing.
//!
//! Spec §4.2 calls out a TOCTOU hazard in the naive `is_duplicate` +
//! `mark_processed` pairing — two concurrent deliveries of the same
//! `signal_id` can both observe "not yet seen" before either marks it. The
//! store's primary API is therefore a single atomic check-and-set,
//! `try_claim`, and `is_duplicate`/`mark_processed` are convenience wrappers
//! built on top of it for callers that only need one half.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use waittask_types::{ErrorKind, WaitTaskError};

/// Atomic check-and-set store for `signal_id` claims.
#[async_trait]
pub trait DedupeStore: Send + Sync {
    /// Atomically claim `signal_id`. Returns `Ok(true)` if this call is the
    /// first to claim it (the caller should proceed), `Ok(false)` if it was
    /// already claimed (the caller should treat this as a duplicate).
    async fn try_claim(&self, signal_id: &str) -> Result<bool, WaitTaskError>;

    /// Release any resources held for this wait-task instance (e.g. a Redis
    /// connection). A no-op for in-memory implementations.
    async fn close(&self) {}

    /// Convenience wrapper: true if `signal_id` has already been claimed.
    /// Callers that need atomicity must use [`try_claim`](DedupeStore::try_claim)
    /// directly — this alone is as TOCTOU-prone as the naming suggests.
    async fn is_duplicate(&self, signal_id: &str) -> Result<bool, WaitTaskError> {
        Ok(!self.try_claim(signal_id).await?)
    }

    /// Convenience wrapper: unconditionally record `signal_id` as claimed.
    /// Like `is_duplicate`, this alone is TOCTOU-prone — a caller racing
    /// another delivery of the same `signal_id` should use `try_claim` and
    /// act on its return value instead of checking then marking separately.
    async fn mark_processed(&self, signal_id: &str) -> Result<(), WaitTaskError> {
        self.try_claim(signal_id).await?;
        Ok(())
    }
}

/// Reference [`DedupeStore`] implementation: an in-process map guarded by a
/// `Mutex`, with a lazy sweep of entries older than `retention` run inline on
/// every `try_claim` rather than on a background timer — this is the
/// single-process default the [`crate::factory::WaitTaskFactory`] wires up
/// when the host doesn't supply a distributed store (e.g. Redis-backed) of
/// its own.
pub struct InMemoryDedupeStore {
    claims: Mutex<HashMap<String, Instant>>,
    retention: Duration,
}

impl InMemoryDedupeStore {
    pub fn new() -> Self {
        Self::with_retention(Duration::from_secs(24 * 60 * 60))
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            claims: Mutex::new(HashMap::new()),
            retention,
        }
    }

    fn sweep(&self, claims: &mut HashMap<String, Instant>) {
        let retention = self.retention;
        claims.retain(|_, claimed_at| claimed_at.elapsed() < retention);
    }
}

impl Default for InMemoryDedupeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupeStore for InMemoryDedupeStore {
    async fn try_claim(&self, signal_id: &str) -> Result<bool, WaitTaskError> {
        let mut claims = self.claims.lock().map_err(|_| {
            WaitTaskError::new(ErrorKind::DedupeTransient, "dedupe store lock poisoned")
        })?;
        self.sweep(&mut claims);
        if claims.contains_key(signal_id) {
            tracing::debug!(signal_id, "dedupe: signal already claimed");
            Ok(false)
        } else {
            claims.insert(signal_id.to_string(), Instant::now());
            tracing::trace!(signal_id, "dedupe: claimed signal");
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn first_claim_succeeds_second_is_rejected() {
        // #[test_log::test] surfaces the tracing::debug!/trace! calls above
        // on stderr when this test is run with --nocapture, instead of them
        // vanishing into a subscriber that was never installed.
        let store = InMemoryDedupeStore::new();
        assert!(store.try_claim("sig-1").await.unwrap());
        assert!(!store.try_claim("sig-1").await.unwrap());
    }

    #[tokio::test]
    async fn distinct_signal_ids_claim_independently() {
        let store = InMemoryDedupeStore::new();
        assert!(store.try_claim("sig-1").await.unwrap());
        assert!(store.try_claim("sig-2").await.unwrap());
    }

    #[tokio::test]
    async fn is_duplicate_reflects_prior_claim() {
        let store = InMemoryDedupeStore::new();
        assert!(!store.is_duplicate("sig-1").await.unwrap());
        assert!(store.is_duplicate("sig-1").await.unwrap());
    }

    #[tokio::test]
    async fn mark_processed_then_try_claim_reports_duplicate() {
        let store = InMemoryDedupeStore::new();
        store.mark_processed("sig-1").await.unwrap();
        assert!(!store.try_claim("sig-1").await.unwrap());
    }

    #[tokio::test]
    async fn expired_claims_are_swept_and_can_be_reclaimed() {
        let store = InMemoryDedupeStore::with_retention(Duration::from_millis(1));
        assert!(store.try_claim("sig-1").await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store.try_claim("sig-1").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_claim_logs_are_visible_under_a_manual_subscriber() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let store = InMemoryDedupeStore::new();
        assert!(store.try_claim("sig-1").await.unwrap());
        assert!(!store.try_claim("sig-1").await.unwrap());
    }
}
