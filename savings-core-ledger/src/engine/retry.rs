//! Bounded exponential backoff for CAS version conflicts.

use rand::Rng;
use savings_core_api::{LedgerError, LedgerResult};
use std::time::Duration;
use uuid::Uuid;

use crate::config::LedgerConfig;

/// Retry budget for one operation on one account.
#[derive(Debug, Clone)]
pub struct Backoff {
    retries: u32,
    max_retries: u32,
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            retries: 0,
            max_retries: config.max_cas_retries,
            base: config.base_backoff(),
            max: config.max_backoff(),
        }
    }

    /// CAS attempts made so far, counting the one that just conflicted.
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Backoff before retry number `retry` (0-based), without jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        let spread = delay.as_millis() as u64 / 2;
        if spread == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }

    /// Sleeps before the next attempt, or fails with `Contended` once the
    /// budget is spent.
    pub async fn wait(&mut self, account_id: Uuid) -> LedgerResult<()> {
        if self.retries >= self.max_retries {
            tracing::warn!(%account_id, attempts = self.attempts(), "retry budget exhausted");
            return Err(LedgerError::Contended {
                account_id,
                attempts: self.attempts(),
            });
        }

        let delay = self.jittered(self.delay_for(self.retries));
        self.retries += 1;
        tracing::debug!(%account_id, retry = self.retries, delay_ms = delay.as_millis() as u64, "version conflict, retrying");
        tokio::time::sleep(delay).await;
        Ok(())
    }
}
