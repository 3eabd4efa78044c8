//! Bounded retry for stale sessions.
//!
//! The server may expire a session independently of the client. A reply
//! status matching the predicate triggers a reconnect and a bounded number
//! of replays; anything else is final.

use tracing::debug;

/// Status the control plane answers when a session id is unknown.
pub const STALE_SESSION_STATUS: u16 = 400;

/// Retry policy for calls made over a stale session.
#[derive(Debug, Clone, Copy)]
pub struct StaleSessionRetry {
    max_retries: u32,
    is_stale: fn(u16) -> bool,
}

impl StaleSessionRetry {
    /// Create a policy with an explicit retry bound and predicate.
    pub fn new(max_retries: u32, is_stale: fn(u16) -> bool) -> Self {
        Self {
            max_retries,
            is_stale,
        }
    }

    /// Maximum number of replays for one logical call.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Whether a reply with `status` after `attempt` replays should be retried.
    pub fn should_retry(&self, status: u16, attempt: u32) -> bool {
        let retry = (self.is_stale)(status) && attempt < self.max_retries;
        if retry {
            debug!(status, attempt, max = self.max_retries, "Stale session, retrying");
        }
        retry
    }
}

impl Default for StaleSessionRetry {
    fn default() -> Self {
        Self::new(1, |status| status == STALE_SESSION_STATUS)
    }
}
