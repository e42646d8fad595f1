//! Retry policy with exponential backoff for transient transport failures.
//!
//! The original deployment defined `app.retry.attempts` and
//! `app.retry.delay.ms` without consulting them anywhere. Here retry is an
//! explicit [`RetryPolicy`] object fed from those settings and applied
//! uniformly to every transport operation by
//! [`RetryingTransport`](crate::sftp::RetryingTransport).
//!
//! When an operation fails, the error is classified into a [`FailureType`]:
//! connection, protocol, and remote IO failures are transient and retried;
//! authentication rejection, host-key mismatch, bad key material, local
//! filesystem errors, and calls on a disconnected client are permanent and
//! fail immediately.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::config::AppSettings;
use crate::sftp::SftpError;

/// Default maximum delay cap (32 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Maximum jitter added to delays (500ms).
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Classification of a transport failure for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    Transient,
    /// Failure that will not succeed regardless of retries.
    Permanent,
}

/// Decision on whether to retry a failed transport operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number comes next (1-indexed).
        attempt: u32,
    },
    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// Delays follow `min(base_delay * multiplier^n, max_delay) + jitter`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the initial one.
    max_attempts: u32,
    /// Base delay for the first retry.
    base_delay: Duration,
    /// Maximum delay cap.
    max_delay: Duration,
    /// Multiplier applied each attempt.
    backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Creates a policy with explicit settings.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Builds the policy from the resolved application settings,
    /// using the default cap and multiplier.
    #[must_use]
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(
            settings.retry_attempts,
            Duration::from_millis(settings.retry_delay_ms),
            DEFAULT_MAX_DELAY,
            DEFAULT_BACKOFF_MULTIPLIER,
        )
    }

    /// Returns the configured attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides whether the operation that just failed on `attempt`
    /// (1-indexed) should run again.
    #[must_use]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "retry budget exhausted");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Calculates the backoff delay for a retry after `attempt` failures.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        // attempt is 1-indexed; the first retry waits 1x base.
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * self.backoff_multiplier.powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64) + self.calculate_jitter()
    }

    /// Random jitter spreading out simultaneous retries.
    fn calculate_jitter(&self) -> Duration {
        let mut rng = rand::thread_rng();
        let jitter_ms = rng.gen_range(0..=MAX_JITTER.as_millis() as u64);
        Duration::from_millis(jitter_ms)
    }
}

/// Classifies a transport error into a failure type for retry decisions.
///
/// | Error | Type | Rationale |
/// |-------|------|-----------|
/// | Connect | Transient | Server or network may recover |
/// | ConnectTimeout | Transient | Slow network may recover |
/// | Remote | Transient | Remote state may change between attempts |
/// | Protocol | Transient | Session-level hiccup |
/// | AuthRejected | Permanent | Same credentials will be rejected again |
/// | PrivateKey | Permanent | Key material does not change between attempts |
/// | HostKeyRejected | Permanent | Pinned identity mismatch needs operator action |
/// | NotConnected | Permanent | Caller bug, not a network condition |
/// | Io | Permanent | Local filesystem issue |
/// | Pattern | Permanent | The glob will not become valid |
#[must_use]
pub fn classify_error(error: &SftpError) -> FailureType {
    match error {
        SftpError::Connect { .. }
        | SftpError::ConnectTimeout { .. }
        | SftpError::Remote { .. }
        | SftpError::Protocol(_) => FailureType::Transient,

        SftpError::AuthRejected { .. }
        | SftpError::PrivateKey { .. }
        | SftpError::HostKeyRejected { .. }
        | SftpError::NotConnected
        | SftpError::Io { .. }
        | SftpError::Pattern { .. } => FailureType::Permanent,
    }
}
