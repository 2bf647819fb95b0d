use std::time::Duration;

/// How the retry executor reacts to transient API conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Pause after a 409 response.
    pub conflict_backoff: Duration,
    /// Pause after re-stamping an SOA serial, so the server's view can settle.
    pub serial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 5,
            conflict_backoff: Duration::from_millis(100),
            serial_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps.
    pub fn immediate(max_retries: u32) -> Self {
        RetryPolicy {
            max_retries,
            conflict_backoff: Duration::ZERO,
            serial_backoff: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub retry: RetryPolicy,
    /// Upper bound for one engine operation, checked between retry attempts only.
    pub operation_timeout: Option<Duration>,
}
