use std::time::Duration;

/// Why a metadata request failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or read timeout.
    Timeout,
    /// 429 or 503.
    Throttled,
    /// Host unreachable, reset, DNS failure.
    Connection,
    Http5xx(u16),
    /// Truncated or non-JSON page body.
    Decode,
    /// Everything else, including API error payloads. Never retried.
    Other,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Exponential backoff for page and object fetches. Built from `SyncConfig::retry`.
///
/// The delay before attempt `n + 1` is `base_delay * 2^(n-1)`, doubled again
/// when the server is throttling, and never more than `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per request, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based), before any cap.
    fn backoff(&self, attempt: u32, kind: ErrorKind) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let factor = if kind == ErrorKind::Throttled {
            2u32 << shift
        } else {
            1u32 << shift
        };
        self.base_delay.saturating_mul(factor)
    }

    /// Decide what to do after attempt `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts || !kind.is_retryable() {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff(attempt, kind).min(self.max_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay(p: &RetryPolicy, attempt: u32, kind: ErrorKind) -> Duration {
        match p.decide(attempt, kind) {
            RetryDecision::RetryAfter(d) => d,
            RetryDecision::NoRetry => panic!("expected retry after attempt {attempt}"),
        }
    }

    #[test]
    fn api_errors_are_final() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, ErrorKind::Other), RetryDecision::NoRetry);
        assert!(ErrorKind::Decode.is_retryable());
        assert!(ErrorKind::Http5xx(502).is_retryable());
    }

    #[test]
    fn delays_double_per_attempt() {
        let p = RetryPolicy::default();
        assert_eq!(delay(&p, 1, ErrorKind::Connection), Duration::from_millis(250));
        assert_eq!(delay(&p, 2, ErrorKind::Timeout), Duration::from_millis(500));
        assert_eq!(delay(&p, 4, ErrorKind::Decode), Duration::from_secs(2));
    }

    #[test]
    fn throttling_backs_off_harder() {
        let p = RetryPolicy::default();
        assert_eq!(delay(&p, 1, ErrorKind::Throttled), Duration::from_millis(500));
        assert_eq!(delay(&p, 3, ErrorKind::Throttled), Duration::from_secs(2));
    }

    #[test]
    fn delay_is_capped() {
        let p = RetryPolicy {
            max_attempts: 40,
            ..RetryPolicy::default()
        };
        assert_eq!(delay(&p, 30, ErrorKind::Throttled), p.max_delay);
    }

    #[test]
    fn stops_at_max_attempts() {
        let p = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        assert!(matches!(p.decide(2, ErrorKind::Throttled), RetryDecision::RetryAfter(_)));
        assert_eq!(p.decide(3, ErrorKind::Throttled), RetryDecision::NoRetry);
        let single = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        assert_eq!(single.decide(1, ErrorKind::Timeout), RetryDecision::NoRetry);
    }
}
