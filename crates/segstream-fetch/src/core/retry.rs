use std::time::Duration;

use crate::data::{Backoff, RetryPolicy};

/// Delay to sleep after failed attempt number `attempt` (1-based).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use segstream_fetch::{Backoff, RetryPolicy, core::retry_delay};
///
/// let fixed = RetryPolicy::default().delay(Duration::from_millis(100));
/// assert_eq!(retry_delay(1, &fixed), Duration::from_millis(100));
/// assert_eq!(retry_delay(2, &fixed), Duration::from_millis(100));
///
/// let exp = fixed.backoff(Backoff::Exponential);
/// assert_eq!(retry_delay(1, &exp), Duration::from_millis(100));
/// assert_eq!(retry_delay(3, &exp), Duration::from_millis(400));
/// ```
pub fn retry_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    match policy.backoff {
        Backoff::Fixed => policy.delay,
        Backoff::Exponential => {
            let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1));
            policy.delay.saturating_mul(multiplier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exponential(base: Duration) -> RetryPolicy {
        RetryPolicy::default().delay(base).backoff(Backoff::Exponential)
    }

    #[test]
    fn test_fixed_delay_is_constant() {
        let policy = RetryPolicy::default();
        for attempt in 1..=5 {
            assert_eq!(retry_delay(attempt, &policy), Duration::from_secs(1));
        }
    }

    #[test]
    fn test_exponential_growth() {
        let policy = exponential(Duration::from_millis(10));
        let delays: Vec<Duration> = (1..6).map(|i| retry_delay(i, &policy)).collect();

        assert_eq!(delays[0], Duration::from_millis(10));
        for i in 1..delays.len() {
            assert_eq!(delays[i], delays[i - 1] * 2);
        }
    }

    #[test]
    fn test_zero_base_stays_zero() {
        let policy = exponential(Duration::ZERO);
        assert_eq!(retry_delay(1, &policy), Duration::ZERO);
        assert_eq!(retry_delay(10, &policy), Duration::ZERO);
    }

    #[test]
    fn test_attempt_zero_treated_as_first() {
        let policy = exponential(Duration::from_millis(100));
        assert_eq!(retry_delay(0, &policy), Duration::from_millis(100));
    }

    #[test]
    fn test_overflow_protection() {
        let policy = exponential(Duration::from_secs(u64::MAX / 2));
        assert!(retry_delay(40, &policy) > Duration::ZERO);
    }
}
