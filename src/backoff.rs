//! Backoff policies producing wait durations between retry attempts.
//!
//! A [`Backoff`] is a small `Copy` description of a policy. Every retry
//! session asks it for a fresh [`BackoffSequence`], so growth state never
//! leaks from one retried call into the next.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use rawhttp_core::Backoff;
//!
//! let delays: Vec<Duration> = Backoff::fibonacci().sequence().take(5).collect();
//! let secs: Vec<u64> = delays.iter().map(Duration::as_secs).collect();
//! assert_eq!(secs, vec![1, 1, 2, 3, 5]);
//! ```

use std::time::Duration;

/// Unit used by [`Backoff::fibonacci`] (one second per Fibonacci step).
const FIBONACCI_UNIT: Duration = Duration::from_secs(1);

/// Index from which every Fibonacci term saturates at `u64::MAX`.
const FIBONACCI_SATURATED_INDEX: usize = 100;

/// Rule producing successive wait durations between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Always waits the same duration.
    Constant(Duration),

    /// Waits `unit * fib(n)` with `fib = 1, 1, 2, 3, 5, 8, ...`.
    Fibonacci {
        /// Duration of a single Fibonacci step.
        unit: Duration,
    },
}

impl Backoff {
    /// Creates a policy that always yields `value`.
    #[must_use]
    pub const fn constant(value: Duration) -> Self {
        Self::Constant(value)
    }

    /// Creates a policy that never waits.
    #[must_use]
    pub const fn none() -> Self {
        Self::Constant(Duration::ZERO)
    }

    /// Creates a Fibonacci policy measured in whole seconds: 1s, 1s, 2s, 3s, 5s, ...
    #[must_use]
    pub const fn fibonacci() -> Self {
        Self::Fibonacci {
            unit: FIBONACCI_UNIT,
        }
    }

    /// Creates a Fibonacci policy with a custom step unit.
    #[must_use]
    pub const fn fibonacci_with_unit(unit: Duration) -> Self {
        Self::Fibonacci { unit }
    }

    /// Starts a new, independent sequence of delays for one retry session.
    #[must_use]
    pub fn sequence(&self) -> BackoffSequence {
        BackoffSequence {
            policy: *self,
            current: 1,
            next: 1,
        }
    }

    /// Returns the delay at position `index` (0-based) without keeping state.
    ///
    /// Runs in bounded time: Fibonacci terms past a fixed index
    /// all equal the saturated value.
    #[must_use]
    pub fn duration_at(&self, index: usize) -> Duration {
        match self {
            Self::Constant(value) => *value,
            Self::Fibonacci { .. } => self
                .sequence()
                .nth(index.min(FIBONACCI_SATURATED_INDEX))
                .unwrap_or(Duration::MAX),
        }
    }
}

/// Infinite iterator of backoff delays.
///
/// Never returns `None`. Fibonacci terms saturate instead of overflowing.
#[derive(Debug, Clone)]
pub struct BackoffSequence {
    policy: Backoff,
    current: u64,
    next: u64,
}

impl Iterator for BackoffSequence {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        match self.policy {
            Backoff::Constant(value) => Some(value),
            Backoff::Fibonacci { unit } => {
                let term = self.current;
                self.current = self.next;
                self.next = term.saturating_add(self.next);
                Some(scale(unit, term))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Multiplies `unit` by `factor`, saturating at [`Duration::MAX`].
fn scale(unit: Duration, factor: u64) -> Duration {
    let nanos = unit.as_nanos().saturating_mul(u128::from(factor));
    let Ok(secs) = u64::try_from(nanos / NANOS_PER_SEC) else {
        return Duration::MAX;
    };
    let subsec = u32::try_from(nanos % NANOS_PER_SEC).unwrap_or(0);
    Duration::new(secs, subsec)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secs(backoff: Backoff, count: usize) -> Vec<u64> {
        backoff.sequence().take(count).map(|d| d.as_secs()).collect()
    }

    // ==================== Constant Tests ====================

    #[test]
    fn test_constant_zero_yields_zero() {
        assert_eq!(secs(Backoff::none(), 3), vec![0, 0, 0]);
    }

    #[test]
    fn test_constant_one_yields_one_forever() {
        assert_eq!(
            secs(Backoff::constant(Duration::from_secs(1)), 5),
            vec![1, 1, 1, 1, 1]
        );
        let mut sequence = Backoff::constant(Duration::from_millis(250)).sequence();
        for _ in 0..1000 {
            assert_eq!(sequence.next(), Some(Duration::from_millis(250)));
        }
    }

    // ==================== Fibonacci Tests ====================

    #[test]
    fn test_fibonacci_first_terms() {
        assert_eq!(secs(Backoff::fibonacci(), 7), vec![1, 1, 2, 3, 5, 8, 13]);
    }

    #[test]
    fn test_fibonacci_follows_recurrence() {
        let terms: Vec<Duration> = Backoff::fibonacci().sequence().take(60).collect();
        assert_eq!(terms[0], Duration::from_secs(1));
        assert_eq!(terms[1], Duration::from_secs(1));
        for n in 2..terms.len() {
            assert_eq!(terms[n], terms[n - 1] + terms[n - 2], "term {n}");
        }
    }

    #[test]
    fn test_fibonacci_custom_unit() {
        let backoff = Backoff::fibonacci_with_unit(Duration::from_millis(10));
        let millis: Vec<u128> = backoff.sequence().take(5).map(|d| d.as_millis()).collect();
        assert_eq!(millis, vec![10, 10, 20, 30, 50]);
    }

    #[test]
    fn test_fibonacci_saturates_instead_of_overflowing() {
        let mut sequence = Backoff::fibonacci().sequence();
        let last = sequence.nth(500).unwrap();
        assert!(last > Duration::from_secs(1));
    }

    // ==================== Restart Tests ====================

    #[test]
    fn test_sequences_are_independent() {
        let policy = Backoff::fibonacci();
        let mut first = policy.sequence();
        first.next();
        first.next();
        first.next();

        let mut second = policy.sequence();
        assert_eq!(second.next(), Some(Duration::from_secs(1)));
        assert_eq!(first.next(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_duration_at_matches_sequence() {
        let policy = Backoff::fibonacci();
        for (index, expected) in policy.sequence().take(12).enumerate() {
            assert_eq!(policy.duration_at(index), expected);
        }
        assert_eq!(
            Backoff::constant(Duration::from_secs(4)).duration_at(99),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn test_duration_at_huge_index_is_bounded() {
        let fib = Backoff::fibonacci_with_unit(Duration::from_nanos(1));
        assert_eq!(fib.duration_at(usize::MAX), fib.duration_at(FIBONACCI_SATURATED_INDEX));
        assert_eq!(fib.duration_at(usize::MAX), Duration::from_nanos(u64::MAX));

        let constant = Backoff::constant(Duration::from_secs(2));
        assert_eq!(constant.duration_at(usize::MAX), Duration::from_secs(2));
    }
}
