//! Send sequence counter

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, LazyLock};

use super::MAX_SEQ_NUMBER;

static GLOBAL: LazyLock<Arc<SequenceCounter>> = LazyLock::new(|| Arc::new(SequenceCounter::new()));

/// Counter stamping `snd_seq` on every emitted packet, wrapping at 2^24.
///
/// Each call to [`next`](Self::next) is one atomic increment, so concurrent
/// packers sharing a counter never hand out the same value twice within a
/// 2^24 window.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    value: AtomicU32,
}

impl SequenceCounter {
    /// Create a counter starting at 0
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a counter whose first value is `start` (mod 2^24)
    #[must_use]
    pub const fn starting_at(start: u32) -> Self {
        Self {
            value: AtomicU32::new(start % MAX_SEQ_NUMBER),
        }
    }

    /// The process-wide counter shared by [`Packer::default`](super::Packer)
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Return the current value and advance by one, modulo 2^24.
    ///
    /// 2^32 is a multiple of 2^24, so reducing the wrapping `u32` increment
    /// yields the same sequence as a counter that wraps at 2^24 itself.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> u32 {
        self.value.fetch_add(1, Ordering::Relaxed) % MAX_SEQ_NUMBER
    }

    /// The value the next call to [`next`](Self::next) will return
    #[must_use]
    pub fn peek(&self) -> u32 {
        self.value.load(Ordering::Relaxed) % MAX_SEQ_NUMBER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_starts_at_zero() {
        let counter = SequenceCounter::new();
        assert_eq!(counter.next(), 0);
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.peek(), 2);
    }

    #[test]
    fn test_wraps_at_2_pow_24() {
        let counter = SequenceCounter::starting_at(MAX_SEQ_NUMBER - 2);
        assert_eq!(counter.next(), MAX_SEQ_NUMBER - 2);
        assert_eq!(counter.next(), MAX_SEQ_NUMBER - 1);
        assert_eq!(counter.next(), 0);
        assert_eq!(counter.next(), 1);
    }

    #[test]
    fn test_full_cycle_returns_to_zero() {
        let counter = SequenceCounter::new();
        for _ in 0..MAX_SEQ_NUMBER {
            counter.next();
        }
        assert_eq!(counter.next(), 0);
    }

    #[test]
    fn test_wraps_across_u32_overflow() {
        let counter = SequenceCounter {
            value: AtomicU32::new(u32::MAX),
        };
        assert_eq!(counter.next(), MAX_SEQ_NUMBER - 1);
        assert_eq!(counter.next(), 0);
    }

    #[test]
    fn test_concurrent_values_are_unique() {
        let counter = Arc::new(SequenceCounter::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || (0..1000).map(|_| counter.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "duplicate sequence number {value}");
            }
        }
        assert_eq!(seen.len(), 8000);
        assert_eq!(counter.peek(), 8000);
    }
}
