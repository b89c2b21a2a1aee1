//! Outbound message counters
//!
//! [`MessageCounter`] is the per-session counter: randomly initialised,
//! strictly monotonic, and exhausted before it can wrap so a session is
//! torn down rather than ever reusing a nonce. [`GlobalCounter`] serves
//! unsecured outbound messages process-wide; its receivers run the
//! rollover-tolerant reception policy, so it wraps freely.

use hearth_crypto::CryptoPrimitives;
use hearth_core::{Error, Result};
use parking_lot::Mutex;

/// Mask applied to the random initial value, leaving most of the 32-bit
/// space as headroom before exhaustion.
const COUNTER_INIT_MASK: u32 = 0x0FFF_FFFF;

/// Strictly monotonic per-session outbound counter.
#[derive(Debug, Clone)]
pub struct MessageCounter {
    next: u32,
}

impl MessageCounter {
    /// A counter starting at a fresh random value.
    pub fn initialize(crypto: &dyn CryptoPrimitives) -> Self {
        let mut bytes = [0u8; 4];
        crypto.fill_random(&mut bytes);
        Self {
            next: (u32::from_le_bytes(bytes) & COUNTER_INIT_MASK) + 1,
        }
    }

    /// A counter starting at a known value (tests, restored state).
    pub fn starting_at(value: u32) -> Self {
        Self { next: value }
    }

    /// The value the next call to [`MessageCounter::advance`] will return.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Take the next counter value.
    ///
    /// Returns [`Error::CounterExhausted`] at the end of the space; the
    /// caller must tear the session down rather than wrap.
    pub fn advance(&mut self) -> Result<u32> {
        if self.next == u32::MAX {
            return Err(Error::CounterExhausted);
        }
        let value = self.next;
        self.next += 1;
        Ok(value)
    }
}

/// Process-wide counter for unsecured outbound messages.
///
/// Randomly initialised; wraps freely. `snapshot`/`restore` let a node
/// persist the value across reboots so it never reuses a recent counter.
#[derive(Debug)]
pub struct GlobalCounter {
    value: Mutex<u32>,
}

impl GlobalCounter {
    /// A counter starting at a fresh random value.
    pub fn new(crypto: &dyn CryptoPrimitives) -> Self {
        let mut bytes = [0u8; 4];
        crypto.fill_random(&mut bytes);
        Self {
            value: Mutex::new((u32::from_le_bytes(bytes) & COUNTER_INIT_MASK) + 1),
        }
    }

    /// Take the next counter value.
    pub fn next(&self) -> u32 {
        let mut value = self.value.lock();
        let current = *value;
        *value = value.wrapping_add(1);
        current
    }

    /// The current value, for persistence.
    pub fn snapshot(&self) -> u32 {
        *self.value.lock()
    }

    /// Restore a persisted value.
    pub fn restore(&self, value: u32) {
        *self.value.lock() = value;
    }

    /// Re-randomise, used when all session state is cleared.
    pub fn reset(&self, crypto: &dyn CryptoPrimitives) {
        let mut bytes = [0u8; 4];
        crypto.fill_random(&mut bytes);
        *self.value.lock() = (u32::from_le_bytes(bytes) & COUNTER_INIT_MASK) + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_crypto::RustCryptoPrimitives;

    #[test]
    fn advance_is_strictly_monotonic() {
        let mut counter = MessageCounter::initialize(&RustCryptoPrimitives);
        let mut previous = counter.advance().unwrap();
        for _ in 0..100 {
            let value = counter.advance().unwrap();
            assert_eq!(value, previous + 1);
            previous = value;
        }
    }

    #[test]
    fn exhausts_instead_of_wrapping() {
        let mut counter = MessageCounter::starting_at(u32::MAX - 1);
        assert_eq!(counter.advance().unwrap(), u32::MAX - 1);
        assert_eq!(counter.advance(), Err(Error::CounterExhausted));
        assert_eq!(counter.advance(), Err(Error::CounterExhausted));
    }

    #[test]
    fn random_init_leaves_headroom() {
        for _ in 0..16 {
            let counter = MessageCounter::initialize(&RustCryptoPrimitives);
            assert!(counter.peek() >= 1);
            assert!(counter.peek() <= COUNTER_INIT_MASK + 1);
        }
    }

    #[test]
    fn global_counter_snapshot_restore() {
        let counter = GlobalCounter::new(&RustCryptoPrimitives);
        let snap = counter.snapshot();
        assert_eq!(counter.next(), snap);
        assert_eq!(counter.snapshot(), snap + 1);
        counter.restore(7);
        assert_eq!(counter.next(), 7);
        assert_eq!(counter.next(), 8);
    }

    #[test]
    fn global_counter_wraps() {
        let counter = GlobalCounter::new(&RustCryptoPrimitives);
        counter.restore(u32::MAX);
        assert_eq!(counter.next(), u32::MAX);
        assert_eq!(counter.next(), 0);
    }
}
