//! Sliding-window replay protection
//!
//! A reception state tracks the highest accepted counter `max` and a 32-bit
//! bitmap covering the counters below it. Bit `k` set means counter
//! `max - 1 - k` has been seen; `max` itself is always a duplicate.
//!
//! Initialisation (and group trust-on-first-use) marks the whole window as
//! seen, so counters at or below the first one observed are rejected rather
//! than replayable.
//!
//! Three acceptance policies share the structure:
//!
//! - [`ReceptionPolicy::EncryptedUnicast`]: counters never wrap; anything
//!   at or behind the window edge is a replay.
//! - [`ReceptionPolicy::Group`]: signed 32-bit delta comparison, so the
//!   counter may roll over; the first message from a peer is trusted and
//!   anchors the window.
//! - [`ReceptionPolicy::Unencrypted`]: like encrypted unicast, except a
//!   counter behind the window re-anchors the state (peer reboot) instead
//!   of being rejected.

use hearth_core::{Error, Result};

/// Width of the replay window in messages.
pub const WINDOW_SIZE: u32 = 32;

/// Acceptance policy for a reception state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceptionPolicy {
    /// Secure unicast session traffic; no counter rollover.
    EncryptedUnicast,
    /// Group traffic; rollover via signed delta, trust-on-first-use.
    Group,
    /// Unsecured handshake traffic; behind-window counters re-anchor.
    Unencrypted,
}

/// Per-direction replay-protection state.
#[derive(Debug, Clone)]
pub struct ReceptionState {
    policy: ReceptionPolicy,
    max: u32,
    bitmap: u32,
    synchronized: bool,
}

impl ReceptionState {
    /// A state that trusts and anchors on the first counter it sees.
    pub fn new(policy: ReceptionPolicy) -> Self {
        Self {
            policy,
            max: 0,
            bitmap: 0,
            synchronized: false,
        }
    }

    /// A state pre-anchored at `counter` (counter synchronised during
    /// session establishment). `counter` itself counts as seen.
    pub fn with_initial(policy: ReceptionPolicy, counter: u32) -> Self {
        Self {
            policy,
            max: counter,
            bitmap: u32::MAX,
            synchronized: true,
        }
    }

    /// The highest accepted counter, if any message has been accepted.
    pub fn max_seen(&self) -> Option<u32> {
        self.synchronized.then_some(self.max)
    }

    /// The policy this state was built with.
    pub fn policy(&self) -> ReceptionPolicy {
        self.policy
    }

    /// Check `counter` against the window, recording it when accepted.
    ///
    /// Returns [`Error::ReplayDetected`] for duplicates and counters the
    /// policy puts behind the window. Accepting a counter makes every later
    /// `accept` of the same value fail.
    pub fn accept(&mut self, counter: u32) -> Result<()> {
        if !self.synchronized {
            self.anchor(counter);
            return Ok(());
        }
        match self.policy {
            ReceptionPolicy::Group => self.accept_rollover(counter),
            ReceptionPolicy::EncryptedUnicast => self.accept_linear(counter, false),
            ReceptionPolicy::Unencrypted => self.accept_linear(counter, true),
        }
    }

    fn anchor(&mut self, counter: u32) {
        self.max = counter;
        self.bitmap = u32::MAX;
        self.synchronized = true;
    }

    /// Advance `max` by `shift`, keeping the old max marked as seen.
    fn advance(&mut self, counter: u32, shift: u32) {
        self.bitmap = if shift > WINDOW_SIZE {
            0
        } else if shift == WINDOW_SIZE {
            1 << (WINDOW_SIZE - 1)
        } else {
            (self.bitmap << shift) | (1 << (shift - 1))
        };
        self.max = counter;
    }

    fn check_window_bit(&mut self, offset: u32) -> Result<()> {
        let bit = 1u32 << offset;
        if self.bitmap & bit != 0 {
            return Err(Error::ReplayDetected);
        }
        self.bitmap |= bit;
        Ok(())
    }

    fn accept_linear(&mut self, counter: u32, reanchor_behind: bool) -> Result<()> {
        if counter > self.max {
            self.advance(counter, counter - self.max);
            return Ok(());
        }
        if counter == self.max {
            return Err(Error::ReplayDetected);
        }
        let distance = self.max - counter;
        if distance < WINDOW_SIZE {
            return self.check_window_bit(distance - 1);
        }
        if reanchor_behind {
            // Far behind the window on an unsecured path: the peer most
            // likely rebooted and restarted its counter.
            self.anchor(counter);
            return Ok(());
        }
        Err(Error::ReplayDetected)
    }

    fn accept_rollover(&mut self, counter: u32) -> Result<()> {
        let delta = counter.wrapping_sub(self.max) as i32;
        if delta > 0 {
            self.advance(counter, delta as u32);
            return Ok(());
        }
        if delta == 0 {
            return Err(Error::ReplayDetected);
        }
        let distance = delta.unsigned_abs();
        if distance <= WINDOW_SIZE {
            return self.check_window_bit(distance - 1);
        }
        Err(Error::ReplayDetected)
    }
}
