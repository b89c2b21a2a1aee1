//! Message Reliability Protocol parameters
//!
//! Carried in every session context and consumed by the exchange layer's
//! retransmission timers; the core itself only reads `active_threshold`
//! for the peer-activity predicate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retransmission intervals and the peer-activity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrpParameters {
    /// Retransmission interval while the peer is believed idle.
    pub idle_interval: Duration,
    /// Retransmission interval while the peer is believed active.
    pub active_interval: Duration,
    /// How long after its last activity a peer still counts as active.
    pub active_threshold: Duration,
}

impl Default for MrpParameters {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_millis(500),
            active_interval: Duration::from_millis(300),
            active_threshold: Duration::from_secs(4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_values() {
        let mrp = MrpParameters::default();
        assert_eq!(mrp.idle_interval, Duration::from_millis(500));
        assert_eq!(mrp.active_interval, Duration::from_millis(300));
        assert_eq!(mrp.active_threshold, Duration::from_secs(4));
    }

    #[test]
    fn serde_round_trip() {
        let mrp = MrpParameters {
            idle_interval: Duration::from_millis(800),
            ..MrpParameters::default()
        };
        let json = serde_json::to_string(&mrp).unwrap();
        assert_eq!(serde_json::from_str::<MrpParameters>(&json).unwrap(), mrp);
    }
}
