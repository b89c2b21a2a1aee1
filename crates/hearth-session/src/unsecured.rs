//! Unsecured handshake contexts
//!
//! Session ID 0 traffic (PASE/CASE establishment) runs over these. There
//! is no key material; the context exists to pin an ephemeral node-ID pair
//! and to apply the relaxed replay policy that tolerates a rebooted peer.

use crate::mrp::MrpParameters;
use crate::secure::SessionRole;
use hearth_codec::{ReceptionPolicy, ReceptionState};
use hearth_core::Result;
use parking_lot::Mutex;

/// A handshake context keyed by this node's ephemeral node ID.
#[derive(Debug)]
pub struct UnsecuredSession {
    role: SessionRole,
    local_ephemeral_node_id: u64,
    peer_ephemeral_node_id: Mutex<Option<u64>>,
    reception: Mutex<ReceptionState>,
    mrp: MrpParameters,
}

impl UnsecuredSession {
    /// Context for a handshake this node initiates; the peer's ephemeral
    /// ID is learned from its first response.
    pub fn new_initiator(local_ephemeral_node_id: u64) -> Self {
        Self {
            role: SessionRole::Initiator,
            local_ephemeral_node_id,
            peer_ephemeral_node_id: Mutex::new(None),
            reception: Mutex::new(ReceptionState::new(ReceptionPolicy::Unencrypted)),
            mrp: MrpParameters::default(),
        }
    }

    /// Context for a handshake a peer initiated.
    pub fn new_responder(local_ephemeral_node_id: u64, peer_ephemeral_node_id: u64) -> Self {
        Self {
            role: SessionRole::Responder,
            local_ephemeral_node_id,
            peer_ephemeral_node_id: Mutex::new(Some(peer_ephemeral_node_id)),
            reception: Mutex::new(ReceptionState::new(ReceptionPolicy::Unencrypted)),
            mrp: MrpParameters::default(),
        }
    }

    /// Initiator or responder.
    pub fn role(&self) -> SessionRole {
        self.role
    }

    /// This node's ephemeral node ID (the table key).
    pub fn local_ephemeral_node_id(&self) -> u64 {
        self.local_ephemeral_node_id
    }

    /// The peer's ephemeral node ID, once known.
    pub fn peer_ephemeral_node_id(&self) -> Option<u64> {
        *self.peer_ephemeral_node_id.lock()
    }

    /// Record the peer's ephemeral node ID from its first message.
    pub fn set_peer_ephemeral_node_id(&self, id: u64) {
        *self.peer_ephemeral_node_id.lock() = Some(id);
    }

    /// Run an inbound counter through the relaxed replay policy.
    pub fn accept_counter(&self, counter: u32) -> Result<()> {
        self.reception.lock().accept(counter)
    }

    /// Reliability parameters for the exchange layer.
    pub fn mrp(&self) -> &MrpParameters {
        &self.mrp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::Error;

    #[test]
    fn responder_knows_peer_immediately() {
        let session = UnsecuredSession::new_responder(10, 20);
        assert_eq!(session.role(), SessionRole::Responder);
        assert_eq!(session.peer_ephemeral_node_id(), Some(20));
    }

    #[test]
    fn initiator_learns_peer_later() {
        let session = UnsecuredSession::new_initiator(10);
        assert_eq!(session.peer_ephemeral_node_id(), None);
        session.set_peer_ephemeral_node_id(42);
        assert_eq!(session.peer_ephemeral_node_id(), Some(42));
    }

    #[test]
    fn duplicate_handshake_counters_are_rejected() {
        let session = UnsecuredSession::new_initiator(10);
        assert!(session.accept_counter(5).is_ok());
        assert_eq!(session.accept_counter(5), Err(Error::ReplayDetected));
        assert!(session.accept_counter(6).is_ok());
    }

    #[test]
    fn rebooted_peer_counter_is_accepted() {
        let session = UnsecuredSession::new_initiator(10);
        assert!(session.accept_counter(1_000_000).is_ok());
        assert!(session.accept_counter(3).is_ok());
    }
}
