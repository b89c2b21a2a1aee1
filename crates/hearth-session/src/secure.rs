//! Secure (PASE/CASE) session contexts
//!
//! A secure session binds the handshake's key material to the codec and
//! the per-direction counter state. The outer tables hand out `Arc`s;
//! everything mutable lives behind the session's own lock, so encrypt and
//! decrypt on one session are serialised while independent sessions
//! proceed in parallel.
//!
//! PASE sessions carry fabric index 0 until `AddNOC` promotes them, and
//! always use node ID 0 in nonce construction regardless of the stored
//! node IDs.

use crate::mrp::MrpParameters;
use hearth_codec::{
    DecodedFrame, MessageCodec, MessageCounter, MessageHeader, ProtocolHeader, ReceptionPolicy,
    ReceptionState,
};
use hearth_core::{CatId, Error, FabricIndex, Result};
use hearth_crypto::{CryptoPrimitives, SharedSecret, SymmetricKey};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Maximum CASE Authenticated Tags carried by one session.
pub const MAX_SESSION_CATS: usize = 3;

/// How the session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Passcode-authenticated (commissioning).
    Pase,
    /// Certificate-authenticated (operational).
    Case,
}

/// Which side of the handshake this node played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// This node initiated the handshake.
    Initiator,
    /// This node responded.
    Responder,
}

/// Key material delivered by the handshake.
///
/// The initiator encrypts with `i2r` and decrypts with `r2i`; the
/// responder mirrors.
pub struct SessionKeys {
    /// Initiator-to-responder encryption key.
    pub i2r: SymmetricKey,
    /// Responder-to-initiator encryption key.
    pub r2i: SymmetricKey,
    /// CASE shared secret retained for session resumption.
    pub shared_secret: Option<SharedSecret>,
}

/// Everything except key material needed to construct a session.
#[derive(Debug, Clone)]
pub struct SecureSessionParams {
    /// PASE or CASE.
    pub kind: SessionKind,
    /// Initiator or responder.
    pub role: SessionRole,
    /// Local session ID; nonzero, unique in the secure table.
    pub local_session_id: u16,
    /// Peer's session ID, placed in outbound headers.
    pub peer_session_id: u16,
    /// Bound fabric; [`FabricIndex::NONE`] for unpromoted PASE.
    pub fabric_index: FabricIndex,
    /// This node's operational node ID on the fabric.
    pub local_node_id: u64,
    /// The peer's operational node ID.
    pub peer_node_id: u64,
    /// CATs from the peer's NOC, at most [`MAX_SESSION_CATS`].
    pub cats: Vec<CatId>,
    /// Resumption identifier exchanged during CASE.
    pub resumption_id: [u8; 16],
    /// Reliability parameters advertised by the peer.
    pub mrp: MrpParameters,
    /// Peer counter synchronised during establishment, if known.
    pub initial_peer_counter: Option<u32>,
}

struct SessionState {
    tx: MessageCodec,
    rx: MessageCodec,
    counter: MessageCounter,
    reception: ReceptionState,
    shared_secret: Option<SharedSecret>,
    fabric_index: FabricIndex,
    last_activity: Option<Instant>,
    last_received: Option<Instant>,
    defunct: bool,
}

/// An established PASE or CASE session.
pub struct SecureSession {
    kind: SessionKind,
    role: SessionRole,
    local_session_id: u16,
    peer_session_id: u16,
    local_node_id: u64,
    peer_node_id: u64,
    cats: Vec<CatId>,
    resumption_id: [u8; 16],
    mrp: MrpParameters,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SecureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureSession")
            .field("kind", &self.kind)
            .field("role", &self.role)
            .field("local_session_id", &self.local_session_id)
            .field("peer_session_id", &self.peer_session_id)
            .finish_non_exhaustive()
    }
}

impl SecureSession {
    /// Materialise a session from handshake output.
    pub fn new(
        crypto: Arc<dyn CryptoPrimitives>,
        params: SecureSessionParams,
        keys: SessionKeys,
    ) -> Result<Self> {
        if params.local_session_id == 0 {
            return Err(Error::InvalidSessionId(0));
        }
        if params.cats.len() > MAX_SESSION_CATS {
            return Err(Error::InvalidSubject);
        }
        let (tx_key, rx_key) = match params.role {
            SessionRole::Initiator => (keys.i2r, keys.r2i),
            SessionRole::Responder => (keys.r2i, keys.i2r),
        };
        let counter = MessageCounter::initialize(crypto.as_ref());
        let tx = MessageCodec::new(crypto.clone(), tx_key)?;
        let rx = MessageCodec::new(crypto, rx_key)?;
        let reception = match params.initial_peer_counter {
            Some(counter) => {
                ReceptionState::with_initial(ReceptionPolicy::EncryptedUnicast, counter)
            }
            None => ReceptionState::new(ReceptionPolicy::EncryptedUnicast),
        };
        Ok(Self {
            kind: params.kind,
            role: params.role,
            local_session_id: params.local_session_id,
            peer_session_id: params.peer_session_id,
            local_node_id: params.local_node_id,
            peer_node_id: params.peer_node_id,
            cats: params.cats,
            resumption_id: params.resumption_id,
            mrp: params.mrp,
            state: Mutex::new(SessionState {
                tx,
                rx,
                counter,
                reception,
                shared_secret: keys.shared_secret,
                fabric_index: params.fabric_index,
                last_activity: None,
                last_received: None,
                defunct: false,
            }),
        })
    }

    /// PASE or CASE.
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Initiator or responder.
    pub fn role(&self) -> SessionRole {
        self.role
    }

    /// The local session ID inbound messages are dispatched by.
    pub fn local_session_id(&self) -> u16 {
        self.local_session_id
    }

    /// The peer's session ID placed in outbound headers.
    pub fn peer_session_id(&self) -> u16 {
        self.peer_session_id
    }

    /// The bound fabric; [`FabricIndex::NONE`] for unpromoted PASE.
    pub fn fabric_index(&self) -> FabricIndex {
        self.state.lock().fabric_index
    }

    /// This node's operational node ID on the session's fabric.
    pub fn local_node_id(&self) -> u64 {
        self.local_node_id
    }

    /// The peer's operational node ID.
    pub fn peer_node_id(&self) -> u64 {
        self.peer_node_id
    }

    /// CATs asserted by the peer's operational certificate.
    pub fn cats(&self) -> &[CatId] {
        &self.cats
    }

    /// The CASE resumption identifier.
    pub fn resumption_id(&self) -> &[u8; 16] {
        &self.resumption_id
    }

    /// Reliability parameters for the exchange layer.
    pub fn mrp(&self) -> &MrpParameters {
        &self.mrp
    }

    /// True while a CASE shared secret is retained for resumption.
    pub fn has_shared_secret(&self) -> bool {
        self.state.lock().shared_secret.is_some()
    }

    /// Bind a promoted PASE session to its fabric (`AddNOC`).
    pub fn bind_fabric(&self, fabric_index: FabricIndex) {
        self.state.lock().fabric_index = fabric_index;
    }

    /// True if this session belongs to `fabric` and talks to `node`.
    pub fn matches_peer(&self, fabric: FabricIndex, node: u64) -> bool {
        self.peer_node_id == node && self.state.lock().fabric_index == fabric
    }

    fn nonce_source_local(&self) -> u64 {
        match self.kind {
            SessionKind::Pase => 0,
            SessionKind::Case => self.local_node_id,
        }
    }

    fn nonce_source_peer(&self) -> u64 {
        match self.kind {
            SessionKind::Pase => 0,
            SessionKind::Case => self.peer_node_id,
        }
    }

    /// Seal an outbound message, drawing the next counter value.
    ///
    /// Counter values are strictly monotonic in the order calls are
    /// serialised by the session lock; [`Error::CounterExhausted`] means
    /// the session must be torn down.
    pub fn encrypt_outgoing(
        &self,
        protocol: &ProtocolHeader,
        payload: &[u8],
        privacy: bool,
    ) -> Result<Vec<u8>> {
        let mut state = self.state.lock();
        let counter = state.counter.advance()?;
        let header = MessageHeader::secure_unicast(self.peer_session_id, counter);
        state
            .tx
            .encrypt(&header, protocol, payload, privacy, self.nonce_source_local())
    }

    /// Open an inbound message and run it through replay protection.
    ///
    /// The replay check happens only after authentication succeeds, so an
    /// attacker cannot poison the window with forged counters.
    pub fn decrypt_incoming(&self, bytes: &[u8], now: Instant) -> Result<DecodedFrame> {
        let mut state = self.state.lock();
        let frame = state.rx.decrypt(bytes, self.nonce_source_peer())?;
        state.reception.accept(frame.header.message_counter)?;
        state.last_received = Some(now);
        state.last_activity = Some(now);
        Ok(frame)
    }

    /// Record non-message peer activity (e.g. an exchange-level ack).
    pub fn mark_active(&self, now: Instant) {
        self.state.lock().last_activity = Some(now);
    }

    /// When the peer last demonstrated liveness.
    pub fn last_activity(&self) -> Option<Instant> {
        self.state.lock().last_activity
    }

    /// When a message was last authenticated on this session.
    pub fn last_received(&self) -> Option<Instant> {
        self.state.lock().last_received
    }

    /// True while the peer's last activity is within the MRP active
    /// threshold.
    pub fn is_peer_active(&self, now: Instant) -> bool {
        self.state
            .lock()
            .last_activity
            .is_some_and(|at| now.duration_since(at) < self.mrp.active_threshold)
    }

    /// Exclude this session from peer lookups; it stays decryptable until
    /// removed, which lets in-flight messages drain during a rekey.
    pub fn mark_defunct(&self) {
        self.state.lock().defunct = true;
    }

    /// True once [`SecureSession::mark_defunct`] has run.
    pub fn is_defunct(&self) -> bool {
        self.state.lock().defunct
    }

    /// Destroy all key material; the session becomes inert.
    pub fn zeroize(&self) {
        let mut state = self.state.lock();
        state.tx.zeroize_keys();
        state.rx.zeroize_keys();
        if let Some(secret) = state.shared_secret.as_mut() {
            secret.destroy();
        }
        state.shared_secret = None;
        state.defunct = true;
    }

    /// True once every key byte has been destroyed.
    pub fn is_zeroised(&self) -> bool {
        let state = self.state.lock();
        state.tx.is_zeroised() && state.rx.is_zeroised() && state.shared_secret.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_crypto::RustCryptoPrimitives;
    use std::time::Duration;

    fn test_params(kind: SessionKind, role: SessionRole) -> SecureSessionParams {
        SecureSessionParams {
            kind,
            role,
            local_session_id: 1,
            peer_session_id: 2,
            fabric_index: FabricIndex::new(1).unwrap(),
            local_node_id: 0x1111,
            peer_node_id: 0x2222,
            cats: Vec::new(),
            resumption_id: [0xAB; 16],
            mrp: MrpParameters::default(),
            initial_peer_counter: None,
        }
    }

    fn test_keys() -> SessionKeys {
        SessionKeys {
            i2r: SymmetricKey::new([0x11; 16]),
            r2i: SymmetricKey::new([0x22; 16]),
            shared_secret: Some(SharedSecret::new(vec![0x33; 32])),
        }
    }

    fn session_pair() -> (SecureSession, SecureSession) {
        let crypto: Arc<dyn CryptoPrimitives> = Arc::new(RustCryptoPrimitives);
        let mut responder_params = test_params(SessionKind::Case, SessionRole::Responder);
        responder_params.local_session_id = 2;
        responder_params.peer_session_id = 1;
        std::mem::swap(
            &mut responder_params.local_node_id,
            &mut responder_params.peer_node_id,
        );
        let initiator = SecureSession::new(
            crypto.clone(),
            test_params(SessionKind::Case, SessionRole::Initiator),
            test_keys(),
        )
        .unwrap();
        let responder = SecureSession::new(crypto, responder_params, test_keys()).unwrap();
        (initiator, responder)
    }

    #[test]
    fn initiator_to_responder_round_trip() {
        let (initiator, responder) = session_pair();
        let protocol = ProtocolHeader {
            opcode: 0x08,
            ..ProtocolHeader::default()
        };
        let wire = initiator.encrypt_outgoing(&protocol, b"report", false).unwrap();
        let frame = responder.decrypt_incoming(&wire, Instant::now()).unwrap();
        assert_eq!(frame.payload, b"report");
        assert_eq!(frame.header.session_id, 2);
    }

    #[test]
    fn responder_to_initiator_round_trip() {
        let (initiator, responder) = session_pair();
        let wire = responder
            .encrypt_outgoing(&ProtocolHeader::default(), b"ack", true)
            .unwrap();
        let frame = initiator.decrypt_incoming(&wire, Instant::now()).unwrap();
        assert_eq!(frame.payload, b"ack");
        assert!(frame.header.privacy);
    }

    #[test]
    fn replayed_frame_is_rejected_once_accepted() {
        let (initiator, responder) = session_pair();
        let wire = initiator
            .encrypt_outgoing(&ProtocolHeader::default(), b"x", false)
            .unwrap();
        assert!(responder.decrypt_incoming(&wire, Instant::now()).is_ok());
        assert_eq!(
            responder.decrypt_incoming(&wire, Instant::now()),
            Err(Error::ReplayDetected)
        );
    }

    #[test]
    fn outbound_counters_are_strictly_monotonic() {
        let (initiator, _) = session_pair();
        let mut last = None;
        for _ in 0..10 {
            let wire = initiator
                .encrypt_outgoing(&ProtocolHeader::default(), b"", false)
                .unwrap();
            let counter = u32::from_le_bytes(wire[4..8].try_into().unwrap());
            if let Some(previous) = last {
                assert_eq!(counter, previous + 1);
            }
            last = Some(counter);
        }
    }

    #[test]
    fn pase_forces_zero_nonce_node_ids() {
        let crypto: Arc<dyn CryptoPrimitives> = Arc::new(RustCryptoPrimitives);
        let mut params = test_params(SessionKind::Pase, SessionRole::Initiator);
        params.fabric_index = FabricIndex::NONE;
        let pase = SecureSession::new(crypto.clone(), params, test_keys()).unwrap();
        assert_eq!(pase.nonce_source_local(), 0);
        assert_eq!(pase.nonce_source_peer(), 0);
        let case = SecureSession::new(
            crypto,
            test_params(SessionKind::Case, SessionRole::Initiator),
            test_keys(),
        )
        .unwrap();
        assert_eq!(case.nonce_source_local(), 0x1111);
        assert_eq!(case.nonce_source_peer(), 0x2222);
    }

    #[test]
    fn pase_promotion_binds_fabric() {
        let crypto: Arc<dyn CryptoPrimitives> = Arc::new(RustCryptoPrimitives);
        let mut params = test_params(SessionKind::Pase, SessionRole::Responder);
        params.fabric_index = FabricIndex::NONE;
        let session = SecureSession::new(crypto, params, test_keys()).unwrap();
        assert!(session.fabric_index().is_none());
        session.bind_fabric(FabricIndex::new(3).unwrap());
        assert_eq!(session.fabric_index(), FabricIndex::new(3).unwrap());
    }

    #[test]
    fn rejects_session_id_zero_and_too_many_cats() {
        let crypto: Arc<dyn CryptoPrimitives> = Arc::new(RustCryptoPrimitives);
        let mut params = test_params(SessionKind::Case, SessionRole::Initiator);
        params.local_session_id = 0;
        assert_matches::assert_matches!(
            SecureSession::new(crypto.clone(), params, test_keys()),
            Err(Error::InvalidSessionId(0))
        );
        let mut params = test_params(SessionKind::Case, SessionRole::Initiator);
        params.cats = (1..=4).map(|v| CatId::new(1, v).unwrap()).collect();
        assert_matches::assert_matches!(
            SecureSession::new(crypto, params, test_keys()),
            Err(Error::InvalidSubject)
        );
    }

    #[test]
    fn zeroize_makes_session_inert() {
        let (initiator, _) = session_pair();
        assert!(initiator.has_shared_secret());
        initiator.zeroize();
        assert!(initiator.is_zeroised());
        assert!(!initiator.has_shared_secret());
        assert_eq!(
            initiator.encrypt_outgoing(&ProtocolHeader::default(), b"", false),
            Err(Error::InvalidKey)
        );
    }

    #[test]
    fn peer_activity_tracks_threshold() {
        let (initiator, _) = session_pair();
        let t0 = Instant::now();
        assert!(!initiator.is_peer_active(t0));
        initiator.mark_active(t0);
        assert!(initiator.is_peer_active(t0 + Duration::from_secs(3)));
        assert!(!initiator.is_peer_active(t0 + Duration::from_secs(5)));
    }
}
