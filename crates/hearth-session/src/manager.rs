//! The session manager
//!
//! Owns the secure-session table, the unsecured-context table, and the
//! group-peer counter table. Tables are reader/writer locked; session
//! contexts serialise their own mutable state, so table locks are held
//! only for lookup and structural mutation, never across crypto.

use crate::secure::{SecureSession, SecureSessionParams, SessionKeys};
use crate::unsecured::UnsecuredSession;
use hearth_codec::{GlobalCounter, MessageHeader, ReceptionPolicy, ReceptionState, SessionType};
use hearth_core::config::SessionTableConfig;
use hearth_core::{Error, FabricIndex, NodeId, Result};
use hearth_crypto::CryptoPrimitives;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Where an inbound datagram should be handed after header inspection.
#[derive(Debug)]
pub enum InboundRoute {
    /// Session ID 0: handshake traffic for the unsecured path.
    ///
    /// Carries the source ephemeral node ID when the header has one, so
    /// the caller can find or create the responder context.
    Unsecured {
        /// Source ephemeral node ID from the header, if present.
        source_node_id: Option<u64>,
    },
    /// A registered secure unicast session.
    SecureUnicast(Arc<SecureSession>),
    /// A group message; counter checking goes through
    /// [`SessionManager::check_group_counter`] after group decryption.
    Group {
        /// The group session ID from the header.
        session_id: u16,
        /// The sending node.
        source_node_id: u64,
        /// The message counter, for the post-decryption replay check.
        message_counter: u32,
    },
}

/// The tables of active sessions and per-peer group counter state.
pub struct SessionManager {
    crypto: Arc<dyn CryptoPrimitives>,
    config: SessionTableConfig,
    secure: RwLock<BTreeMap<u16, Arc<SecureSession>>>,
    next_session_id: Mutex<u16>,
    unsecured: RwLock<BTreeMap<u64, Arc<UnsecuredSession>>>,
    group_peers: RwLock<BTreeMap<(u8, u64), Mutex<ReceptionState>>>,
    global_counter: GlobalCounter,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("secure", &self.secure.read().len())
            .field("unsecured", &self.unsecured.read().len())
            .field("group_peers", &self.group_peers.read().len())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// An empty manager over the given primitives and capacities.
    pub fn new(crypto: Arc<dyn CryptoPrimitives>, config: SessionTableConfig) -> Self {
        let global_counter = GlobalCounter::new(crypto.as_ref());
        Self {
            crypto,
            config,
            secure: RwLock::new(BTreeMap::new()),
            next_session_id: Mutex::new(1),
            unsecured: RwLock::new(BTreeMap::new()),
            group_peers: RwLock::new(BTreeMap::new()),
            global_counter,
        }
    }

    // --- secure sessions ---

    /// Pick an unused local session ID without reserving it.
    ///
    /// IDs are scanned from a rolling cursor; 0 is never returned. Fails
    /// with [`Error::TableFull`] at capacity so the caller can decide
    /// whether to evict. Allocation and [`SessionManager::add_secure`] are
    /// separate so a failed handshake does not burn an ID.
    pub fn allocate_session_id(&self) -> Result<u16> {
        let secure = self.secure.read();
        if secure.len() >= self.config.max_sessions {
            return Err(Error::TableFull);
        }
        let mut cursor = self.next_session_id.lock();
        for _ in 0..u16::MAX {
            let candidate = *cursor;
            *cursor = if *cursor == u16::MAX { 1 } else { *cursor + 1 };
            if !secure.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(Error::SessionIdExhausted)
    }

    /// Construct a secure session from handshake output and register it.
    pub fn add_secure(
        &self,
        params: SecureSessionParams,
        keys: SessionKeys,
    ) -> Result<Arc<SecureSession>> {
        let session = Arc::new(SecureSession::new(self.crypto.clone(), params, keys)?);
        self.insert_secure(session.clone())?;
        Ok(session)
    }

    /// Register an already-constructed secure session.
    pub fn insert_secure(&self, session: Arc<SecureSession>) -> Result<()> {
        let mut secure = self.secure.write();
        if secure.len() >= self.config.max_sessions {
            return Err(Error::TableFull);
        }
        let id = session.local_session_id();
        if secure.contains_key(&id) {
            return Err(Error::DuplicateSession);
        }
        debug!(session_id = id, "secure session added");
        secure.insert(id, session);
        Ok(())
    }

    /// Look up a secure session by local session ID.
    pub fn find_secure(&self, local_session_id: u16) -> Option<Arc<SecureSession>> {
        self.secure.read().get(&local_session_id).cloned()
    }

    /// All non-defunct sessions bound to `fabric` and peering with `node`.
    ///
    /// More than one match is normal during a rekey.
    pub fn find_by_peer(&self, fabric: FabricIndex, node: u64) -> Vec<Arc<SecureSession>> {
        self.secure
            .read()
            .values()
            .filter(|s| s.matches_peer(fabric, node) && !s.is_defunct())
            .cloned()
            .collect()
    }

    /// All sessions bound to `fabric`, defunct ones included.
    pub fn find_by_fabric(&self, fabric: FabricIndex) -> Vec<Arc<SecureSession>> {
        self.secure
            .read()
            .values()
            .filter(|s| s.fabric_index() == fabric)
            .cloned()
            .collect()
    }

    /// Look up a CASE session by its resumption identifier.
    pub fn find_by_resumption_id(&self, resumption_id: &[u8; 16]) -> Option<Arc<SecureSession>> {
        self.secure
            .read()
            .values()
            .find(|s| s.resumption_id() == resumption_id)
            .cloned()
    }

    /// Visit every secure session.
    pub fn for_each_secure(&self, mut f: impl FnMut(&Arc<SecureSession>)) {
        for session in self.secure.read().values() {
            f(session);
        }
    }

    /// Remove a secure session, zeroising its keys.
    ///
    /// The returned context is inert: its key bytes are all-zero and its
    /// codecs refuse to operate.
    pub fn remove_secure(&self, local_session_id: u16) -> Result<Arc<SecureSession>> {
        let session = self
            .secure
            .write()
            .remove(&local_session_id)
            .ok_or(Error::SessionNotFound)?;
        session.zeroize();
        debug!(session_id = local_session_id, "secure session removed");
        Ok(session)
    }

    /// Tear down everything bound to a fabric: all its secure sessions
    /// (zeroised) and all its group-peer counter state.
    pub fn remove_fabric(&self, fabric: FabricIndex) {
        let removed: Vec<Arc<SecureSession>> = {
            let mut secure = self.secure.write();
            let ids: Vec<u16> = secure
                .iter()
                .filter(|(_, s)| s.fabric_index() == fabric)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| secure.remove(id)).collect()
        };
        for session in &removed {
            session.zeroize();
        }
        self.group_peers
            .write()
            .retain(|(peer_fabric, _), _| *peer_fabric != fabric.get());
        debug!(%fabric, sessions = removed.len(), "fabric sessions torn down");
    }

    /// Tear down all sessions with one peer and drop its group counter
    /// entry.
    pub fn remove_peer(&self, fabric: FabricIndex, node: u64) {
        let removed: Vec<Arc<SecureSession>> = {
            let mut secure = self.secure.write();
            let ids: Vec<u16> = secure
                .iter()
                .filter(|(_, s)| s.matches_peer(fabric, node))
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| secure.remove(id)).collect()
        };
        for session in &removed {
            session.zeroize();
        }
        self.group_peers.write().remove(&(fabric.get(), node));
    }

    /// Zeroise and drop every session and counter state, and re-randomise
    /// the global counter.
    pub fn clear(&self) {
        let sessions: Vec<Arc<SecureSession>> = {
            let mut secure = self.secure.write();
            std::mem::take(&mut *secure).into_values().collect()
        };
        for session in &sessions {
            session.zeroize();
        }
        self.unsecured.write().clear();
        self.group_peers.write().clear();
        self.global_counter.reset(self.crypto.as_ref());
    }

    // --- unsecured contexts ---

    fn random_ephemeral_node_id(&self, taken: &BTreeMap<u64, Arc<UnsecuredSession>>) -> u64 {
        loop {
            let mut bytes = [0u8; 8];
            self.crypto.fill_random(&mut bytes);
            let candidate = u64::from_le_bytes(bytes);
            if NodeId::raw_is_operational(candidate) && !taken.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Create an initiator handshake context with a fresh ephemeral ID.
    pub fn create_unsecured_initiator(&self) -> Arc<UnsecuredSession> {
        let mut unsecured = self.unsecured.write();
        let local = self.random_ephemeral_node_id(&unsecured);
        let session = Arc::new(UnsecuredSession::new_initiator(local));
        unsecured.insert(local, session.clone());
        session
    }

    /// Find the responder context for a peer's ephemeral ID, creating one
    /// with a fresh local ephemeral ID if none exists.
    pub fn find_or_create_unsecured_responder(
        &self,
        peer_ephemeral_node_id: u64,
    ) -> Arc<UnsecuredSession> {
        let mut unsecured = self.unsecured.write();
        if let Some(existing) = unsecured
            .values()
            .find(|s| s.peer_ephemeral_node_id() == Some(peer_ephemeral_node_id))
        {
            return existing.clone();
        }
        let local = self.random_ephemeral_node_id(&unsecured);
        let session = Arc::new(UnsecuredSession::new_responder(
            local,
            peer_ephemeral_node_id,
        ));
        unsecured.insert(local, session.clone());
        session
    }

    /// Look up an unsecured context by this node's ephemeral ID.
    pub fn find_unsecured(&self, local_ephemeral_node_id: u64) -> Option<Arc<UnsecuredSession>> {
        self.unsecured.read().get(&local_ephemeral_node_id).cloned()
    }

    /// Drop an unsecured context once its handshake completes or fails.
    pub fn remove_unsecured(&self, local_ephemeral_node_id: u64) -> Result<()> {
        self.unsecured
            .write()
            .remove(&local_ephemeral_node_id)
            .map(|_| ())
            .ok_or(Error::SessionNotFound)
    }

    // --- group peers ---

    /// Run a group message counter through the peer's replay window.
    ///
    /// The first message from an unknown peer is trusted and anchors its
    /// window, provided the peer table has room; a full table rejects the
    /// message with [`Error::GroupPeerTableFull`] rather than evicting.
    pub fn check_group_counter(
        &self,
        fabric: FabricIndex,
        source_node_id: u64,
        counter: u32,
    ) -> Result<()> {
        let key = (fabric.get(), source_node_id);
        {
            let peers = self.group_peers.read();
            if let Some(state) = peers.get(&key) {
                return state.lock().accept(counter);
            }
        }
        let mut peers = self.group_peers.write();
        if let Some(state) = peers.get(&key) {
            // Another thread inserted the peer between our locks.
            return state.lock().accept(counter);
        }
        if peers.len() >= self.config.max_group_peers {
            return Err(Error::GroupPeerTableFull);
        }
        let mut state = ReceptionState::new(ReceptionPolicy::Group);
        state.accept(counter)?;
        peers.insert(key, Mutex::new(state));
        Ok(())
    }

    /// Classify an inbound datagram by its cleartext header.
    ///
    /// Group messages and messages on unknown secure sessions carry
    /// obfuscatable fields, so only the always-clear prefix (flags,
    /// session ID, security flags) is trusted here; everything else is
    /// confirmed after authentication.
    pub fn route_inbound(&self, datagram: &[u8]) -> Result<InboundRoute> {
        let (header, _) = MessageHeader::decode(datagram)?;
        match header.session_type {
            SessionType::Group => Ok(InboundRoute::Group {
                session_id: header.session_id,
                source_node_id: header.source_node_id.ok_or(Error::MalformedMessage)?,
                message_counter: header.message_counter,
            }),
            SessionType::Unicast if header.session_id == 0 => Ok(InboundRoute::Unsecured {
                source_node_id: header.source_node_id,
            }),
            SessionType::Unicast => self
                .find_secure(header.session_id)
                .map(InboundRoute::SecureUnicast)
                .ok_or(Error::SessionNotFound),
        }
    }

    // --- global counter ---

    /// Next counter value for an unsecured outbound message.
    pub fn global_counter_next(&self) -> u32 {
        self.global_counter.next()
    }

    /// Current global counter value, for persistence.
    pub fn global_counter_snapshot(&self) -> u32 {
        self.global_counter.snapshot()
    }

    /// Restore a persisted global counter value.
    pub fn global_counter_restore(&self, value: u32) {
        self.global_counter.restore(value);
    }

    /// Number of registered secure sessions.
    pub fn secure_session_count(&self) -> usize {
        self.secure.read().len()
    }
}
