//! # Hearth Session - Secure Session Management
//!
//! Owns the three tables behind the node's transport security:
//!
//! - secure sessions (PASE/CASE), keyed by local session ID
//! - unsecured handshake contexts, keyed by local ephemeral node ID
//! - group-peer counter state, keyed by `(fabric index, source node ID)`
//!
//! Lookups take shared access, mutations take exclusive access; each
//! session context carries its own lock over counter, reception, and key
//! state, so independent sessions encrypt and decrypt in parallel.
//!
//! Key material is owned by the table entry that carries it and is
//! zeroised on every removal path: explicit removal, peer removal, fabric
//! teardown, and [`SessionManager::clear`].

#![forbid(unsafe_code)]

pub mod manager;
pub mod mrp;
pub mod secure;
pub mod unsecured;

pub use manager::{InboundRoute, SessionManager};
pub use mrp::MrpParameters;
pub use secure::{SecureSession, SecureSessionParams, SessionKeys, SessionKind, SessionRole};
pub use unsecured::UnsecuredSession;
