//! Unified error taxonomy for the Hearth core
//!
//! Every public operation in the core returns either a value or one of the
//! typed variants below; no panics on bad input, no stringly-typed failures.
//! Replay and decryption failures are recoverable at the message-dispatch
//! layer; counter exhaustion forces session teardown by the caller.
//!
//! [`Error::DecryptionFailed`] is deliberately coarse: a bad MIC, a wrong
//! key, and a malformed authenticated header all map to the same variant so
//! that decrypt failures leak nothing about which check tripped.

use serde::{Deserialize, Serialize};

/// Result alias used across the Hearth crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`], useful for dispatch-layer policy
/// (drop-and-continue vs. tear down vs. surface to the cluster).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Malformed or out-of-range input.
    Validation,
    /// A bounded table or counter ran out of room.
    Capacity,
    /// The operation collides with existing state.
    Conflict,
    /// A cryptographic check failed.
    Crypto,
    /// A runtime condition (replay, missing entry) was hit.
    Runtime,
}

/// Unified error type for all Hearth core operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // --- Validation ---
    /// Fabric index outside `1..=254`.
    #[error("invalid fabric index {0}")]
    InvalidFabricIndex(u8),
    /// Fabric identifier was zero.
    #[error("invalid fabric id")]
    InvalidFabricId,
    /// Node identifier outside every defined range.
    #[error("invalid node id {0:#018X}")]
    InvalidNodeId(u64),
    /// Session identifier was zero or otherwise unusable.
    #[error("invalid session id {0}")]
    InvalidSessionId(u16),
    /// Key material had the wrong length or was already destroyed.
    #[error("invalid key material")]
    InvalidKey,
    /// Auth mode not permitted in this position.
    #[error("invalid auth mode")]
    InvalidAuthMode,
    /// ACL subject not valid for its declared auth mode.
    #[error("invalid subject")]
    InvalidSubject,
    /// Cluster identifier outside the valid ranges.
    #[error("invalid cluster id {0:#010X}")]
    InvalidClusterId(u32),
    /// Endpoint identifier outside the valid range.
    #[error("invalid endpoint id {0:#06X}")]
    InvalidEndpointId(u16),
    /// Device type identifier outside the valid ranges.
    #[error("invalid device type id {0:#010X}")]
    InvalidDeviceTypeId(u32),
    /// Discriminator outside the 12-bit range.
    #[error("invalid discriminator {0}")]
    InvalidDiscriminator(u16),
    /// Operational instance name failed the strict 33-character parse.
    #[error("invalid operational instance name")]
    InvalidInstanceName,
    /// Fabric label exceeded 32 UTF-8 bytes.
    #[error("invalid fabric label")]
    InvalidLabel,
    /// A wire structure failed to parse outside the authenticated path.
    #[error("malformed message")]
    MalformedMessage,

    // --- Capacity ---
    /// The table is at its configured capacity.
    #[error("table full")]
    TableFull,
    /// No free local session identifier remains.
    #[error("session id space exhausted")]
    SessionIdExhausted,
    /// Per-fabric ACL entry cap reached.
    #[error("too many ACL entries")]
    TooManyEntries,
    /// ACL subject list exceeds the configured cap.
    #[error("too many subjects")]
    TooManySubjects,
    /// ACL target list exceeds the configured cap.
    #[error("too many targets")]
    TooManyTargets,
    /// Group peer counter table is full; the message is rejected.
    #[error("group peer table full")]
    GroupPeerTableFull,

    // --- Conflict ---
    /// Another entry already holds this fabric index.
    #[error("fabric index in use")]
    IndexInUse,
    /// An entry with the same root public key and fabric id exists.
    #[error("fabric conflict")]
    FabricConflict,
    /// Another fabric already carries this non-empty label.
    #[error("fabric label conflict")]
    LabelConflict,
    /// A session with this local session id is already registered.
    #[error("duplicate session")]
    DuplicateSession,

    // --- Crypto ---
    /// AEAD open failed: bad MIC, bad key, or malformed authenticated data.
    #[error("decryption failed")]
    DecryptionFailed,
    /// Root public key was not a 65-byte uncompressed P-256 point.
    #[error("invalid root public key")]
    InvalidRootPublicKey,
    /// Certificate chain failed structural or signature validation.
    #[error("certificate chain validation failed")]
    ChainValidationFailed,

    // --- Runtime ---
    /// Message counter already seen or behind the replay window.
    #[error("replay detected")]
    ReplayDetected,
    /// Outbound message counter reached its terminal value.
    #[error("message counter exhausted")]
    CounterExhausted,
    /// No session with the given identifier.
    #[error("session not found")]
    SessionNotFound,
    /// No fabric with the given index.
    #[error("fabric not found")]
    FabricNotFound,
    /// No stored entry at the given position.
    #[error("entry not found")]
    EntryNotFound,
}

impl Error {
    /// The broad category of this error.
    pub fn category(&self) -> ErrorCategory {
        use Error::*;
        match self {
            InvalidFabricIndex(_) | InvalidFabricId | InvalidNodeId(_) | InvalidSessionId(_)
            | InvalidKey | InvalidAuthMode | InvalidSubject | InvalidClusterId(_)
            | InvalidEndpointId(_) | InvalidDeviceTypeId(_) | InvalidDiscriminator(_)
            | InvalidInstanceName | InvalidLabel | MalformedMessage => ErrorCategory::Validation,
            TableFull | SessionIdExhausted | TooManyEntries | TooManySubjects
            | TooManyTargets | GroupPeerTableFull => ErrorCategory::Capacity,
            IndexInUse | FabricConflict | LabelConflict | DuplicateSession => {
                ErrorCategory::Conflict
            }
            DecryptionFailed | InvalidRootPublicKey | ChainValidationFailed => {
                ErrorCategory::Crypto
            }
            ReplayDetected | CounterExhausted | SessionNotFound | FabricNotFound
            | EntryNotFound => ErrorCategory::Runtime,
        }
    }

    /// True when the dispatch layer should drop the message and continue.
    pub fn is_message_recoverable(&self) -> bool {
        matches!(self, Error::DecryptionFailed | Error::ReplayDetected)
    }
}
