//! Core identifier types for the Hearth node
//!
//! Matter identifiers are numeric ranges carved out of fixed-width integers.
//! This module gives each range its own type so that the rest of the core can
//! rely on the type system instead of re-validating raw integers at every
//! call site.
//!
//! The 64-bit node identifier space is partitioned as follows:
//!
//! | Range                                         | Variant       |
//! |-----------------------------------------------|---------------|
//! | `0x0000_0000_0000_0001..=0xFFFF_FFEF_FFFF_FFFF` | operational |
//! | `0xFFFF_FFFB_0000_0000..=0xFFFF_FFFB_0000_FFFF` | PASE key slot |
//! | `0xFFFF_FFFD_0000_0000..=0xFFFF_FFFD_FFFF_FFFF` | CAT           |
//! | `0xFFFF_FFFF_FFFF_0000..=0xFFFF_FFFF_FFFF_FFFF` | group         |
//!
//! Everything else (including zero) is invalid.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// First valid operational node ID.
pub const OPERATIONAL_NODE_ID_MIN: u64 = 0x0000_0000_0000_0001;
/// Last valid operational node ID.
pub const OPERATIONAL_NODE_ID_MAX: u64 = 0xFFFF_FFEF_FFFF_FFFF;
/// First node ID reserved for PASE (PAKE) key slots.
pub const PAKE_NODE_ID_MIN: u64 = 0xFFFF_FFFB_0000_0000;
/// Last node ID reserved for PASE (PAKE) key slots.
pub const PAKE_NODE_ID_MAX: u64 = 0xFFFF_FFFB_0000_FFFF;
/// First node ID reserved for CASE Authenticated Tags.
pub const CAT_NODE_ID_MIN: u64 = 0xFFFF_FFFD_0000_0000;
/// Last node ID reserved for CASE Authenticated Tags.
pub const CAT_NODE_ID_MAX: u64 = 0xFFFF_FFFD_FFFF_FFFF;
/// First node ID reserved for group messaging.
pub const GROUP_NODE_ID_MIN: u64 = 0xFFFF_FFFF_FFFF_0000;

/// A 64-bit node identifier, discriminated by numeric range.
///
/// `NodeId` is the parsed form; the raw wire value is recovered with
/// [`NodeId::to_raw`] and classified with [`NodeId::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// A per-fabric operational node.
    Operational(u64),
    /// A commissioning-time PASE key slot.
    Pase(u16),
    /// A CASE Authenticated Tag claim.
    Cat(CatId),
    /// A group identifier.
    Group(GroupId),
}

impl NodeId {
    /// Classify a raw 64-bit value into its node-ID variant.
    ///
    /// Returns [`Error::InvalidNodeId`] for values outside every defined
    /// range (notably zero and the reserved gaps between ranges). A CAT
    /// node ID with version 0 is also invalid.
    pub fn from_raw(raw: u64) -> Result<Self> {
        match raw {
            OPERATIONAL_NODE_ID_MIN..=OPERATIONAL_NODE_ID_MAX => Ok(NodeId::Operational(raw)),
            PAKE_NODE_ID_MIN..=PAKE_NODE_ID_MAX => Ok(NodeId::Pase((raw & 0xFFFF) as u16)),
            CAT_NODE_ID_MIN..=CAT_NODE_ID_MAX => {
                let cat = CatId::new((raw >> 16 & 0xFFFF) as u16, (raw & 0xFFFF) as u16)?;
                Ok(NodeId::Cat(cat))
            }
            GROUP_NODE_ID_MIN..=u64::MAX => Ok(NodeId::Group(GroupId((raw & 0xFFFF) as u16))),
            _ => Err(Error::InvalidNodeId(raw)),
        }
    }

    /// Recover the raw 64-bit wire value.
    pub fn to_raw(self) -> u64 {
        match self {
            NodeId::Operational(id) => id,
            NodeId::Pase(slot) => PAKE_NODE_ID_MIN | u64::from(slot),
            NodeId::Cat(cat) => cat.node_id_raw(),
            NodeId::Group(group) => GROUP_NODE_ID_MIN | u64::from(group.0),
        }
    }

    /// True for operational node IDs.
    pub fn is_operational(self) -> bool {
        matches!(self, NodeId::Operational(_))
    }

    /// True for group node IDs.
    pub fn is_group(self) -> bool {
        matches!(self, NodeId::Group(_))
    }

    /// True for CAT node IDs.
    pub fn is_cat(self) -> bool {
        matches!(self, NodeId::Cat(_))
    }

    /// The CAT claim carried by a CAT node ID, if any.
    pub fn as_cat(self) -> Option<CatId> {
        match self {
            NodeId::Cat(cat) => Some(cat),
            _ => None,
        }
    }

    /// True if `raw` falls in the operational range.
    pub fn raw_is_operational(raw: u64) -> bool {
        (OPERATIONAL_NODE_ID_MIN..=OPERATIONAL_NODE_ID_MAX).contains(&raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Operational(id) => write!(f, "node-{id:016X}"),
            NodeId::Pase(slot) => write!(f, "pase-{slot}"),
            NodeId::Cat(cat) => write!(f, "{cat}"),
            NodeId::Group(group) => write!(f, "{group}"),
        }
    }
}

/// A CASE Authenticated Tag: a 32-bit `(identifier, version)` claim.
///
/// The version must be at least 1; version 0 marks an unused slot in a
/// certificate and never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatId {
    identifier: u16,
    version: u16,
}

impl CatId {
    /// Create a CAT claim, rejecting version 0.
    pub fn new(identifier: u16, version: u16) -> Result<Self> {
        if version == 0 {
            return Err(Error::InvalidSubject);
        }
        Ok(Self {
            identifier,
            version,
        })
    }

    /// The 16-bit tag identifier.
    pub fn identifier(self) -> u16 {
        self.identifier
    }

    /// The 16-bit tag version (always ≥ 1).
    pub fn version(self) -> u16 {
        self.version
    }

    /// The combined 32-bit wire value `identifier << 16 | version`.
    pub fn to_u32(self) -> u32 {
        u32::from(self.identifier) << 16 | u32::from(self.version)
    }

    /// Parse the combined 32-bit wire value.
    pub fn from_u32(value: u32) -> Result<Self> {
        Self::new((value >> 16) as u16, (value & 0xFFFF) as u16)
    }

    /// The raw node ID embedding this claim.
    pub fn node_id_raw(self) -> u64 {
        CAT_NODE_ID_MIN | u64::from(self.to_u32())
    }

    /// True when this claim is satisfied by a held tag: identical
    /// identifier and a held version at least as new as `self.version`.
    pub fn accepts(self, held: CatId) -> bool {
        self.identifier == held.identifier && held.version >= self.version
    }
}

impl fmt::Display for CatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cat-{:04X}:{:04X}", self.identifier, self.version)
    }
}

/// A local one-byte fabric handle, valid in `1..=254`.
///
/// The value 0 is the "no fabric" sentinel carried by PASE sessions before
/// `AddNOC` promotes them; it is constructed with [`FabricIndex::NONE`] and
/// rejected by [`FabricIndex::new`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct FabricIndex(u8);

impl FabricIndex {
    /// Lowest assignable fabric index.
    pub const MIN: u8 = 1;
    /// Highest assignable fabric index.
    pub const MAX: u8 = 254;
    /// The "no fabric" sentinel.
    pub const NONE: FabricIndex = FabricIndex(0);

    /// Create a fabric index, rejecting 0 and 255.
    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidFabricIndex(value))
        }
    }

    /// The raw handle value.
    pub fn get(self) -> u8 {
        self.0
    }

    /// True for the "no fabric" sentinel.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FabricIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fabric-{}", self.0)
    }
}

/// A 64-bit fabric identifier; zero is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FabricId(u64);

impl FabricId {
    /// Create a fabric identifier, rejecting zero.
    pub fn new(value: u64) -> Result<Self> {
        if value == 0 {
            return Err(Error::InvalidFabricId);
        }
        Ok(Self(value))
    }

    /// The raw 64-bit value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// The big-endian byte representation, used as HKDF salt when deriving
    /// the compressed fabric identifier.
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for FabricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// A 16-bit vendor identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct VendorId(pub u16);

impl VendorId {
    /// The raw 16-bit value.
    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vendor-{}", self.0)
    }
}

/// A 16-bit group identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct GroupId(pub u16);

impl GroupId {
    /// The raw 16-bit value.
    pub fn get(self) -> u16 {
        self.0
    }

    /// The raw node ID embedding this group.
    pub fn node_id_raw(self) -> u64 {
        GROUP_NODE_ID_MIN | u64::from(self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{:04X}", self.0)
    }
}

/// The 8-byte HKDF-derived fabric identifier used in DNS-SD discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompressedFabricId([u8; 8]);

impl CompressedFabricId {
    /// Wrap derived bytes.
    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// The raw 8 bytes.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// The value as a big-endian integer.
    pub fn to_u64(self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl From<[u8; 8]> for CompressedFabricId {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for CompressedFabricId {
    /// Uppercase 16-digit hex, the form used in instance names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.to_u64())
    }
}
