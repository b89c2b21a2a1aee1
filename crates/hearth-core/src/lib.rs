//! # Hearth Core - Foundation
//!
//! Single source of truth for the identifier algebra, error taxonomy, and
//! configuration used by every other Hearth crate.
//!
//! This crate has zero dependencies on other Hearth crates. It contains only
//! pure data types and validation logic:
//!
//! - Node identifiers and their range-discriminated variants (operational,
//!   PASE key slots, CASE Authenticated Tags, groups)
//! - Fabric handles and identifiers, vendor and group identifiers
//! - The compressed fabric identifier and DNS-SD operational instance names
//! - The unified error taxonomy shared by every subsystem
//! - Table capacity configuration
//!
//! No I/O, no cryptography, no locking happens here.

#![forbid(unsafe_code)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod identifiers;

pub use config::{AclConfig, FabricTableConfig, SessionTableConfig};
pub use discovery::{DiscoverySubtype, OperationalInstanceName};
pub use error::{Error, ErrorCategory, Result};
pub use identifiers::{
    CatId, CompressedFabricId, FabricId, FabricIndex, GroupId, NodeId, VendorId,
};
