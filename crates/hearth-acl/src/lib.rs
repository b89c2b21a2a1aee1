//! # Hearth ACL - Access Control Enforcement
//!
//! Maps an authenticated subject and a resource path to an allow/deny
//! verdict. Entries are fabric-scoped, validated at insert, and scanned in
//! insertion order; the first entry whose privilege, subject, and target
//! all match wins. PASE subjects during commissioning bypass the table
//! entirely with an implicit administer grant.
//!
//! The engine is pure: `check` has no side effects and is idempotent in
//! the entry set. Device-type membership is resolved through a
//! caller-supplied [`DeviceTypeResolver`] that is only borrowed for the
//! duration of the call.

#![forbid(unsafe_code)]

pub mod engine;
pub mod entry;
pub mod store;
pub mod subject;

pub use engine::{AccessVerdict, AclManager, DeviceTypeResolver};
pub use entry::{AclEntry, AuthMode, Privilege, Target};
pub use store::{AclStore, MemAclStore};
pub use subject::{RequestPath, RequestType, SubjectDescriptor};
