//! The allow/deny decision engine
//!
//! Entries are scanned in insertion order; the first one whose fabric,
//! auth mode, privilege, subjects, and targets all match grants access.
//! No entry matching means denial. The scan is side-effect free.

use crate::entry::{AclEntry, AuthMode, Privilege, Target};
use crate::store::AclStore;
use crate::subject::{RequestPath, SubjectDescriptor};
use hearth_core::config::AclConfig;
use hearth_core::{Error, NodeId, Result};
use hearth_core::FabricIndex;
use tracing::trace;

/// Resolves whether an endpoint carries a device type.
///
/// Implementations must be pure lookups and must not block; the engine
/// borrows the resolver only for the duration of one `check`.
pub trait DeviceTypeResolver {
    /// True when `endpoint` carries `device_type`.
    fn is_device_type_on_endpoint(&self, device_type: u32, endpoint: u16) -> bool;
}

/// The outcome of an access-control check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessVerdict {
    /// The request may proceed.
    Allowed,
    /// No entry grants the request.
    Denied,
}

/// Entry management plus the decision procedure.
pub struct AclManager {
    config: AclConfig,
    store: Box<dyn AclStore>,
}

impl std::fmt::Debug for AclManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AclManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AclManager {
    /// A manager over the given store.
    pub fn new(config: AclConfig, store: Box<dyn AclStore>) -> Self {
        Self { config, store }
    }

    /// Validate and append an entry, returning its position.
    pub fn create_entry(&self, entry: AclEntry) -> Result<usize> {
        entry.validate(&self.config)?;
        if self.store.count(entry.fabric_index)? >= self.config.max_entries_per_fabric {
            return Err(Error::TooManyEntries);
        }
        self.store.save(entry.fabric_index, entry)
    }

    /// Validate and replace the entry at `index` on its fabric.
    pub fn update_entry(&self, index: usize, entry: AclEntry) -> Result<()> {
        entry.validate(&self.config)?;
        self.store.update(entry.fabric_index, index, entry)
    }

    /// Remove the entry at `index` on `fabric`.
    pub fn delete_entry(&self, fabric: FabricIndex, index: usize) -> Result<()> {
        self.store.delete(fabric, index)
    }

    /// Remove every entry on `fabric` (fabric removal).
    pub fn delete_all_for_fabric(&self, fabric: FabricIndex) -> Result<()> {
        self.store.delete_all(fabric)
    }

    /// The entries on `fabric`, in scan order.
    pub fn entries_for_fabric(&self, fabric: FabricIndex) -> Result<Vec<AclEntry>> {
        self.store.load(fabric)
    }

    /// Decide whether `subject` may perform a `required`-privilege
    /// operation on `path`.
    pub fn check(
        &self,
        subject: &SubjectDescriptor,
        path: &RequestPath,
        required: Privilege,
        resolver: &dyn DeviceTypeResolver,
    ) -> Result<AccessVerdict> {
        // Implicit administer grant while the commissioning window is
        // open over PASE.
        if subject.auth_mode == AuthMode::Pase && subject.is_commissioning {
            return Ok(AccessVerdict::Allowed);
        }
        if subject.fabric_index.is_none() {
            return Ok(AccessVerdict::Denied);
        }
        for entry in self.store.load(subject.fabric_index)? {
            if entry.fabric_index != subject.fabric_index {
                continue;
            }
            if entry.auth_mode != subject.auth_mode {
                continue;
            }
            if !entry.privilege.grants(required) {
                continue;
            }
            if !subject_matches(&entry, subject) {
                continue;
            }
            if !target_matches(&entry, path, resolver) {
                continue;
            }
            trace!(fabric = %subject.fabric_index, "access granted");
            return Ok(AccessVerdict::Allowed);
        }
        Ok(AccessVerdict::Denied)
    }
}

/// An empty subject list matches any subject on the entry's fabric and
/// auth mode; otherwise one listed subject must match exactly, or (for
/// CASE) be a CAT claim satisfied by one of the subject's held tags.
fn subject_matches(entry: &AclEntry, subject: &SubjectDescriptor) -> bool {
    if entry.subjects.is_empty() {
        return true;
    }
    entry.subjects.iter().any(|&listed| {
        if listed == subject.subject_node_id {
            return true;
        }
        if entry.auth_mode != AuthMode::Case {
            return false;
        }
        match NodeId::from_raw(listed) {
            Ok(NodeId::Cat(required)) => {
                subject.cats.iter().any(|&held| required.accepts(held))
            }
            _ => false,
        }
    })
}

/// An empty target list matches any resource; otherwise every set field
/// of at least one target must match the path.
fn target_matches(entry: &AclEntry, path: &RequestPath, resolver: &dyn DeviceTypeResolver) -> bool {
    if entry.targets.is_empty() {
        return true;
    }
    entry.targets.iter().any(|target| single_target_matches(target, path, resolver))
}

fn single_target_matches(
    target: &Target,
    path: &RequestPath,
    resolver: &dyn DeviceTypeResolver,
) -> bool {
    if let Some(cluster) = target.cluster {
        if cluster != path.cluster {
            return false;
        }
    }
    if let Some(endpoint) = target.endpoint {
        if endpoint != path.endpoint {
            return false;
        }
    }
    if let Some(device_type) = target.device_type {
        if !resolver.is_device_type_on_endpoint(device_type, path.endpoint) {
            return false;
        }
    }
    true
}
