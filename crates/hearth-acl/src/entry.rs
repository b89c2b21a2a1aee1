//! ACL entry model and insert-time validation
//!
//! An entry grants one privilege to a set of subjects over a set of
//! targets, scoped to a fabric and an auth mode. Empty subjects means
//! "any subject on this fabric and auth mode"; empty targets means "any
//! resource".

use hearth_core::config::AclConfig;
use hearth_core::{Error, FabricIndex, NodeId, Result};
use serde::{Deserialize, Serialize};

/// Privilege levels, ordered by the grant hierarchy.
///
/// The numeric values are the wire encoding used by the AccessControl
/// cluster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Privilege {
    /// Read attributes and events.
    View = 1,
    /// View plus proxy access; a side chain off Administer.
    ProxyView = 2,
    /// Operate the device (commands, writable operational attributes).
    Operate = 3,
    /// Operate plus configuration.
    Manage = 4,
    /// Everything, including ACL administration.
    Administer = 5,
}

impl Privilege {
    /// True when an entry at this privilege satisfies a request for
    /// `requested`.
    pub fn grants(self, requested: Privilege) -> bool {
        use Privilege::*;
        match self {
            Administer => true,
            Manage => matches!(requested, Manage | Operate | View),
            Operate => matches!(requested, Operate | View),
            ProxyView => matches!(requested, ProxyView | View),
            View => matches!(requested, View),
        }
    }
}

/// How the subject authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuthMode {
    /// Passcode-authenticated session (never stored in an entry).
    Pase = 1,
    /// Certificate-authenticated session.
    Case = 2,
    /// Group message.
    Group = 3,
}

/// A resource selector: any non-empty subset of cluster, endpoint, and
/// device type, with endpoint and device type mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Target {
    /// Match a specific cluster.
    pub cluster: Option<u32>,
    /// Match a specific endpoint.
    pub endpoint: Option<u16>,
    /// Match endpoints carrying a device type.
    pub device_type: Option<u32>,
}

impl Target {
    /// Selector for one cluster anywhere on the node.
    pub fn cluster(cluster: u32) -> Self {
        Self {
            cluster: Some(cluster),
            ..Self::default()
        }
    }

    /// Selector for everything on one endpoint.
    pub fn endpoint(endpoint: u16) -> Self {
        Self {
            endpoint: Some(endpoint),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.cluster.is_none() && self.endpoint.is_none() && self.device_type.is_none() {
            return Err(Error::InvalidClusterId(0));
        }
        if self.endpoint.is_some() && self.device_type.is_some() {
            return Err(Error::InvalidDeviceTypeId(self.device_type.unwrap_or(0)));
        }
        if let Some(cluster) = self.cluster {
            if !cluster_id_is_valid(cluster) {
                return Err(Error::InvalidClusterId(cluster));
            }
        }
        if let Some(endpoint) = self.endpoint {
            if endpoint == 0xFFFF {
                return Err(Error::InvalidEndpointId(endpoint));
            }
        }
        if let Some(device_type) = self.device_type {
            if !device_type_id_is_valid(device_type) {
                return Err(Error::InvalidDeviceTypeId(device_type));
            }
        }
        Ok(())
    }
}

/// Standard cluster IDs use a zero vendor prefix and a suffix up to
/// `0x7FFF`; manufacturer clusters pair a vendor prefix with the
/// `0xFC00..=0xFFFE` suffix range. Wildcards are rejected.
fn cluster_id_is_valid(id: u32) -> bool {
    let prefix = id >> 16;
    let suffix = id & 0xFFFF;
    (prefix == 0 && suffix <= 0x7FFF)
        || ((1..=0xFFF4).contains(&prefix) && (0xFC00..=0xFFFE).contains(&suffix))
}

/// Device type IDs: vendor prefix up to `0xFFF4`, suffix up to `0xBFFF`.
fn device_type_id_is_valid(id: u32) -> bool {
    let prefix = id >> 16;
    let suffix = id & 0xFFFF;
    prefix <= 0xFFF4 && suffix <= 0xBFFF
}

/// One access-control entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// Owning fabric.
    pub fabric_index: FabricIndex,
    /// Privilege granted by this entry.
    pub privilege: Privilege,
    /// Auth mode the entry applies to; exactly CASE or Group.
    pub auth_mode: AuthMode,
    /// Raw subject node IDs; empty means any subject on this fabric and
    /// auth mode.
    pub subjects: Vec<u64>,
    /// Resource selectors; empty means all resources.
    pub targets: Vec<Target>,
}

impl AclEntry {
    /// Validate the entry against the insert-time rules and caps.
    pub fn validate(&self, config: &AclConfig) -> Result<()> {
        if self.fabric_index.is_none() {
            return Err(Error::InvalidFabricIndex(0));
        }
        match self.auth_mode {
            AuthMode::Pase => return Err(Error::InvalidAuthMode),
            AuthMode::Group if self.privilege == Privilege::Administer => {
                return Err(Error::InvalidAuthMode);
            }
            _ => {}
        }
        if self.subjects.len() > config.max_subjects_per_entry {
            return Err(Error::TooManySubjects);
        }
        if self.targets.len() > config.max_targets_per_entry {
            return Err(Error::TooManyTargets);
        }
        for &subject in &self.subjects {
            let node = NodeId::from_raw(subject).map_err(|_| Error::InvalidSubject)?;
            let valid = match self.auth_mode {
                AuthMode::Case => node.is_operational() || node.is_cat(),
                AuthMode::Group => node.is_group(),
                AuthMode::Pase => false,
            };
            if !valid {
                return Err(Error::InvalidSubject);
            }
        }
        for target in &self.targets {
            target.validate()?;
        }
        Ok(())
    }
}
