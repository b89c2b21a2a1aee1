//! Capacity configuration for the core tables
//!
//! All bounds are plain data validated at construction time; the tables
//! themselves never re-check them. Defaults follow the Matter minimums.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the fabric table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricTableConfig {
    /// Maximum number of fabrics the node will join. Valid `5..=254`.
    pub max_fabrics: u8,
}

impl FabricTableConfig {
    /// Validate a capacity into a config.
    pub fn new(max_fabrics: u8) -> Result<Self> {
        if !(5..=254).contains(&max_fabrics) {
            return Err(Error::InvalidFabricIndex(max_fabrics));
        }
        Ok(Self { max_fabrics })
    }
}

impl Default for FabricTableConfig {
    fn default() -> Self {
        Self { max_fabrics: 5 }
    }
}

/// Configuration for the session manager tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTableConfig {
    /// Maximum concurrent secure sessions.
    pub max_sessions: usize,
    /// Maximum tracked group peers across all fabrics.
    pub max_group_peers: usize,
}

impl Default for SessionTableConfig {
    fn default() -> Self {
        Self {
            max_sessions: 16,
            max_group_peers: 64,
        }
    }
}

/// Configuration for the ACL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclConfig {
    /// Maximum ACL entries per fabric.
    pub max_entries_per_fabric: usize,
    /// Maximum subjects per entry.
    pub max_subjects_per_entry: usize,
    /// Maximum targets per entry.
    pub max_targets_per_entry: usize,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            max_entries_per_fabric: 4,
            max_subjects_per_entry: 4,
            max_targets_per_entry: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fabric_capacity_bounds() {
        assert!(FabricTableConfig::new(4).is_err());
        assert!(FabricTableConfig::new(5).is_ok());
        assert!(FabricTableConfig::new(254).is_ok());
        assert!(FabricTableConfig::new(255).is_err());
    }

    #[test]
    fn defaults_match_matter_minimums() {
        assert_eq!(FabricTableConfig::default().max_fabrics, 5);
        let s = SessionTableConfig::default();
        assert_eq!(s.max_sessions, 16);
        assert_eq!(s.max_group_peers, 64);
        let a = AclConfig::default();
        assert_eq!(a.max_subjects_per_entry, 4);
        assert_eq!(a.max_targets_per_entry, 3);
    }

    #[test]
    fn configs_serde_round_trip() {
        let cfg = SessionTableConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(serde_json::from_str::<SessionTableConfig>(&json).unwrap(), cfg);
    }
}
