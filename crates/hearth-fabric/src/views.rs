//! Attribute views served by the Operational Credentials cluster

use hearth_core::{FabricId, FabricIndex, VendorId};

/// One element of the cluster's NOCs attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NocListEntry {
    /// Owning fabric.
    pub fabric_index: FabricIndex,
    /// The node operational certificate.
    pub noc: Vec<u8>,
    /// The intermediate CA certificate, when present.
    pub icac: Option<Vec<u8>>,
}

/// One element of the cluster's Fabrics attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricDescriptor {
    /// Owning fabric.
    pub fabric_index: FabricIndex,
    /// Root CA public key the fabric chains to.
    pub root_public_key: [u8; 65],
    /// Administering vendor.
    pub vendor_id: VendorId,
    /// The 64-bit fabric identifier.
    pub fabric_id: FabricId,
    /// This node's operational node ID on the fabric.
    pub node_id: u64,
    /// User-assigned label.
    pub label: String,
}
