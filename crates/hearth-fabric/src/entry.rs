//! A single fabric table entry
//!
//! Carries everything the node knows about one security domain: the
//! certificate material it joined with, the identity facts extracted from
//! the chain, the derived compressed fabric ID, and the fabric's Identity
//! Protection Key. The IPK zeroises on drop and on explicit destruction.

use crate::chain::ChainInfo;
use hearth_core::{
    CompressedFabricId, Error, FabricId, FabricIndex, NodeId, Result, VendorId,
};
use hearth_crypto::{derive_compressed_fabric_id, CryptoPrimitives, SymmetricKey};

/// Maximum fabric label length in UTF-8 bytes.
pub const MAX_LABEL_LEN: usize = 32;

/// One security domain the node has joined.
#[derive(Debug, Clone)]
pub struct FabricEntry {
    fabric_index: FabricIndex,
    fabric_id: FabricId,
    node_id: u64,
    vendor_id: VendorId,
    label: String,
    root_cert: Vec<u8>,
    noc: Vec<u8>,
    icac: Option<Vec<u8>>,
    root_public_key: [u8; 65],
    compressed_id: CompressedFabricId,
    ipk: SymmetricKey,
}

impl FabricEntry {
    /// Build an entry from a validated chain, deriving the compressed
    /// fabric identifier.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        crypto: &dyn CryptoPrimitives,
        fabric_index: FabricIndex,
        chain: &ChainInfo,
        vendor_id: VendorId,
        label: String,
        root_cert: Vec<u8>,
        noc: Vec<u8>,
        icac: Option<Vec<u8>>,
        ipk: SymmetricKey,
    ) -> Result<Self> {
        if fabric_index.is_none() {
            return Err(Error::InvalidFabricIndex(0));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(Error::InvalidLabel);
        }
        if !NodeId::raw_is_operational(chain.node_id) {
            return Err(Error::InvalidNodeId(chain.node_id));
        }
        let compressed_id =
            derive_compressed_fabric_id(crypto, &chain.root_public_key, chain.fabric_id)?;
        Ok(Self {
            fabric_index,
            fabric_id: chain.fabric_id,
            node_id: chain.node_id,
            vendor_id,
            label,
            root_cert,
            noc,
            icac,
            root_public_key: chain.root_public_key,
            compressed_id,
            ipk,
        })
    }

    /// The stable local handle for this fabric.
    pub fn fabric_index(&self) -> FabricIndex {
        self.fabric_index
    }

    /// The 64-bit fabric identifier.
    pub fn fabric_id(&self) -> FabricId {
        self.fabric_id
    }

    /// This node's operational node ID on the fabric.
    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// The administering vendor.
    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    /// The user-assigned label (possibly empty).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    /// The root CA certificate this fabric chains to.
    pub fn root_cert(&self) -> &[u8] {
        &self.root_cert
    }

    /// The node operational certificate.
    pub fn noc(&self) -> &[u8] {
        &self.noc
    }

    /// The intermediate CA certificate, when the chain has one.
    pub fn icac(&self) -> Option<&[u8]> {
        self.icac.as_deref()
    }

    /// The root CA's uncompressed public key.
    pub fn root_public_key(&self) -> &[u8; 65] {
        &self.root_public_key
    }

    /// The derived compressed fabric identifier.
    pub fn compressed_id(&self) -> CompressedFabricId {
        self.compressed_id
    }

    /// The fabric's Identity Protection Key.
    pub fn ipk(&self) -> &SymmetricKey {
        &self.ipk
    }

    /// Destroy the IPK in place; runs on removal before the entry drops.
    pub(crate) fn destroy_private_material(&mut self) {
        self.ipk.destroy();
    }

    /// True if this entry matches both root public key and fabric ID.
    pub fn matches_root_and_fabric(&self, root_public_key: &[u8; 65], fabric_id: FabricId) -> bool {
        self.fabric_id == fabric_id && &self.root_public_key == root_public_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainInfo;
    use hearth_crypto::RustCryptoPrimitives;

    fn chain_info() -> ChainInfo {
        let mut root_public_key = [0u8; 65];
        root_public_key[0] = 0x04;
        root_public_key[1..].copy_from_slice(
            &hex::decode(
                "4a9f42b1ca4840d37292bbc7f6a7e11e22200c976fc900dbc98a7a383a641cb8\
                 254a2e56d4e295a847943b4e3897c4a773e930277b4d9fbede8a052686bfacfa",
            )
            .unwrap(),
        );
        ChainInfo {
            fabric_id: FabricId::new(0x2906_C908_D115_D362).unwrap(),
            node_id: 0x8FC7_7724_01CD_0696,
            root_public_key,
            noc_cats: Vec::new(),
        }
    }

    fn entry(index: u8, label: &str) -> Result<FabricEntry> {
        FabricEntry::new(
            &RustCryptoPrimitives,
            FabricIndex::new(index)?,
            &chain_info(),
            VendorId(0xFFF1),
            label.to_owned(),
            b"rcac".to_vec(),
            b"noc".to_vec(),
            None,
            SymmetricKey::new([0x99; 16]),
        )
    }

    #[test]
    fn derives_compressed_id_on_construction() {
        let entry = entry(1, "home").unwrap();
        assert_eq!(entry.compressed_id().to_string(), "87E1B004E235A130");
    }

    #[test]
    fn rejects_oversized_label() {
        assert_eq!(entry(1, &"x".repeat(33)).unwrap_err(), Error::InvalidLabel);
        assert!(entry(1, &"x".repeat(32)).is_ok());
    }

    #[test]
    fn destroy_zeroes_ipk() {
        let mut entry = entry(1, "").unwrap();
        entry.destroy_private_material();
        assert!(entry.ipk().is_destroyed());
    }
}
