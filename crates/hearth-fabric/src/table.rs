//! The fabric table
//!
//! Reader/writer-locked registry of joined fabrics. Reads hand out
//! defensive clones so callers can never mutate an entry behind the
//! table's back; mutation happens through [`FabricTable::update`] with the
//! lock held. An `add` either wholly succeeds or leaves the table
//! untouched.

use crate::entry::{FabricEntry, MAX_LABEL_LEN};
use crate::views::{FabricDescriptor, NocListEntry};
use hearth_core::config::FabricTableConfig;
use hearth_core::{CompressedFabricId, Error, FabricId, FabricIndex, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/// The registry of security domains this node belongs to.
#[derive(Debug)]
pub struct FabricTable {
    config: FabricTableConfig,
    entries: RwLock<BTreeMap<u8, FabricEntry>>,
}

impl FabricTable {
    /// An empty table with the given capacity.
    pub fn new(config: FabricTableConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of joined fabrics.
    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    /// Register a fabric.
    ///
    /// Fails with [`Error::TableFull`] at capacity, [`Error::IndexInUse`]
    /// if the index is taken, [`Error::FabricConflict`] if an entry with
    /// the same (root public key, fabric ID) exists, and
    /// [`Error::LabelConflict`] if the non-empty label is already in use.
    pub fn add(&self, entry: FabricEntry) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.len() >= usize::from(self.config.max_fabrics) {
            return Err(Error::TableFull);
        }
        if entries.contains_key(&entry.fabric_index().get()) {
            return Err(Error::IndexInUse);
        }
        if entries
            .values()
            .any(|e| e.matches_root_and_fabric(entry.root_public_key(), entry.fabric_id()))
        {
            return Err(Error::FabricConflict);
        }
        if !entry.label().is_empty() && entries.values().any(|e| e.label() == entry.label()) {
            return Err(Error::LabelConflict);
        }
        debug!(fabric = %entry.fabric_index(), id = %entry.fabric_id(), "fabric added");
        entries.insert(entry.fabric_index().get(), entry);
        Ok(())
    }

    /// Remove a fabric, zeroising its private material first.
    ///
    /// Sessions and ACL entries on the fabric are torn down by the caller,
    /// which owns those tables.
    pub fn remove(&self, index: FabricIndex) -> Result<()> {
        let mut removed = self
            .entries
            .write()
            .remove(&index.get())
            .ok_or(Error::FabricNotFound)?;
        removed.destroy_private_material();
        debug!(fabric = %index, "fabric removed");
        Ok(())
    }

    /// A defensive copy of the entry at `index`.
    pub fn get(&self, index: FabricIndex) -> Result<FabricEntry> {
        self.entries
            .read()
            .get(&index.get())
            .cloned()
            .ok_or(Error::FabricNotFound)
    }

    /// Mutate the entry at `index` in place, table lock held throughout.
    pub fn update<R>(&self, index: FabricIndex, f: impl FnOnce(&mut FabricEntry) -> R) -> Result<R> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(&index.get()).ok_or(Error::FabricNotFound)?;
        Ok(f(entry))
    }

    /// Change a fabric's label.
    ///
    /// Fails with [`Error::InvalidLabel`] over 32 bytes and
    /// [`Error::LabelConflict`] if another fabric holds the same non-empty
    /// label.
    pub fn update_label(&self, index: FabricIndex, label: &str) -> Result<()> {
        if label.len() > MAX_LABEL_LEN {
            return Err(Error::InvalidLabel);
        }
        let mut entries = self.entries.write();
        if !label.is_empty()
            && entries
                .values()
                .any(|e| e.fabric_index() != index && e.label() == label)
        {
            return Err(Error::LabelConflict);
        }
        let entry = entries.get_mut(&index.get()).ok_or(Error::FabricNotFound)?;
        entry.set_label(label.to_owned());
        Ok(())
    }

    /// First fabric chaining to `root_public_key`.
    pub fn find_by_root_public_key(&self, root_public_key: &[u8; 65]) -> Option<FabricEntry> {
        self.entries
            .read()
            .values()
            .find(|e| e.root_public_key() == root_public_key)
            .cloned()
    }

    /// The fabric with the given derived compressed identifier.
    pub fn find_by_compressed_id(&self, compressed: CompressedFabricId) -> Option<FabricEntry> {
        self.entries
            .read()
            .values()
            .find(|e| e.compressed_id() == compressed)
            .cloned()
    }

    /// The fabric matching both root public key and fabric ID, the
    /// unique identity of a security domain.
    pub fn find_by_root_and_fabric_id(
        &self,
        root_public_key: &[u8; 65],
        fabric_id: FabricId,
    ) -> Option<FabricEntry> {
        self.entries
            .read()
            .values()
            .find(|e| e.matches_root_and_fabric(root_public_key, fabric_id))
            .cloned()
    }

    /// First fabric with the given fabric ID, in index order.
    ///
    /// Two fabrics may share a fabric ID under different roots; use
    /// [`FabricTable::find_by_root_and_fabric_id`] when uniqueness
    /// matters.
    pub fn find_by_fabric_id(&self, fabric_id: FabricId) -> Option<FabricEntry> {
        self.entries
            .read()
            .values()
            .find(|e| e.fabric_id() == fabric_id)
            .cloned()
    }

    /// The lowest unused index in `1..=254`.
    pub fn allocate_index(&self) -> Result<FabricIndex> {
        let entries = self.entries.read();
        (FabricIndex::MIN..=FabricIndex::MAX)
            .find(|candidate| !entries.contains_key(candidate))
            .map(FabricIndex::new)
            .transpose()?
            .ok_or(Error::TableFull)
    }

    /// NOC/ICAC pairs per fabric, as served by the OperCreds cluster.
    pub fn nocs_list(&self) -> Vec<NocListEntry> {
        self.entries
            .read()
            .values()
            .map(|e| NocListEntry {
                fabric_index: e.fabric_index(),
                noc: e.noc().to_vec(),
                icac: e.icac().map(<[u8]>::to_vec),
            })
            .collect()
    }

    /// Fabric descriptors, as served by the OperCreds cluster.
    pub fn fabrics_list(&self) -> Vec<FabricDescriptor> {
        self.entries
            .read()
            .values()
            .map(|e| FabricDescriptor {
                fabric_index: e.fabric_index(),
                root_public_key: *e.root_public_key(),
                vendor_id: e.vendor_id(),
                fabric_id: e.fabric_id(),
                node_id: e.node_id(),
                label: e.label().to_owned(),
            })
            .collect()
    }

    /// The distinct trusted root certificates across all fabrics.
    pub fn trusted_root_certificates(&self) -> Vec<Vec<u8>> {
        let entries = self.entries.read();
        let mut roots: Vec<Vec<u8>> = Vec::new();
        for entry in entries.values() {
            if !roots.iter().any(|r| r == entry.root_cert()) {
                roots.push(entry.root_cert().to_vec());
            }
        }
        roots
    }

    /// Visit a clone of every entry, in index order.
    pub fn for_each(&self, mut f: impl FnMut(&FabricEntry)) {
        for entry in self.entries.read().values() {
            f(entry);
        }
    }
}
