//! Entry persistence behind a narrow CRUD trait
//!
//! Entries are stored per fabric, positionally indexed, in insertion
//! order, which is the order the decision engine scans them in. [`MemAclStore`]
//! is the in-memory implementation; deployments back the same trait with
//! NVM.

use crate::entry::AclEntry;
use hearth_core::{Error, FabricIndex, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// CRUD over persisted ACL entries, per fabric.
pub trait AclStore: Send + Sync {
    /// All entries for a fabric, in insertion order.
    fn load(&self, fabric: FabricIndex) -> Result<Vec<AclEntry>>;
    /// Append an entry, returning its position.
    fn save(&self, fabric: FabricIndex, entry: AclEntry) -> Result<usize>;
    /// Replace the entry at `index`.
    fn update(&self, fabric: FabricIndex, index: usize, entry: AclEntry) -> Result<()>;
    /// Remove the entry at `index`; later entries shift down.
    fn delete(&self, fabric: FabricIndex, index: usize) -> Result<()>;
    /// Remove every entry for a fabric.
    fn delete_all(&self, fabric: FabricIndex) -> Result<()>;
    /// Number of entries for a fabric.
    fn count(&self, fabric: FabricIndex) -> Result<usize>;
}

/// In-memory [`AclStore`].
#[derive(Debug, Default)]
pub struct MemAclStore {
    entries: RwLock<BTreeMap<u8, Vec<AclEntry>>>,
}

impl MemAclStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AclStore for MemAclStore {
    fn load(&self, fabric: FabricIndex) -> Result<Vec<AclEntry>> {
        Ok(self
            .entries
            .read()
            .get(&fabric.get())
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, fabric: FabricIndex, entry: AclEntry) -> Result<usize> {
        let mut entries = self.entries.write();
        let list = entries.entry(fabric.get()).or_default();
        list.push(entry);
        Ok(list.len() - 1)
    }

    fn update(&self, fabric: FabricIndex, index: usize, entry: AclEntry) -> Result<()> {
        let mut entries = self.entries.write();
        let list = entries.get_mut(&fabric.get()).ok_or(Error::EntryNotFound)?;
        let slot = list.get_mut(index).ok_or(Error::EntryNotFound)?;
        *slot = entry;
        Ok(())
    }

    fn delete(&self, fabric: FabricIndex, index: usize) -> Result<()> {
        let mut entries = self.entries.write();
        let list = entries.get_mut(&fabric.get()).ok_or(Error::EntryNotFound)?;
        if index >= list.len() {
            return Err(Error::EntryNotFound);
        }
        list.remove(index);
        Ok(())
    }

    fn delete_all(&self, fabric: FabricIndex) -> Result<()> {
        self.entries.write().remove(&fabric.get());
        Ok(())
    }

    fn count(&self, fabric: FabricIndex) -> Result<usize> {
        Ok(self
            .entries
            .read()
            .get(&fabric.get())
            .map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{AuthMode, Privilege};
    use assert_matches::assert_matches;

    fn entry(subject: u64) -> AclEntry {
        AclEntry {
            fabric_index: FabricIndex::new(1).unwrap(),
            privilege: Privilege::View,
            auth_mode: AuthMode::Case,
            subjects: vec![subject],
            targets: Vec::new(),
        }
    }

    #[test]
    fn save_load_preserves_insertion_order() {
        let store = MemAclStore::new();
        let fabric = FabricIndex::new(1).unwrap();
        assert_eq!(store.save(fabric, entry(1)).unwrap(), 0);
        assert_eq!(store.save(fabric, entry(2)).unwrap(), 1);
        let loaded = store.load(fabric).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].subjects, vec![1]);
        assert_eq!(loaded[1].subjects, vec![2]);
        assert_eq!(store.count(fabric).unwrap(), 2);
    }

    #[test]
    fn update_and_delete_by_position() {
        let store = MemAclStore::new();
        let fabric = FabricIndex::new(1).unwrap();
        store.save(fabric, entry(1)).unwrap();
        store.save(fabric, entry(2)).unwrap();
        store.update(fabric, 0, entry(9)).unwrap();
        assert_eq!(store.load(fabric).unwrap()[0].subjects, vec![9]);
        store.delete(fabric, 0).unwrap();
        assert_eq!(store.load(fabric).unwrap()[0].subjects, vec![2]);
        assert_matches!(store.delete(fabric, 5), Err(Error::EntryNotFound));
        assert_matches!(store.update(fabric, 5, entry(1)), Err(Error::EntryNotFound));
    }

    #[test]
    fn fabrics_are_isolated() {
        let store = MemAclStore::new();
        let f1 = FabricIndex::new(1).unwrap();
        let f2 = FabricIndex::new(2).unwrap();
        store.save(f1, entry(1)).unwrap();
        store.save(f2, entry(2)).unwrap();
        store.delete_all(f1).unwrap();
        assert_eq!(store.count(f1).unwrap(), 0);
        assert_eq!(store.count(f2).unwrap(), 1);
    }
}
