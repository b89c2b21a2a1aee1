//! Zeroising wrappers for symmetric key material
//!
//! Key bytes live exclusively inside these wrappers. Both types zeroise on
//! drop, compare in constant time, and redact their `Debug` output.

use hearth_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 16-byte AES-128 key (encryption key, IPK, privacy key).
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; Self::LEN]);

impl SymmetricKey {
    /// Key length in bytes.
    pub const LEN: usize = 16;

    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Wrap a slice, rejecting any length other than 16.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; Self::LEN] = bytes.try_into().map_err(|_| Error::InvalidKey)?;
        Ok(Self(arr))
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Overwrite the key with zeros in place.
    pub fn destroy(&mut self) {
        self.0.zeroize();
    }

    /// True once every byte is zero (after [`SymmetricKey::destroy`]).
    pub fn is_destroyed(&self) -> bool {
        self.0.ct_eq(&[0u8; Self::LEN]).into()
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SymmetricKey {}

impl From<[u8; SymmetricKey::LEN]> for SymmetricKey {
    fn from(bytes: [u8; SymmetricKey::LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// A variable-length shared secret (CASE resumption material).
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(#[serde(with = "serde_bytes")] Vec<u8>);

impl SharedSecret {
    /// Wrap secret bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Overwrite the secret with zeros in place.
    pub fn destroy(&mut self) {
        self.0.zeroize();
    }

    /// True once every byte is zero.
    pub fn is_destroyed(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SharedSecret {}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}
