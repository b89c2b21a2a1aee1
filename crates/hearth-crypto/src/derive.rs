//! Fixed HKDF derivations of the protocol
//!
//! Two derivations are pinned here so every subsystem agrees on the labels:
//!
//! - Compressed fabric identifier:
//!   `HKDF-SHA256(IKM = root public point X||Y, salt = fabric id BE,
//!   info = "CompressedFabric", L = 8)`
//! - Privacy key:
//!   `HKDF-SHA256(IKM = encryption key, salt = "", info = "PrivacyKey",
//!   L = 16)`

use crate::keys::SymmetricKey;
use crate::primitives::{CryptoPrimitives, P256_PUBLIC_KEY_LEN};
use hearth_core::{CompressedFabricId, Error, FabricId, Result};

/// HKDF info label for the compressed fabric identifier.
pub const COMPRESSED_FABRIC_INFO: &[u8] = b"CompressedFabric";
/// HKDF info label for the privacy key.
pub const PRIVACY_KEY_INFO: &[u8] = b"PrivacyKey";

/// Derive the 8-byte compressed fabric identifier from a 65-byte
/// uncompressed root public key and the fabric identifier.
///
/// The key must start with the SEC1 uncompressed-point tag `0x04`; the tag
/// is stripped so only the 64-byte X||Y coordinates feed the KDF.
pub fn derive_compressed_fabric_id(
    crypto: &dyn CryptoPrimitives,
    root_public_key: &[u8],
    fabric_id: FabricId,
) -> Result<CompressedFabricId> {
    if root_public_key.len() != P256_PUBLIC_KEY_LEN || root_public_key[0] != 0x04 {
        return Err(Error::InvalidRootPublicKey);
    }
    let mut out = [0u8; 8];
    crypto.hkdf_sha256(
        &root_public_key[1..],
        &fabric_id.to_be_bytes(),
        COMPRESSED_FABRIC_INFO,
        &mut out,
    )?;
    Ok(CompressedFabricId::new(out))
}

/// Derive the privacy-obfuscation key from a session encryption key.
pub fn derive_privacy_key(
    crypto: &dyn CryptoPrimitives,
    encryption_key: &SymmetricKey,
) -> Result<SymmetricKey> {
    let mut out = [0u8; SymmetricKey::LEN];
    crypto.hkdf_sha256(encryption_key.as_bytes(), b"", PRIVACY_KEY_INFO, &mut out)?;
    Ok(SymmetricKey::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::RustCryptoPrimitives;

    // Root public key and fabric id from the protocol's published vector.
    const ROOT_KEY_XY: &str = "4a9f42b1ca4840d37292bbc7f6a7e11e22200c976fc900dbc98a7a383a641cb8\
                               254a2e56d4e295a847943b4e3897c4a773e930277b4d9fbede8a052686bfacfa";

    fn vector_root_key() -> Vec<u8> {
        let mut key = vec![0x04];
        key.extend_from_slice(&hex::decode(ROOT_KEY_XY).unwrap());
        key
    }

    #[test]
    fn compressed_fabric_id_matches_published_vector() {
        let id = derive_compressed_fabric_id(
            &RustCryptoPrimitives,
            &vector_root_key(),
            FabricId::new(0x2906_C908_D115_D362).unwrap(),
        )
        .unwrap();
        assert_eq!(id.to_string(), "87E1B004E235A130");
    }

    #[test]
    fn compressed_fabric_id_is_deterministic() {
        let fabric = FabricId::new(0x2906_C908_D115_D362).unwrap();
        let a = derive_compressed_fabric_id(&RustCryptoPrimitives, &vector_root_key(), fabric);
        let b = derive_compressed_fabric_id(&RustCryptoPrimitives, &vector_root_key(), fabric);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn rejects_key_without_uncompressed_tag() {
        let mut key = vector_root_key();
        key[0] = 0x02;
        assert_eq!(
            derive_compressed_fabric_id(
                &RustCryptoPrimitives,
                &key,
                FabricId::new(1).unwrap()
            ),
            Err(Error::InvalidRootPublicKey)
        );
    }

    #[test]
    fn rejects_key_of_wrong_length() {
        assert_eq!(
            derive_compressed_fabric_id(
                &RustCryptoPrimitives,
                &[0x04; 64],
                FabricId::new(1).unwrap()
            ),
            Err(Error::InvalidRootPublicKey)
        );
    }

    #[test]
    fn privacy_key_depends_only_on_encryption_key() {
        let enc = SymmetricKey::new([0x5E; 16]);
        let a = derive_privacy_key(&RustCryptoPrimitives, &enc).unwrap();
        let b = derive_privacy_key(&RustCryptoPrimitives, &enc).unwrap();
        assert_eq!(a, b);
        let other = derive_privacy_key(&RustCryptoPrimitives, &SymmetricKey::new([0x5F; 16]));
        assert_ne!(a, other.unwrap());
    }
}
