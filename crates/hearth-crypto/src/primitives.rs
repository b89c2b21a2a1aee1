//! The primitive trait and its RustCrypto-backed implementation
//!
//! The rest of the core never names an algorithm crate directly; it calls
//! through [`CryptoPrimitives`] so tests can substitute deterministic
//! randomness and deployments can swap in hardware-backed implementations.
//!
//! AEAD parameters are fixed by the protocol: AES-CCM-128, 13-byte nonce,
//! 16-byte MIC appended to the ciphertext. The CTR helper uses the CCM
//! counter-block layout (`0x01 || nonce || counter16`) so privacy
//! obfuscation and AEAD share one nonce shape.

use aes::Aes128;
use ccm::aead::generic_array::GenericArray;
use ccm::aead::{Aead, KeyInit, Payload};
use ccm::consts::{U13, U16};
use ccm::Ccm;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hearth_core::{Error, Result};
use hkdf::Hkdf;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use rand::RngCore;
use sha2::Sha256;

/// AEAD nonce length in bytes.
pub const NONCE_LEN: usize = 13;
/// AEAD MIC (tag) length in bytes.
pub const MIC_LEN: usize = 16;
/// Symmetric key length in bytes.
pub const KEY_LEN: usize = 16;
/// Uncompressed P-256 public key length (leading `0x04` included).
pub const P256_PUBLIC_KEY_LEN: usize = 65;

type Aes128Ccm = Ccm<Aes128, U16, U13>;
type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// Black-box cryptographic primitives consumed by the core.
///
/// Implementations must be cheap to call and must not block.
pub trait CryptoPrimitives: Send + Sync {
    /// AES-CCM-128 seal. Returns `ciphertext || MIC(16)`.
    fn aes_ccm128_encrypt(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// AES-CCM-128 open of `ciphertext || MIC(16)`.
    ///
    /// Every failure maps to [`Error::DecryptionFailed`].
    fn aes_ccm128_decrypt(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        ciphertext_and_mic: &[u8],
    ) -> Result<Vec<u8>>;

    /// AES-CTR-128 keystream application in place (its own inverse).
    fn aes_ctr128_apply(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        data: &mut [u8],
    ) -> Result<()>;

    /// HKDF-SHA256 extract-and-expand into `okm`.
    fn hkdf_sha256(&self, ikm: &[u8], salt: &[u8], info: &[u8], okm: &mut [u8]) -> Result<()>;

    /// Verify a raw `r || s` ECDSA P-256 signature over `message` with an
    /// uncompressed SEC1 public key.
    fn ecdsa_p256_verify(
        &self,
        public_key: &[u8; P256_PUBLIC_KEY_LEN],
        message: &[u8],
        signature: &[u8],
    ) -> Result<()>;

    /// Fill `out` with cryptographically secure random bytes.
    fn fill_random(&self, out: &mut [u8]);
}

/// The default [`CryptoPrimitives`] implementation over the RustCrypto
/// `aes`/`ccm`/`ctr`/`hkdf`/`p256` crates and the OS random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoPrimitives;

impl CryptoPrimitives for RustCryptoPrimitives {
    fn aes_ccm128_encrypt(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes128Ccm::new(GenericArray::from_slice(key));
        cipher
            .encrypt(
                GenericArray::from_slice(nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| Error::DecryptionFailed)
    }

    fn aes_ccm128_decrypt(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        ciphertext_and_mic: &[u8],
    ) -> Result<Vec<u8>> {
        if ciphertext_and_mic.len() < MIC_LEN {
            return Err(Error::DecryptionFailed);
        }
        let cipher = Aes128Ccm::new(GenericArray::from_slice(key));
        cipher
            .decrypt(
                GenericArray::from_slice(nonce),
                Payload {
                    msg: ciphertext_and_mic,
                    aad,
                },
            )
            .map_err(|_| Error::DecryptionFailed)
    }

    fn aes_ctr128_apply(
        &self,
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        data: &mut [u8],
    ) -> Result<()> {
        // CCM counter-block layout for a 13-byte nonce (q = 2): flags byte
        // 0x01, then the nonce, then a 16-bit counter starting at zero.
        let mut iv = [0u8; 16];
        iv[0] = 0x01;
        iv[1..14].copy_from_slice(nonce);
        let mut cipher = Aes128Ctr::new(key.into(), (&iv).into());
        cipher.apply_keystream(data);
        Ok(())
    }

    fn hkdf_sha256(&self, ikm: &[u8], salt: &[u8], info: &[u8], okm: &mut [u8]) -> Result<()> {
        let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
        hk.expand(info, okm).map_err(|_| Error::InvalidKey)
    }

    fn ecdsa_p256_verify(
        &self,
        public_key: &[u8; P256_PUBLIC_KEY_LEN],
        message: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        let key = VerifyingKey::from_sec1_bytes(public_key)
            .map_err(|_| Error::ChainValidationFailed)?;
        let sig = Signature::from_slice(signature).map_err(|_| Error::ChainValidationFailed)?;
        key.verify(message, &sig)
            .map_err(|_| Error::ChainValidationFailed)
    }

    fn fill_random(&self, out: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [0x42; 16];
    const NONCE: [u8; 13] = [0x24; 13];

    #[test]
    fn ccm_round_trip() {
        let crypto = RustCryptoPrimitives;
        let sealed = crypto
            .aes_ccm128_encrypt(&KEY, &NONCE, b"aad", b"hello")
            .unwrap();
        assert_eq!(sealed.len(), 5 + MIC_LEN);
        let opened = crypto
            .aes_ccm128_decrypt(&KEY, &NONCE, b"aad", &sealed)
            .unwrap();
        assert_eq!(opened, b"hello");
    }

    #[test]
    fn ccm_rejects_tampered_mic() {
        let crypto = RustCryptoPrimitives;
        let mut sealed = crypto
            .aes_ccm128_encrypt(&KEY, &NONCE, b"aad", b"hello")
            .unwrap();
        *sealed.last_mut().unwrap() ^= 0x01;
        assert_eq!(
            crypto.aes_ccm128_decrypt(&KEY, &NONCE, b"aad", &sealed),
            Err(Error::DecryptionFailed)
        );
    }

    #[test]
    fn ccm_rejects_tampered_aad() {
        let crypto = RustCryptoPrimitives;
        let sealed = crypto
            .aes_ccm128_encrypt(&KEY, &NONCE, b"aad", b"hello")
            .unwrap();
        assert_eq!(
            crypto.aes_ccm128_decrypt(&KEY, &NONCE, b"dad", &sealed),
            Err(Error::DecryptionFailed)
        );
    }

    #[test]
    fn ccm_rejects_short_input() {
        let crypto = RustCryptoPrimitives;
        assert_eq!(
            crypto.aes_ccm128_decrypt(&KEY, &NONCE, b"", &[0u8; 15]),
            Err(Error::DecryptionFailed)
        );
    }

    #[test]
    fn ctr_is_an_involution() {
        let crypto = RustCryptoPrimitives;
        let mut data = *b"obfuscate me please";
        let original = data;
        crypto.aes_ctr128_apply(&KEY, &NONCE, &mut data).unwrap();
        assert_ne!(data, original);
        crypto.aes_ctr128_apply(&KEY, &NONCE, &mut data).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn hkdf_is_deterministic() {
        let crypto = RustCryptoPrimitives;
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        crypto.hkdf_sha256(b"ikm", b"salt", b"info", &mut a).unwrap();
        crypto.hkdf_sha256(b"ikm", b"salt", b"info", &mut b).unwrap();
        assert_eq!(a, b);
        crypto.hkdf_sha256(b"ikm", b"salt", b"other", &mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn fill_random_fills() {
        let crypto = RustCryptoPrimitives;
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        crypto.fill_random(&mut a);
        crypto.fill_random(&mut b);
        assert_ne!(a, b);
    }
}
