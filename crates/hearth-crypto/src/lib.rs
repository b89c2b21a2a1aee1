//! # Hearth Crypto
//!
//! The cryptographic primitive surface consumed by the fabric table and the
//! message security codec. The primitives themselves (AES-CCM-128, AES-CTR,
//! HKDF-SHA256, ECDSA P-256) are treated as black boxes behind the
//! [`CryptoPrimitives`] trait; [`RustCryptoPrimitives`] is the default
//! implementation over the RustCrypto crates.
//!
//! This crate also owns the two fixed HKDF derivations of the protocol:
//! the compressed fabric identifier and the per-codec privacy key, plus the
//! zeroising [`SymmetricKey`] wrapper every other crate stores key material
//! in.

#![forbid(unsafe_code)]

pub mod derive;
pub mod keys;
pub mod primitives;

pub use derive::{derive_compressed_fabric_id, derive_privacy_key};
pub use keys::{SharedSecret, SymmetricKey};
pub use primitives::{CryptoPrimitives, RustCryptoPrimitives};
