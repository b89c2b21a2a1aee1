//! Parsed-certificate model and the parser collaborator
//!
//! Certificate ASN.1/TLV decoding is outside the core; the table consumes
//! parsed certificates through [`CertificateParser`] and only checks the
//! fields below. Parsers that cannot expose the signed portion leave
//! `tbs`/`signature` empty, in which case chain validation is structural
//! only.

use hearth_core::{CatId, FabricId, Result};

/// The declared role of a certificate in an operational chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateType {
    /// Root CA certificate.
    Rcac,
    /// Intermediate CA certificate.
    Icac,
    /// Node operational certificate.
    Noc,
}

/// The fields of a parsed operational certificate the core consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Declared role.
    pub cert_type: CertificateType,
    /// Fabric ID from the subject DN, when present.
    pub fabric_id: Option<FabricId>,
    /// Node ID from the subject DN, when present.
    pub node_id: Option<u64>,
    /// CASE Authenticated Tags from the subject DN.
    pub cats: Vec<CatId>,
    /// Uncompressed P-256 public key (65 bytes, `0x04` prefix).
    pub public_key: [u8; 65],
    /// Authority key identifier.
    pub akid: Vec<u8>,
    /// Subject key identifier.
    pub skid: Vec<u8>,
    /// The signed (to-be-signed) portion; empty if the parser cannot
    /// supply it.
    pub tbs: Vec<u8>,
    /// Raw `r || s` ECDSA signature over `tbs`; empty if unavailable.
    pub signature: Vec<u8>,
}

/// Collaborator that decodes certificate bytes into [`Certificate`]s.
pub trait CertificateParser: Send + Sync {
    /// Parse a TLV-encoded operational certificate.
    fn parse_tlv(&self, bytes: &[u8]) -> Result<Certificate>;
}
