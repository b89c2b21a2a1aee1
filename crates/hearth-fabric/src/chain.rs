//! Certificate-chain validation at fabric join time
//!
//! Structural checks run over the parsed certificates: declared roles,
//! required subject fields, fabric-ID agreement, and AKID/SKID linkage
//! from the NOC up to the root. When the parser supplies the signed
//! portion, signatures are verified with the crypto primitive as well.
//!
//! Validation is all-or-nothing; a [`ChainInfo`] is only produced when the
//! whole chain holds.

use crate::cert::{Certificate, CertificateParser, CertificateType};
use hearth_core::{CatId, Error, FabricId, NodeId, Result};
use hearth_crypto::CryptoPrimitives;

/// The identity facts extracted from a validated chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    /// Fabric ID asserted by the NOC subject.
    pub fabric_id: FabricId,
    /// Operational node ID asserted by the NOC subject.
    pub node_id: u64,
    /// The root CA's uncompressed public key.
    pub root_public_key: [u8; 65],
    /// CATs asserted by the NOC subject.
    pub noc_cats: Vec<CatId>,
}

/// Validate an RCAC/NOC pair (ICAC optional) and extract [`ChainInfo`].
pub fn validate_chain(
    parser: &dyn CertificateParser,
    crypto: &dyn CryptoPrimitives,
    rcac_bytes: &[u8],
    noc_bytes: &[u8],
    icac_bytes: Option<&[u8]>,
) -> Result<ChainInfo> {
    let rcac = parser.parse_tlv(rcac_bytes)?;
    let noc = parser.parse_tlv(noc_bytes)?;
    let icac = icac_bytes.map(|bytes| parser.parse_tlv(bytes)).transpose()?;

    if rcac.cert_type != CertificateType::Rcac || noc.cert_type != CertificateType::Noc {
        return Err(Error::ChainValidationFailed);
    }
    if let Some(icac) = &icac {
        if icac.cert_type != CertificateType::Icac {
            return Err(Error::ChainValidationFailed);
        }
    }
    if rcac.public_key[0] != 0x04 {
        return Err(Error::InvalidRootPublicKey);
    }

    // The NOC subject must carry a fabric ID and an operational node ID.
    let fabric_id = noc.fabric_id.ok_or(Error::ChainValidationFailed)?;
    let node_id = noc.node_id.ok_or(Error::ChainValidationFailed)?;
    if !NodeId::raw_is_operational(node_id) {
        return Err(Error::ChainValidationFailed);
    }

    // A fabric ID on the RCAC or ICAC must agree with the NOC's.
    for ca in std::iter::once(&rcac).chain(icac.iter()) {
        if let Some(ca_fabric) = ca.fabric_id {
            if ca_fabric != fabric_id {
                return Err(Error::ChainValidationFailed);
            }
        }
    }

    // AKID/SKID linkage along the chain, and signatures where available.
    let issuer_of_noc = icac.as_ref().unwrap_or(&rcac);
    check_link(&noc, issuer_of_noc, crypto)?;
    if let Some(icac) = &icac {
        check_link(icac, &rcac, crypto)?;
    }
    check_link(&rcac, &rcac, crypto)?;

    Ok(ChainInfo {
        fabric_id,
        node_id,
        root_public_key: rcac.public_key,
        noc_cats: noc.cats,
    })
}

fn check_link(
    cert: &Certificate,
    issuer: &Certificate,
    crypto: &dyn CryptoPrimitives,
) -> Result<()> {
    if cert.akid.is_empty() || issuer.skid.is_empty() || cert.akid != issuer.skid {
        return Err(Error::ChainValidationFailed);
    }
    if !cert.tbs.is_empty() && !cert.signature.is_empty() {
        crypto.ecdsa_p256_verify(&issuer.public_key, &cert.tbs, &cert.signature)?;
    }
    Ok(())
}
