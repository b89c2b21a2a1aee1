//! DNS-SD identifier formatting for operational and commissionable discovery
//!
//! # Wire format
//!
//! The operational service instance name is exactly 33 characters:
//! 16 uppercase hex digits of the compressed fabric identifier, a single
//! `-`, and 16 uppercase hex digits of the operational node identifier.
//! `parse()` and `format` (via [`std::fmt::Display`]) are symmetric.
//!
//! Commissioning subtypes use the short label forms (`_L`, `_S`, `_V`,
//! `_T`, `_CM`) with canonical base-10 rendering: minimal digits, no
//! padding.

use crate::error::{Error, Result};
use crate::identifiers::{CompressedFabricId, NodeId, VendorId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a well-formed operational instance name.
const INSTANCE_NAME_LEN: usize = 33;

/// A parsed operational DNS-SD instance name.
///
/// Formatted as `%016X-%016X` = compressed fabric id, `-`, node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationalInstanceName {
    /// The advertising fabric's compressed identifier.
    pub compressed_fabric_id: CompressedFabricId,
    /// The advertised operational node identifier (raw form).
    pub node_id: u64,
}

impl OperationalInstanceName {
    /// Build an instance name from its parts.
    ///
    /// The node id must be in the operational range.
    pub fn new(compressed_fabric_id: CompressedFabricId, node_id: u64) -> Result<Self> {
        if !NodeId::raw_is_operational(node_id) {
            return Err(Error::InvalidNodeId(node_id));
        }
        Ok(Self {
            compressed_fabric_id,
            node_id,
        })
    }
}

impl fmt::Display for OperationalInstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:016X}", self.compressed_fabric_id, self.node_id)
    }
}

impl FromStr for OperationalInstanceName {
    type Err = Error;

    /// Strict parse: exactly 33 characters, `-` at position 16, hex digits
    /// everywhere else.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != INSTANCE_NAME_LEN {
            return Err(Error::InvalidInstanceName);
        }
        let bytes = s.as_bytes();
        if bytes[16] != b'-' {
            return Err(Error::InvalidInstanceName);
        }
        let compressed = u64::from_str_radix(&s[..16], 16).map_err(|_| Error::InvalidInstanceName)?;
        let node_id = u64::from_str_radix(&s[17..], 16).map_err(|_| Error::InvalidInstanceName)?;
        // from_str_radix tolerates a leading sign; the strict format does not.
        if bytes[0] == b'+' || bytes[0] == b'-' || bytes[17] == b'+' || bytes[17] == b'-' {
            return Err(Error::InvalidInstanceName);
        }
        Ok(Self {
            compressed_fabric_id: CompressedFabricId::new(compressed.to_be_bytes()),
            node_id,
        })
    }
}

/// A commissioning or operational discovery subtype label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscoverySubtype {
    /// `_L<d>`: full 12-bit discriminator.
    LongDiscriminator(u16),
    /// `_S<d>`: upper 4 bits of the discriminator.
    ShortDiscriminator(u8),
    /// `_V<id>`: vendor subtype.
    Vendor(VendorId),
    /// `_T<id>`: device type subtype.
    DeviceType(u32),
    /// `_CM`: commissioning mode.
    CommissioningMode,
    /// `_I<16-hex>`: compressed fabric id subtype used operationally.
    CompressedFabric(CompressedFabricId),
}

impl DiscoverySubtype {
    /// Validate a long discriminator (12 bits) into its subtype.
    pub fn long_discriminator(value: u16) -> Result<Self> {
        if value > 0x0FFF {
            return Err(Error::InvalidDiscriminator(value));
        }
        Ok(Self::LongDiscriminator(value))
    }

    /// Validate a short discriminator (4 bits) into its subtype.
    pub fn short_discriminator(value: u8) -> Result<Self> {
        if value > 0x0F {
            return Err(Error::InvalidDiscriminator(u16::from(value)));
        }
        Ok(Self::ShortDiscriminator(value))
    }
}

impl fmt::Display for DiscoverySubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoverySubtype::LongDiscriminator(d) => write!(f, "_L{d}"),
            DiscoverySubtype::ShortDiscriminator(d) => write!(f, "_S{d}"),
            DiscoverySubtype::Vendor(v) => write!(f, "_V{}", v.get()),
            DiscoverySubtype::DeviceType(t) => write!(f, "_T{t}"),
            DiscoverySubtype::CommissioningMode => write!(f, "_CM"),
            DiscoverySubtype::CompressedFabric(id) => write!(f, "_I{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_compressed() -> CompressedFabricId {
        CompressedFabricId::new([0x87, 0xE1, 0xB0, 0x04, 0xE2, 0x35, 0xA1, 0x30])
    }

    #[test]
    fn formats_published_instance_name() {
        let name = OperationalInstanceName::new(sample_compressed(), 0x8FC7_7724_01CD_0696).unwrap();
        assert_eq!(name.to_string(), "87E1B004E235A130-8FC7772401CD0696");
    }

    #[test]
    fn parse_round_trips() {
        let name = OperationalInstanceName::new(sample_compressed(), 0x8FC7_7724_01CD_0696).unwrap();
        let parsed: OperationalInstanceName = name.to_string().parse().unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!("87E1B004E235A130-8FC7772401CD069".parse::<OperationalInstanceName>().is_err());
        assert!("87E1B004E235A130-8FC7772401CD06961".parse::<OperationalInstanceName>().is_err());
        assert!("".parse::<OperationalInstanceName>().is_err());
    }

    #[test]
    fn parse_rejects_misplaced_dash() {
        assert!("87E1B004E235A13-08FC7772401CD0696".parse::<OperationalInstanceName>().is_err());
        assert!("87E1B004E235A130+8FC7772401CD0696".parse::<OperationalInstanceName>().is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!("87E1B004E235A13G-8FC7772401CD0696".parse::<OperationalInstanceName>().is_err());
        assert!("87E1B004E235A130-8FC7772401CD069Z".parse::<OperationalInstanceName>().is_err());
    }

    #[test]
    fn parse_rejects_embedded_sign() {
        // 16 chars before the dash, but from_str_radix would accept "+7E1..."
        assert!("+7E1B004E235A130-8FC7772401CD0696".parse::<OperationalInstanceName>().is_err());
        assert!("87E1B004E235A130--FC7772401CD0696".parse::<OperationalInstanceName>().is_err());
    }

    #[test]
    fn subtype_labels_are_canonical_decimal() {
        assert_eq!(
            DiscoverySubtype::long_discriminator(0x0F00).unwrap().to_string(),
            "_L3840"
        );
        assert_eq!(DiscoverySubtype::short_discriminator(15).unwrap().to_string(), "_S15");
        assert_eq!(DiscoverySubtype::Vendor(VendorId(65521)).to_string(), "_V65521");
        assert_eq!(DiscoverySubtype::DeviceType(257).to_string(), "_T257");
        assert_eq!(DiscoverySubtype::CommissioningMode.to_string(), "_CM");
        assert_eq!(
            DiscoverySubtype::CompressedFabric(sample_compressed()).to_string(),
            "_I87E1B004E235A130"
        );
    }

    #[test]
    fn discriminator_bounds() {
        assert!(DiscoverySubtype::long_discriminator(0x1000).is_err());
        assert!(DiscoverySubtype::short_discriminator(16).is_err());
    }
}
