//! Protocol header wire codec
//!
//! The protocol header travels inside the encrypted payload of secure
//! messages (and in the clear for unsecured ones):
//!
//! ```text
//! [0]      exchange flags: I, A, R, SX, V
//! [1]      protocol opcode
//! [2..=3]  exchange ID (u16 LE)
//! [4..=5]  protocol ID (u16 LE)
//! [...]    ack counter (u32 LE, iff A)
//! [...]    vendor ID (u16 LE, iff V)
//! [...]    secured extensions: u16 LE length + bytes (iff SX)
//! ```

use hearth_core::{Error, Result};

const FLAG_INITIATOR: u8 = 0x01;
const FLAG_ACK: u8 = 0x02;
const FLAG_RELIABILITY: u8 = 0x04;
const FLAG_SECURED_EXTENSIONS: u8 = 0x08;
const FLAG_VENDOR: u8 = 0x10;

/// A parsed protocol header.
///
/// Optional fields double as their flag bits: `ack_counter` present iff
/// `A`, `vendor_id` iff `V`, `secured_extensions` iff `SX`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolHeader {
    /// I flag: sent by the exchange initiator.
    pub initiator: bool,
    /// R flag: sender requests a reliability ack.
    pub reliability: bool,
    /// Protocol opcode.
    pub opcode: u8,
    /// Exchange identifier.
    pub exchange_id: u16,
    /// Protocol identifier.
    pub protocol_id: u16,
    /// Counter being acknowledged (A flag).
    pub ack_counter: Option<u32>,
    /// Vendor identifier (V flag).
    pub vendor_id: Option<u16>,
    /// Opaque secured-extensions block (SX flag).
    pub secured_extensions: Option<Vec<u8>>,
}

impl ProtocolHeader {
    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.initiator {
            flags |= FLAG_INITIATOR;
        }
        if self.ack_counter.is_some() {
            flags |= FLAG_ACK;
        }
        if self.reliability {
            flags |= FLAG_RELIABILITY;
        }
        if self.secured_extensions.is_some() {
            flags |= FLAG_SECURED_EXTENSIONS;
        }
        if self.vendor_id.is_some() {
            flags |= FLAG_VENDOR;
        }
        flags
    }

    /// Serialise to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(6);
        out.push(self.flags());
        out.push(self.opcode);
        out.extend_from_slice(&self.exchange_id.to_le_bytes());
        out.extend_from_slice(&self.protocol_id.to_le_bytes());
        if let Some(ack) = self.ack_counter {
            out.extend_from_slice(&ack.to_le_bytes());
        }
        if let Some(vendor) = self.vendor_id {
            out.extend_from_slice(&vendor.to_le_bytes());
        }
        if let Some(sx) = &self.secured_extensions {
            out.extend_from_slice(&(sx.len() as u16).to_le_bytes());
            out.extend_from_slice(sx);
        }
        out
    }

    /// Parse a header from the front of `buf`, returning it together with
    /// the number of bytes consumed.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        if buf.len() < 6 {
            return Err(Error::MalformedMessage);
        }
        let flags = buf[0];
        let opcode = buf[1];
        let exchange_id = u16::from_le_bytes([buf[2], buf[3]]);
        let protocol_id = u16::from_le_bytes([buf[4], buf[5]]);
        let mut offset = 6;

        let ack_counter = if flags & FLAG_ACK != 0 {
            let bytes = buf.get(offset..offset + 4).ok_or(Error::MalformedMessage)?;
            offset += 4;
            Some(u32::from_le_bytes(bytes.try_into().map_err(|_| Error::MalformedMessage)?))
        } else {
            None
        };

        let vendor_id = if flags & FLAG_VENDOR != 0 {
            let bytes = buf.get(offset..offset + 2).ok_or(Error::MalformedMessage)?;
            offset += 2;
            Some(u16::from_le_bytes(bytes.try_into().map_err(|_| Error::MalformedMessage)?))
        } else {
            None
        };

        let secured_extensions = if flags & FLAG_SECURED_EXTENSIONS != 0 {
            let len_bytes = buf.get(offset..offset + 2).ok_or(Error::MalformedMessage)?;
            let len = usize::from(u16::from_le_bytes(
                len_bytes.try_into().map_err(|_| Error::MalformedMessage)?,
            ));
            offset += 2;
            let block = buf.get(offset..offset + len).ok_or(Error::MalformedMessage)?;
            offset += len;
            Some(block.to_vec())
        } else {
            None
        };

        Ok((
            Self {
                initiator: flags & FLAG_INITIATOR != 0,
                reliability: flags & FLAG_RELIABILITY != 0,
                opcode,
                exchange_id,
                protocol_id,
                ack_counter,
                vendor_id,
                secured_extensions,
            },
            offset,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn minimal_header_matches_wire_layout() {
        let header = ProtocolHeader {
            initiator: true,
            reliability: true,
            opcode: 0x64,
            exchange_id: 0x0EEE,
            protocol_id: 0x7D20,
            ..ProtocolHeader::default()
        };
        assert_eq!(header.encode(), hex::decode("0564ee0e207d").unwrap());
        let (decoded, consumed) = ProtocolHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(consumed, 6);
    }

    #[test]
    fn optional_fields_round_trip() {
        let header = ProtocolHeader {
            initiator: false,
            reliability: false,
            opcode: 0x01,
            exchange_id: 0xBEEF,
            protocol_id: 0x0001,
            ack_counter: Some(0xDEAD_BEEF),
            vendor_id: Some(0xFFF1),
            secured_extensions: Some(vec![1, 2, 3, 4]),
        };
        let bytes = header.encode();
        assert_eq!(bytes[0], 0x1A); // A | SX | V
        let (decoded, consumed) = ProtocolHeader::decode(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn trailing_payload_is_not_consumed() {
        let mut bytes = ProtocolHeader::default().encode();
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let (_, consumed) = ProtocolHeader::decode(&bytes).unwrap();
        assert_eq!(consumed, 6);
    }

    #[test]
    fn rejects_truncation() {
        let header = ProtocolHeader {
            ack_counter: Some(7),
            secured_extensions: Some(vec![0; 8]),
            ..ProtocolHeader::default()
        };
        let bytes = header.encode();
        for len in 0..bytes.len() {
            assert_matches!(
                ProtocolHeader::decode(&bytes[..len]),
                Err(Error::MalformedMessage)
            );
        }
    }
}
