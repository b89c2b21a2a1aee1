//! Message header wire codec
//!
//! # Wire format (little-endian)
//!
//! ```text
//! [0]        message flags: version (4 bits), S (source present), DSIZ (2 bits)
//! [1..=2]    session ID (u16 LE)
//! [3]        security flags: P, C, MX (reserved), session type (2 bits)
//! [4..=7]    message counter (u32 LE)
//! [8..=15]   source node ID (present iff S)
//! [...]      destination node ID (0, 8, or 2 bytes per DSIZ)
//! ```
//!
//! `encode()`/`decode()` are symmetric; `decode` rejects unknown versions,
//! reserved DSIZ and session-type encodings, and truncated buffers.

use hearth_core::{Error, GroupId, Result};

/// Protocol version carried in the top nibble of the message flags.
pub const MESSAGE_VERSION: u8 = 0;

/// Byte length of the fixed header prefix (flags through counter).
pub const FIXED_HEADER_LEN: usize = 8;

/// Offset of the first byte covered by privacy obfuscation.
pub const PRIVACY_OBFUSCATION_OFFSET: usize = 4;

const FLAG_SOURCE_PRESENT: u8 = 0x04;
const DSIZ_MASK: u8 = 0x03;
const DSIZ_NONE: u8 = 0x00;
const DSIZ_NODE: u8 = 0x01;
const DSIZ_GROUP: u8 = 0x02;

const SEC_PRIVACY: u8 = 0x80;
const SEC_CONTROL: u8 = 0x40;
const SEC_SESSION_TYPE_MASK: u8 = 0x03;

/// The session type carried in the low two bits of the security flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionType {
    /// Secure unicast (PASE or CASE), or unsecured when session ID is 0.
    #[default]
    Unicast,
    /// Group message.
    Group,
}

impl SessionType {
    fn to_bits(self) -> u8 {
        match self {
            SessionType::Unicast => 0,
            SessionType::Group => 1,
        }
    }

    fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(SessionType::Unicast),
            1 => Ok(SessionType::Group),
            _ => Err(Error::MalformedMessage),
        }
    }
}

/// The destination addressing variant selected by DSIZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Destination {
    /// No destination field.
    #[default]
    None,
    /// 8-byte destination node ID.
    Node(u64),
    /// 2-byte destination group ID.
    Group(GroupId),
}

impl Destination {
    fn encoded_len(self) -> usize {
        match self {
            Destination::None => 0,
            Destination::Node(_) => 8,
            Destination::Group(_) => 2,
        }
    }

    fn dsiz(self) -> u8 {
        match self {
            Destination::None => DSIZ_NONE,
            Destination::Node(_) => DSIZ_NODE,
            Destination::Group(_) => DSIZ_GROUP,
        }
    }
}

/// A parsed message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    /// Local session ID of the receiver; 0 means unsecured.
    pub session_id: u16,
    /// Unicast or group.
    pub session_type: SessionType,
    /// P flag: the counter and addressing fields are obfuscated.
    pub privacy: bool,
    /// C flag: control message.
    pub control: bool,
    /// The per-message counter.
    pub message_counter: u32,
    /// Source node ID (S flag).
    pub source_node_id: Option<u64>,
    /// Destination addressing (DSIZ).
    pub destination: Destination,
}

impl MessageHeader {
    /// A plain secure-unicast header (no addressing fields).
    pub fn secure_unicast(session_id: u16, message_counter: u32) -> Self {
        Self {
            session_id,
            message_counter,
            ..Self::default()
        }
    }

    /// The security flags byte, which doubles as byte 0 of the AEAD nonce.
    pub fn security_flags(&self) -> u8 {
        let mut flags = self.session_type.to_bits() & SEC_SESSION_TYPE_MASK;
        if self.privacy {
            flags |= SEC_PRIVACY;
        }
        if self.control {
            flags |= SEC_CONTROL;
        }
        flags
    }

    /// Total encoded length of this header.
    pub fn encoded_len(&self) -> usize {
        FIXED_HEADER_LEN
            + self.source_node_id.map_or(0, |_| 8)
            + self.destination.encoded_len()
    }

    /// Length of the privacy-obfuscated span (counter, source,
    /// destination). The message flags, session ID, and security flags are
    /// never obfuscated.
    pub fn obfuscated_len(&self) -> usize {
        self.encoded_len() - PRIVACY_OBFUSCATION_OFFSET
    }

    /// Serialise to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        let mut flags = MESSAGE_VERSION << 4 | self.destination.dsiz();
        if self.source_node_id.is_some() {
            flags |= FLAG_SOURCE_PRESENT;
        }
        out.push(flags);
        out.extend_from_slice(&self.session_id.to_le_bytes());
        out.push(self.security_flags());
        out.extend_from_slice(&self.message_counter.to_le_bytes());
        if let Some(source) = self.source_node_id {
            out.extend_from_slice(&source.to_le_bytes());
        }
        match self.destination {
            Destination::None => {}
            Destination::Node(node) => out.extend_from_slice(&node.to_le_bytes()),
            Destination::Group(group) => out.extend_from_slice(&group.get().to_le_bytes()),
        }
        out
    }

    /// Parse a header from the front of `buf`, returning it together with
    /// the number of bytes consumed.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        if buf.len() < FIXED_HEADER_LEN {
            return Err(Error::MalformedMessage);
        }
        let flags = buf[0];
        if flags >> 4 != MESSAGE_VERSION {
            return Err(Error::MalformedMessage);
        }
        let session_id = u16::from_le_bytes([buf[1], buf[2]]);
        let security = buf[3];
        if security & 0x20 != 0 {
            // MX is reserved and must be zero.
            return Err(Error::MalformedMessage);
        }
        let session_type = SessionType::from_bits(security & SEC_SESSION_TYPE_MASK)?;
        let message_counter = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);

        let mut offset = FIXED_HEADER_LEN;
        let source_node_id = if flags & FLAG_SOURCE_PRESENT != 0 {
            let end = offset + 8;
            let bytes = buf.get(offset..end).ok_or(Error::MalformedMessage)?;
            offset = end;
            Some(u64::from_le_bytes(bytes.try_into().map_err(|_| Error::MalformedMessage)?))
        } else {
            None
        };

        let destination = match flags & DSIZ_MASK {
            DSIZ_NONE => Destination::None,
            DSIZ_NODE => {
                let end = offset + 8;
                let bytes = buf.get(offset..end).ok_or(Error::MalformedMessage)?;
                offset = end;
                Destination::Node(u64::from_le_bytes(
                    bytes.try_into().map_err(|_| Error::MalformedMessage)?,
                ))
            }
            DSIZ_GROUP => {
                let end = offset + 2;
                let bytes = buf.get(offset..end).ok_or(Error::MalformedMessage)?;
                offset = end;
                Destination::Group(GroupId(u16::from_le_bytes(
                    bytes.try_into().map_err(|_| Error::MalformedMessage)?,
                )))
            }
            _ => return Err(Error::MalformedMessage),
        };

        Ok((
            Self {
                session_id,
                session_type,
                privacy: security & SEC_PRIVACY != 0,
                control: security & SEC_CONTROL != 0,
                message_counter,
                source_node_id,
                destination,
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
    fn minimal_header_round_trips() {
        let header = MessageHeader::secure_unicast(0x0BB8, 0x3039);
        let bytes = header.encode();
        assert_eq!(bytes, hex::decode("00b80b0039300000").unwrap());
        let (decoded, consumed) = MessageHeader::decode(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(consumed, 8);
    }

    #[test]
    fn source_and_group_destination_round_trip() {
        let header = MessageHeader {
            session_id: 0,
            session_type: SessionType::Group,
            privacy: true,
            control: false,
            message_counter: 42,
            source_node_id: Some(0x0102_0304_0506_0708),
            destination: Destination::Group(GroupId(0xFEED)),
        };
        let bytes = header.encode();
        assert_eq!(bytes.len(), header.encoded_len());
        assert_eq!(bytes.len(), 18);
        let (decoded, consumed) = MessageHeader::decode(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(consumed, 18);
    }

    #[test]
    fn node_destination_round_trips() {
        let header = MessageHeader {
            destination: Destination::Node(0xAABB_CCDD_EEFF_0011),
            ..MessageHeader::secure_unicast(1, 2)
        };
        let (decoded, _) = MessageHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded.destination, Destination::Node(0xAABB_CCDD_EEFF_0011));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = MessageHeader::secure_unicast(1, 2).encode();
        bytes[0] |= 0x10;
        assert_matches!(MessageHeader::decode(&bytes), Err(Error::MalformedMessage));
    }

    #[test]
    fn rejects_reserved_bits() {
        let mut bytes = MessageHeader::secure_unicast(1, 2).encode();
        bytes[3] |= 0x20; // MX
        assert_matches!(MessageHeader::decode(&bytes), Err(Error::MalformedMessage));

        let mut bytes = MessageHeader::secure_unicast(1, 2).encode();
        bytes[3] |= 0x02; // reserved session type
        assert_matches!(MessageHeader::decode(&bytes), Err(Error::MalformedMessage));

        let mut bytes = MessageHeader::secure_unicast(1, 2).encode();
        bytes[0] |= 0x03; // reserved DSIZ
        assert_matches!(MessageHeader::decode(&bytes), Err(Error::MalformedMessage));
    }

    #[test]
    fn rejects_truncation() {
        let header = MessageHeader {
            source_node_id: Some(7),
            ..MessageHeader::secure_unicast(1, 2)
        };
        let bytes = header.encode();
        for len in 0..bytes.len() {
            assert_matches!(
                MessageHeader::decode(&bytes[..len]),
                Err(Error::MalformedMessage)
            );
        }
    }

    #[test]
    fn security_flags_reflect_privacy_and_type() {
        let mut header = MessageHeader::secure_unicast(1, 2);
        assert_eq!(header.security_flags(), 0x00);
        header.privacy = true;
        assert_eq!(header.security_flags(), 0x80);
        header.session_type = SessionType::Group;
        assert_eq!(header.security_flags(), 0x81);
        header.control = true;
        assert_eq!(header.security_flags(), 0xC1);
    }
}
