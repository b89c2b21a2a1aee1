//! # Hearth Codec - Message Security
//!
//! Translation between the in-memory `(message header, protocol header,
//! payload)` triple and the on-wire byte string, with AES-CCM-128
//! authenticated encryption over the protocol header and payload, the
//! message header as additional authenticated data, and optional privacy
//! obfuscation of the header's counter and addressing fields.
//!
//! The codec is stateless apart from its pre-derived privacy key. All
//! mutable counter state lives with the session:
//!
//! - [`ReceptionState`]: sliding-window replay protection, one per
//!   direction/peer
//! - [`MessageCounter`]: the strictly monotonic outbound counter
//! - [`GlobalCounter`]: the process-wide counter for unsecured messages
//!
//! Failure semantics: any AEAD failure, header malformation inside the
//! authenticated path, or replay hit is fatal for that message and reported
//! as a typed error; nothing here mutates state beyond the counter check.

#![forbid(unsafe_code)]

pub mod codec;
pub mod counter;
pub mod message;
pub mod protocol;
pub mod reception;

pub use codec::{build_nonce, decode_plain, encode_plain, DecodedFrame, MessageCodec};
pub use counter::{GlobalCounter, MessageCounter};
pub use message::{Destination, MessageHeader, SessionType};
pub use protocol::ProtocolHeader;
pub use reception::{ReceptionPolicy, ReceptionState, WINDOW_SIZE};
