//! Authenticated message framing
//!
//! Secure frames are `header || AES-CCM-128(protocol header || payload)`
//! with the cleartext header as additional authenticated data and a
//! 13-byte nonce of `security flags || counter LE || source node id LE`.
//!
//! When privacy is requested the counter and addressing fields of the
//! already-emitted header are additionally obfuscated with AES-CTR under a
//! key derived from the encryption key, keyed per message by
//! `session id BE || MIC[5..16]`. The message flags, session ID, and
//! security flags stay in the clear so the receiver can locate the session
//! and rebuild the privacy nonce.
//!
//! Every decrypt-side failure (bad MIC, wrong key, malformed header)
//! surfaces as [`Error::DecryptionFailed`] without distinction.

use crate::message::{MessageHeader, PRIVACY_OBFUSCATION_OFFSET};
use crate::protocol::ProtocolHeader;
use hearth_core::{Error, Result};
use hearth_crypto::primitives::{KEY_LEN, MIC_LEN, NONCE_LEN};
use hearth_crypto::{derive_privacy_key, CryptoPrimitives, SymmetricKey};
use std::sync::Arc;

/// A fully decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// The (deobfuscated) message header.
    pub header: MessageHeader,
    /// The protocol header recovered from the plaintext.
    pub protocol: ProtocolHeader,
    /// The application payload.
    pub payload: Vec<u8>,
}

/// Build the 13-byte AEAD nonce.
///
/// `source_node_id` is 0 for PASE sessions and for messages without a
/// source field on an unanchored path.
pub fn build_nonce(security_flags: u8, message_counter: u32, source_node_id: u64) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[0] = security_flags;
    nonce[1..5].copy_from_slice(&message_counter.to_le_bytes());
    nonce[5..13].copy_from_slice(&source_node_id.to_le_bytes());
    nonce
}

fn build_privacy_nonce(session_id: u16, mic: &[u8]) -> [u8; NONCE_LEN] {
    debug_assert_eq!(mic.len(), MIC_LEN);
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..2].copy_from_slice(&session_id.to_be_bytes());
    nonce[2..].copy_from_slice(&mic[5..MIC_LEN]);
    nonce
}

/// One direction of a secure session's framing.
///
/// Holds the AEAD key and the privacy key derived from it once at
/// construction; everything else is per-call. Keys are destroyed with
/// [`MessageCodec::zeroize_keys`] when the session is removed, after which
/// the codec refuses to operate.
pub struct MessageCodec {
    crypto: Arc<dyn CryptoPrimitives>,
    key: SymmetricKey,
    privacy_key: SymmetricKey,
}

impl std::fmt::Debug for MessageCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCodec").finish_non_exhaustive()
    }
}

impl MessageCodec {
    /// Bind a codec to an encryption key, deriving the privacy key.
    pub fn new(crypto: Arc<dyn CryptoPrimitives>, key: SymmetricKey) -> Result<Self> {
        let privacy_key = derive_privacy_key(crypto.as_ref(), &key)?;
        Ok(Self {
            crypto,
            key,
            privacy_key,
        })
    }

    fn key_bytes(&self) -> Result<&[u8; KEY_LEN]> {
        if self.key.is_destroyed() {
            return Err(Error::InvalidKey);
        }
        Ok(self.key.as_bytes())
    }

    /// Seal a frame.
    ///
    /// `nonce_source` supplies the node ID for the nonce when the header
    /// carries no source field: 0 for PASE, the sender's operational node
    /// ID for CASE. The emitted header always reflects `privacy`.
    pub fn encrypt(
        &self,
        header: &MessageHeader,
        protocol: &ProtocolHeader,
        payload: &[u8],
        privacy: bool,
        nonce_source: u64,
    ) -> Result<Vec<u8>> {
        let key = self.key_bytes()?;
        let mut header = *header;
        header.privacy = privacy;

        let mut plaintext = protocol.encode();
        plaintext.extend_from_slice(payload);

        let mut out = header.encode();
        let header_len = out.len();
        let source = header.source_node_id.unwrap_or(nonce_source);
        let nonce = build_nonce(header.security_flags(), header.message_counter, source);
        let sealed = self
            .crypto
            .aes_ccm128_encrypt(key, &nonce, &out, &plaintext)?;
        out.extend_from_slice(&sealed);

        if privacy {
            let mic_start = out.len() - MIC_LEN;
            let privacy_nonce = build_privacy_nonce(header.session_id, &out[mic_start..]);
            let (head, _) = out.split_at_mut(header_len);
            self.crypto.aes_ctr128_apply(
                self.privacy_key.as_bytes(),
                &privacy_nonce,
                &mut head[PRIVACY_OBFUSCATION_OFFSET..],
            )?;
        }
        Ok(out)
    }

    /// Open a frame.
    ///
    /// `nonce_source` mirrors [`MessageCodec::encrypt`]: the node ID to use
    /// in the nonce when the header has no source field.
    pub fn decrypt(&self, bytes: &[u8], nonce_source: u64) -> Result<DecodedFrame> {
        let key = self.key_bytes()?;
        let mut buf = bytes.to_vec();
        let (parsed, header_len) =
            MessageHeader::decode(&buf).map_err(|_| Error::DecryptionFailed)?;

        let header = if parsed.privacy {
            if buf.len() < header_len + MIC_LEN {
                return Err(Error::DecryptionFailed);
            }
            let mic_start = buf.len() - MIC_LEN;
            let privacy_nonce = build_privacy_nonce(parsed.session_id, &buf[mic_start..]);
            self.crypto
                .aes_ctr128_apply(
                    self.privacy_key.as_bytes(),
                    &privacy_nonce,
                    &mut buf[PRIVACY_OBFUSCATION_OFFSET..header_len],
                )
                .map_err(|_| Error::DecryptionFailed)?;
            let (deobfuscated, _) =
                MessageHeader::decode(&buf).map_err(|_| Error::DecryptionFailed)?;
            deobfuscated
        } else {
            parsed
        };

        let (aad, sealed) = buf.split_at(header_len);
        let source = header.source_node_id.unwrap_or(nonce_source);
        let nonce = build_nonce(header.security_flags(), header.message_counter, source);
        let plaintext = self
            .crypto
            .aes_ccm128_decrypt(key, &nonce, aad, sealed)
            .map_err(|_| Error::DecryptionFailed)?;

        let (protocol, consumed) =
            ProtocolHeader::decode(&plaintext).map_err(|_| Error::DecryptionFailed)?;
        Ok(DecodedFrame {
            header,
            protocol,
            payload: plaintext[consumed..].to_vec(),
        })
    }

    /// Destroy both keys in place; the codec becomes inert.
    pub fn zeroize_keys(&mut self) {
        self.key.destroy();
        self.privacy_key.destroy();
    }

    /// True once [`MessageCodec::zeroize_keys`] has run.
    pub fn is_zeroised(&self) -> bool {
        self.key.is_destroyed() && self.privacy_key.is_destroyed()
    }
}

/// Serialise an unsecured frame (session ID 0): no encryption, the
/// protocol header and payload travel in the clear.
pub fn encode_plain(header: &MessageHeader, protocol: &ProtocolHeader, payload: &[u8]) -> Vec<u8> {
    let mut out = header.encode();
    out.extend_from_slice(&protocol.encode());
    out.extend_from_slice(payload);
    out
}

/// Parse an unsecured frame.
pub fn decode_plain(bytes: &[u8]) -> Result<DecodedFrame> {
    let (header, header_len) = MessageHeader::decode(bytes)?;
    let (protocol, consumed) = ProtocolHeader::decode(&bytes[header_len..])?;
    Ok(DecodedFrame {
        header,
        protocol,
        payload: bytes[header_len + consumed..].to_vec(),
    })
}
