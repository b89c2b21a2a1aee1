// Property tests for the message security codec
//
// - Round-trip: decrypt(encrypt(..)) recovers the protocol header and
//   payload, and the header on all fields except that P reflects the
//   privacy request
// - Replay exclusion: an accepted counter is never accepted twice
// - Nonce construction is deterministic in its inputs

use hearth_codec::{
    build_nonce, Destination, MessageCodec, MessageHeader, ProtocolHeader, ReceptionPolicy,
    ReceptionState,
};
use hearth_crypto::{RustCryptoPrimitives, SymmetricKey};
use proptest::prelude::*;
use std::sync::Arc;

fn codec(key: [u8; 16]) -> MessageCodec {
    MessageCodec::new(Arc::new(RustCryptoPrimitives), SymmetricKey::new(key)).unwrap()
}

fn header_strategy() -> impl Strategy<Value = MessageHeader> {
    (
        any::<u16>(),
        any::<u32>(),
        proptest::option::of(any::<u64>()),
        prop_oneof![
            Just(Destination::None),
            any::<u64>().prop_map(Destination::Node),
            any::<u16>().prop_map(|g| Destination::Group(hearth_core::GroupId(g))),
        ],
    )
        .prop_map(|(session_id, counter, source, destination)| MessageHeader {
            source_node_id: source,
            destination,
            ..MessageHeader::secure_unicast(session_id, counter)
        })
}

fn protocol_strategy() -> impl Strategy<Value = ProtocolHeader> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<u8>(),
        any::<u16>(),
        any::<u16>(),
        proptest::option::of(any::<u32>()),
        proptest::option::of(any::<u16>()),
    )
        .prop_map(
            |(initiator, reliability, opcode, exchange_id, protocol_id, ack, vendor)| {
                ProtocolHeader {
                    initiator,
                    reliability,
                    opcode,
                    exchange_id,
                    protocol_id,
                    ack_counter: ack,
                    vendor_id: vendor,
                    secured_extensions: None,
                }
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn round_trip_preserves_everything_but_privacy_flag(
        key in any::<[u8; 16]>(),
        header in header_strategy(),
        protocol in protocol_strategy(),
        payload in proptest::collection::vec(any::<u8>(), 0..256),
        privacy in any::<bool>(),
        nonce_source in any::<u64>(),
    ) {
        let codec = codec(key);
        let wire = codec.encrypt(&header, &protocol, &payload, privacy, nonce_source).unwrap();
        let frame = codec.decrypt(&wire, nonce_source).unwrap();
        let mut expected = header;
        expected.privacy = privacy;
        prop_assert_eq!(frame.header, expected);
        prop_assert_eq!(frame.protocol, protocol);
        prop_assert_eq!(frame.payload, payload);
    }

    #[test]
    fn corrupting_any_byte_fails(
        key in any::<[u8; 16]>(),
        payload in proptest::collection::vec(any::<u8>(), 0..64),
        flip in any::<proptest::sample::Index>(),
    ) {
        let codec = codec(key);
        let header = MessageHeader::secure_unicast(7, 1000);
        let mut wire = codec
            .encrypt(&header, &ProtocolHeader::default(), &payload, false, 3)
            .unwrap();
        let position = flip.index(wire.len());
        wire[position] ^= 0x01;
        prop_assert!(codec.decrypt(&wire, 3).is_err());
    }

    #[test]
    fn replay_exclusion(counters in proptest::collection::vec(any::<u32>(), 1..64)) {
        let mut state = ReceptionState::new(ReceptionPolicy::EncryptedUnicast);
        let mut accepted = std::collections::HashSet::new();
        for counter in counters {
            if state.accept(counter).is_ok() {
                // Never accept the same counter twice.
                prop_assert!(accepted.insert(counter), "counter {} accepted twice", counter);
                prop_assert!(state.accept(counter).is_err());
            }
        }
    }

    #[test]
    fn group_replay_exclusion(counters in proptest::collection::vec(any::<u32>(), 1..64)) {
        let mut state = ReceptionState::new(ReceptionPolicy::Group);
        for counter in counters {
            if state.accept(counter).is_ok() {
                prop_assert!(state.accept(counter).is_err());
            }
        }
    }

    #[test]
    fn nonce_is_deterministic_and_layout_stable(
        flags in any::<u8>(),
        counter in any::<u32>(),
        source in any::<u64>(),
    ) {
        let nonce = build_nonce(flags, counter, source);
        prop_assert_eq!(nonce, build_nonce(flags, counter, source));
        prop_assert_eq!(nonce[0], flags);
        let counter_bytes = counter.to_le_bytes();
        let source_bytes = source.to_le_bytes();
        prop_assert_eq!(&nonce[1..5], counter_bytes.as_slice());
        prop_assert_eq!(&nonce[5..13], source_bytes.as_slice());
    }
}
