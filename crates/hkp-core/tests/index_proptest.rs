//! Property-based tests for the machine-readable index format.
//!
//! Generates arbitrary key records, including identity names full of
//! delimiter characters, and checks that encoding then decoding is lossless.

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use hkp_core::{decode_index, encode_index, IndexFlags, IndexIdentity, IndexKey, KeyIdSearch};

mod strategies {
    use super::*;

    /// Unix seconds within chrono's representable range, or unset
    pub fn time() -> impl Strategy<Value = Option<DateTime<Utc>>> {
        prop::option::of(0i64..4_102_444_800).prop_map(|t| t.and_then(|s| DateTime::from_timestamp(s, 0)))
    }

    pub fn flags() -> impl Strategy<Value = IndexFlags> {
        (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(r, d, e)| {
            let mut flags = IndexFlags::empty();
            if r {
                flags |= IndexFlags::REVOKED;
            }
            if d {
                flags |= IndexFlags::DISABLED;
            }
            if e {
                flags |= IndexFlags::EXPIRED;
            }
            flags
        })
    }

    /// Names biased toward characters that collide with the wire format
    pub fn name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9 <>@.]{0,40}",
            "[:%\\n\\r/?#ä€😀 ]{0,20}",
            any::<String>(),
        ]
    }

    pub fn identity() -> impl Strategy<Value = IndexIdentity> {
        (name(), time(), time(), flags()).prop_map(|(name, creation_time, expiration_time, flags)| {
            IndexIdentity {
                name,
                creation_time,
                expiration_time,
                flags,
            }
        })
    }

    pub fn key() -> impl Strategy<Value = IndexKey> {
        (
            time(),
            time(),
            any::<u8>(),
            any::<[u8; 20]>(),
            1u32..16384,
            flags(),
            prop::collection::vec(identity(), 0..4),
        )
            .prop_map(
                |(creation_time, expiration_time, algorithm, fingerprint, bit_length, flags, identities)| {
                    IndexKey {
                        creation_time,
                        expiration_time,
                        algorithm,
                        fingerprint,
                        bit_length,
                        flags,
                        identities,
                    }
                },
            )
    }
}

proptest! {
    #[test]
    fn index_roundtrip(keys in prop::collection::vec(strategies::key(), 0..5)) {
        let text = encode_index(&keys);
        prop_assert_eq!(decode_index(&text).unwrap(), keys);
    }

    #[test]
    fn uid_lines_have_five_fields(ident in strategies::identity()) {
        let key = IndexKey {
            creation_time: None,
            expiration_time: None,
            algorithm: 1,
            fingerprint: [0; 20],
            bit_length: 2048,
            flags: IndexFlags::empty(),
            identities: vec![ident],
        };
        let text = encode_index(&[key]);
        let uid = text.lines().find(|l| l.starts_with("uid:")).unwrap();
        prop_assert_eq!(uid.split(':').count(), 5);
    }

    #[test]
    fn key_id_search_never_panics(s in "\\PC*") {
        let _ = KeyIdSearch::parse(&s);
        let _ = KeyIdSearch::parse(&format!("0x{}", s));
    }

    #[test]
    fn fingerprint_search_views(fpr in any::<[u8; 20]>()) {
        let search = KeyIdSearch::parse(&format!("0x{}", hex::encode(fpr))).unwrap();
        prop_assert_eq!(search.fingerprint(), Some(fpr));
        let long = u64::from_be_bytes(fpr[12..].try_into().unwrap());
        prop_assert_eq!(search.key_id(), Some(long));
        prop_assert_eq!(search.key_id_short(), Some(long as u32));
    }
}
