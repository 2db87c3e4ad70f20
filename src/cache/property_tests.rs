//! Property-Based Tests for the Cache Core
//!
//! Uses proptest to verify the table, codec and frame-format properties.

use proptest::prelude::*;

use crate::cache::MemoryTable;
use crate::codec::{self, Decoded};
use crate::persist::{decode_frames, encode_frames};

// == Strategies ==
/// Generates fingerprint-style cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:-]{1,32}"
}

/// Generates opaque byte values, empty included
fn bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any serializable value, put-then-get through the codec and table
    // returns an equal value
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in ".{0,128}") {
        let table = MemoryTable::new(None);

        let bytes = codec::encode(&value).unwrap();
        table.insert(key.clone(), bytes);

        let stored = table.get(&key).expect("entry must be present");
        match codec::decode::<String>(&stored) {
            Decoded::Value(decoded) => prop_assert_eq!(decoded, value),
            other => prop_assert!(false, "expected value, got {:?}", other),
        }
    }

    // For any key, writing v1 then v2 leaves exactly one entry holding v2
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in bytes_strategy(),
        value2 in bytes_strategy()
    ) {
        let table = MemoryTable::new(None);

        table.insert(key.clone(), value1);
        table.insert(key.clone(), value2.clone());

        prop_assert_eq!(table.get(&key), Some(value2));
        prop_assert_eq!(table.len(), 1);
    }

    // For any insert sequence, a bounded table never exceeds its bound
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), bytes_strategy()), 1..100)
    ) {
        let max_entries = 20;
        let table = MemoryTable::new(Some(max_entries));

        for (key, value) in entries {
            table.insert(key, value);
            prop_assert!(
                table.len() <= max_entries,
                "table size {} exceeds bound {}",
                table.len(),
                max_entries
            );
        }
    }

    // Decoding any prefix of a valid file never panics or hard-errors, and
    // yields a prefix of the original entries - this is exactly the state a
    // crashed save leaves behind
    #[test]
    fn prop_truncated_file_yields_entry_prefix(
        entries in prop::collection::vec((key_strategy(), bytes_strategy()), 0..20),
        cut_seed in any::<prop::sample::Index>()
    ) {
        let encoded = encode_frames(&entries);
        let cut = cut_seed.index(encoded.len() + 1);

        let decoded = decode_frames(&encoded[..cut]).unwrap();
        prop_assert!(decoded.entries.len() <= entries.len());
        prop_assert_eq!(&entries[..decoded.entries.len()], &decoded.entries[..]);
        if cut == encoded.len() {
            prop_assert!(!decoded.truncated);
        }
    }

    // After any insert sequence, a snapshot-save cycle leaves the table
    // clean, and any further insert dirties it again
    #[test]
    fn prop_dirty_flag_discipline(
        before in prop::collection::vec((key_strategy(), bytes_strategy()), 1..20),
        after in (key_strategy(), bytes_strategy())
    ) {
        let table = MemoryTable::new(None);

        for (key, value) in before {
            table.insert(key, value);
        }
        prop_assert!(table.is_dirty());

        let (_, version) = table.snapshot();
        table.mark_saved(version);
        prop_assert!(!table.is_dirty());

        let (key, value) = after;
        table.insert(key, value);
        prop_assert!(table.is_dirty());
    }
}
