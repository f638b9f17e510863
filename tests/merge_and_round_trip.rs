//! Property-based tests for merge semantics and serialization round-tripping
//! across randomized parameter combinations.

use proptest::prelude::*;
use sketches::bbit_minhash::BBitMinHash;
use sketches::hyperloglog::HyperLogLog;
use sketches::hyperloglog_plus::HyperLogLogPlus;
use sketches::minhash::MinHash;

fn minhash_with(seed: u64, num_perm: usize, values: &[u64]) -> MinHash {
    let mut mh = MinHash::new(num_perm, seed).unwrap();
    for value in values {
        mh.digest(&value.to_le_bytes()).unwrap();
    }
    mh
}

fn hll_with(precision: u8, values: &[u32]) -> HyperLogLog {
    let mut hll = HyperLogLog::new(precision).unwrap();
    for value in values {
        hll.digest(&value.to_le_bytes()).unwrap();
    }
    hll
}

fn hllp_with(precision: u8, values: &[u64]) -> HyperLogLogPlus {
    let mut hll = HyperLogLogPlus::new(precision).unwrap();
    for value in values {
        hll.digest(&value.to_le_bytes()).unwrap();
    }
    hll
}

proptest! {
    #[test]
    fn minhash_merge_is_commutative_and_idempotent(
        num_perm in 8usize..128,
        seed in 0u64..10,
        left_values in prop::collection::vec(0u64..5_000, 0..200),
        right_values in prop::collection::vec(0u64..5_000, 0..200),
    ) {
        let left = minhash_with(seed, num_perm, &left_values);
        let right = minhash_with(seed, num_perm, &right_values);

        let mut ab = left.clone();
        ab.merge(&right).unwrap();
        let mut ba = right.clone();
        ba.merge(&left).unwrap();
        prop_assert_eq!(ab.registers(), ba.registers());

        let mut idempotent = ab.clone();
        idempotent.merge(&ab.clone()).unwrap();
        prop_assert_eq!(idempotent.registers(), ab.registers());
    }

    #[test]
    fn minhash_dump_load_round_trips(
        num_perm in 1usize..256,
        seed in 0u64..100,
        values in prop::collection::vec(0u64..10_000, 0..500),
    ) {
        let mh = minhash_with(seed, num_perm, &values);
        let bytes = mh.dump();
        prop_assert_eq!(bytes.len(), mh.bytesize());
        let loaded = MinHash::load(&bytes).unwrap();
        prop_assert_eq!(loaded, mh);
    }

    #[test]
    fn bbit_minhash_dump_load_round_trips(
        num_perm in 8usize..128,
        b in 1u8..=64,
        values in prop::collection::vec(0u64..5_000, 0..200),
    ) {
        let mh = minhash_with(1, num_perm, &values);
        let compressed = BBitMinHash::from_minhash(&mh, b).unwrap();
        let bytes = compressed.dump();
        prop_assert_eq!(bytes.len(), compressed.bytesize());
        let loaded = BBitMinHash::load(&bytes).unwrap();
        prop_assert_eq!(loaded, compressed);
    }

    #[test]
    fn hyperloglog_merge_is_commutative_and_idempotent(
        precision in 4u8..=14,
        left_values in prop::collection::vec(0u32..5_000, 0..200),
        right_values in prop::collection::vec(0u32..5_000, 0..200),
    ) {
        let left = hll_with(precision, &left_values);
        let right = hll_with(precision, &right_values);

        let mut ab = left.clone();
        ab.merge(&right).unwrap();
        let mut ba = right.clone();
        ba.merge(&left).unwrap();
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn hyperloglog_dump_load_round_trips(
        precision in 4u8..=16,
        values in prop::collection::vec(0u32..10_000, 0..500),
    ) {
        let hll = hll_with(precision, &values);
        let bytes = hll.dump();
        prop_assert_eq!(bytes.len(), hll.bytesize());
        let loaded = HyperLogLog::load(&bytes).unwrap();
        prop_assert_eq!(loaded, hll);
    }

    #[test]
    fn hyperloglog_plus_dump_load_round_trips(
        precision in 4u8..=18,
        values in prop::collection::vec(0u64..10_000, 0..500),
    ) {
        let hll = hllp_with(precision, &values);
        let bytes = hll.dump();
        prop_assert_eq!(bytes.len(), hll.bytesize());
        let loaded = HyperLogLogPlus::load(&bytes).unwrap();
        prop_assert_eq!(loaded, hll);
    }
}
