use bitplane::{block_count, BitBlock, BitVec, BLOCK_BITS};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[test]
fn allocation_rounds_up_to_blocks() {
    assert_eq!(block_count(0), 0);
    assert_eq!(block_count(1), 1);
    assert_eq!(block_count(256), 1);
    assert_eq!(block_count(257), 2);
    assert_eq!(BitVec::zeros(100).len(), BLOCK_BITS);
    assert_eq!(BitVec::zeros(257).len(), 2 * BLOCK_BITS);
}

#[test]
fn fresh_vector_is_zero() {
    let bits = BitVec::zeros(1000);
    assert!(bits.is_zero());
    assert_eq!(bits.popcount(), 0);
}

#[test]
fn random_fill_leaves_padding_zero() {
    let mut rng = SmallRng::seed_from_u64(3);
    let bits = BitVec::random(100, &mut rng);
    for index in 100..bits.len() {
        assert!(!bits.index(index), "padding bit {index} must stay zero");
    }
}

#[test]
fn equality_ignores_nothing_because_padding_is_zero() {
    let mut left = BitVec::zeros(300);
    let mut right = BitVec::zeros(300);
    left.assign_index(299, true);
    right.assign_index(299, true);
    assert_eq!(left, right);
    right.negate_index(0);
    assert_ne!(left, right);
}

#[test]
fn word_view_matches_bit_view() {
    let mut bits = BitVec::zeros(256);
    bits.assign_index(0, true);
    bits.assign_index(65, true);
    let words = bits.as_words();
    assert_eq!(words[0], 1);
    assert_eq!(words[1], 2);
    assert_eq!(words[2], 0);
}

#[test]
fn block_alignment_is_256_bits() {
    assert_eq!(std::mem::size_of::<BitBlock>(), 32);
    assert_eq!(std::mem::align_of::<BitBlock>(), 32);
}

proptest! {
    #[test]
    fn xor_is_involutive(seed in any::<u64>(), nbits in 1usize..2000) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let original = BitVec::random(nbits, &mut rng);
        let mask = BitVec::random(nbits, &mut rng);
        let mut bits = original.clone();
        bits.bitxor_assign(&mask);
        bits.bitxor_assign(&mask);
        prop_assert_eq!(bits, original);
    }

    #[test]
    fn popcount_matches_set_indices(indices in prop::collection::btree_set(0usize..1500, 0..64)) {
        let mut bits = BitVec::zeros(1500);
        for &index in &indices {
            bits.assign_index(index, true);
        }
        prop_assert_eq!(bits.popcount(), indices.len());
        for &index in &indices {
            prop_assert!(bits.index(index));
        }
    }

    #[test]
    fn and_never_raises_popcount(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut left = BitVec::random(777, &mut rng);
        let right = BitVec::random(777, &mut rng);
        let before = left.popcount();
        left.bitand_assign(&right);
        prop_assert!(left.popcount() <= before.min(right.popcount()));
    }
}
