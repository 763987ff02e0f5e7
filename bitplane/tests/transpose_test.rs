use bitplane::{transpose_64x64, transpose_tile_256, BitBlock};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn random_tile(rng: &mut impl Rng) -> Vec<BitBlock> {
    let mut tile = vec![BitBlock::default(); 256];
    for block in &mut tile {
        for word in block.words.iter_mut() {
            *word = rng.gen();
        }
    }
    tile
}

#[test]
fn transpose_64x64_known_pattern() {
    // row r = all ones up to column r, like a staircase
    let mut matrix = [0u64; 64];
    for (row, word) in matrix.iter_mut().enumerate() {
        *word = ((1u64 << row) - 1) | (1u64 << row);
    }
    transpose_64x64(&mut matrix);
    for row in 0..64 {
        for column in 0..64 {
            let expected = column >= row;
            assert_eq!((matrix[row] >> column) & 1 == 1, expected, "bit ({row}, {column})");
        }
    }
}

#[test]
fn tile_transpose_exchanges_coordinates() {
    let mut rng = SmallRng::seed_from_u64(99);
    let tile = random_tile(&mut rng);
    let mut transposed = tile.clone();
    transpose_tile_256(&mut transposed);
    for row in (0..256).step_by(7) {
        for column in (0..256).step_by(5) {
            assert_eq!(tile[row].index(column), transposed[column].index(row));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn transpose_64x64_is_involutive(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut matrix = [0u64; 64];
        for word in &mut matrix {
            *word = rng.gen();
        }
        let original = matrix;
        transpose_64x64(&mut matrix);
        transpose_64x64(&mut matrix);
        prop_assert_eq!(matrix, original);
    }

    #[test]
    fn tile_transpose_is_involutive(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let original = random_tile(&mut rng);
        let mut tile = original.clone();
        transpose_tile_256(&mut tile);
        transpose_tile_256(&mut tile);
        prop_assert_eq!(tile, original);
    }

    #[test]
    fn tile_transpose_preserves_popcount(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut tile = random_tile(&mut rng);
        let before: usize = tile.iter().map(BitBlock::popcount).sum();
        transpose_tile_256(&mut tile);
        let after: usize = tile.iter().map(BitBlock::popcount).sum();
        prop_assert_eq!(before, after);
    }
}
