use rand::Rng;

use crate::bitblock::{BitBlock, Word, WORDS_PER_BLOCK};
use crate::bitvec::block_count;

/// A rectangular bit matrix with 256-bit aligned rows.
///
/// Rows are stored contiguously with a stride of `block_count(columns)`
/// blocks, so row-level operations are word-parallel. The column capacity is
/// rounded up to a whole number of blocks; bits beyond the logical column
/// count stay zero.
#[must_use]
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitMatrix {
    blocks: Vec<BitBlock>,
    row_count: usize,
    column_count: usize,
    rowstride: usize,
}

/// XOR `src` into `dst`, block by block.
pub fn xor_row(dst: &mut [BitBlock], src: &[BitBlock]) {
    assert_eq!(dst.len(), src.len());
    for (dst_block, src_block) in dst.iter_mut().zip(src.iter()) {
        *dst_block ^= src_block;
    }
}

impl BitMatrix {
    pub fn zeros(row_count: usize, column_count: usize) -> Self {
        let rowstride = block_count(column_count);
        BitMatrix {
            blocks: vec![BitBlock::default(); row_count * rowstride],
            row_count,
            column_count,
            rowstride,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[BitBlock] {
        &self.blocks[row * self.rowstride..(row + 1) * self.rowstride]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [BitBlock] {
        &mut self.blocks[row * self.rowstride..(row + 1) * self.rowstride]
    }

    /// Disjoint mutable views of two rows.
    ///
    /// # Panics
    ///
    /// Panics if `first == second`.
    pub fn row_pair_mut(&mut self, first: usize, second: usize) -> (&mut [BitBlock], &mut [BitBlock]) {
        assert_ne!(first, second);
        let stride = self.rowstride;
        if first < second {
            let (head, tail) = self.blocks.split_at_mut(second * stride);
            (&mut head[first * stride..(first + 1) * stride], &mut tail[..stride])
        } else {
            let (head, tail) = self.blocks.split_at_mut(first * stride);
            (&mut tail[..stride], &mut head[second * stride..(second + 1) * stride])
        }
    }

    pub fn swap_rows(&mut self, first: usize, second: usize) {
        if first == second {
            return;
        }
        let (first_row, second_row) = self.row_pair_mut(first, second);
        first_row.swap_with_slice(second_row);
    }

    /// XOR the `source` row into the `destination` row.
    pub fn xor_row_into(&mut self, source: usize, destination: usize) {
        let (dst, src) = self.row_pair_mut(destination, source);
        xor_row(dst, src);
    }

    /// XOR a row of another matrix with the same column capacity into a row
    /// of this one.
    pub fn xor_row_into_from(&mut self, source: &BitMatrix, source_row: usize, destination: usize) {
        xor_row(self.row_mut(destination), source.row(source_row));
    }

    /// Complement every bit of a row. Only meaningful when the logical
    /// column count fills the row's blocks.
    pub fn complement_row(&mut self, row: usize) {
        for block in self.row_mut(row) {
            for word in block.words.iter_mut() {
                *word = !*word;
            }
        }
    }

    pub fn clear_row(&mut self, row: usize) {
        for block in self.row_mut(row) {
            block.clear();
        }
    }

    /// Fill the logical width of a row with uniformly random bits.
    pub fn randomize_row(&mut self, row: usize, rng: &mut impl Rng) {
        let column_count = self.column_count;
        let row = self.row_mut(row);
        let words: &mut [Word] =
            unsafe { std::slice::from_raw_parts_mut(row.as_mut_ptr().cast::<Word>(), row.len() * WORDS_PER_BLOCK) };
        rng.fill(words);
        let spare_bits = column_count % (Word::BITS as usize);
        let full_words = column_count / (Word::BITS as usize);
        if spare_bits != 0 {
            words[full_words] &= (1 << spare_bits) - 1;
        }
        for word in &mut words[full_words + usize::from(spare_bits != 0)..] {
            *word = 0;
        }
    }

    #[must_use]
    pub fn get(&self, (row, column): (usize, usize)) -> bool {
        self.row(row)[column / crate::BLOCK_BITS].index(column % crate::BLOCK_BITS)
    }

    pub fn set(&mut self, (row, column): (usize, usize), to: bool) {
        self.row_mut(row)[column / crate::BLOCK_BITS].assign_index(column % crate::BLOCK_BITS, to);
    }

    pub fn negate(&mut self, (row, column): (usize, usize)) {
        self.row_mut(row)[column / crate::BLOCK_BITS].negate_index(column % crate::BLOCK_BITS);
    }

    /// The words of a row, for direct 64-bit access.
    #[must_use]
    pub fn row_words(&self, row: usize) -> &[Word] {
        let row = self.row(row);
        unsafe { std::slice::from_raw_parts(row.as_ptr().cast::<Word>(), row.len() * WORDS_PER_BLOCK) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_pair_is_disjoint_in_both_orders() {
        let mut matrix = BitMatrix::zeros(4, 300);
        matrix.set((1, 299), true);
        {
            let (first, second) = matrix.row_pair_mut(3, 1);
            xor_row(first, second);
        }
        assert!(matrix.get((3, 299)));
        assert!(matrix.get((1, 299)));
    }

    #[test]
    fn randomize_row_respects_column_count() {
        let mut matrix = BitMatrix::zeros(2, 100);
        let mut rng = rand::rngs::mock::StepRng::new(!0, 0);
        matrix.randomize_row(0, &mut rng);
        for column in 0..100 {
            assert!(matrix.get((0, column)));
        }
        // padding bits beyond the logical width stay zero
        assert_eq!(matrix.row(0).iter().map(BitBlock::popcount).sum::<usize>(), 100);
        assert!(matrix.row(1).iter().all(BitBlock::is_zero));
    }
}
