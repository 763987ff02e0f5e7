use std::fmt;

use rand::Rng;

use crate::bitblock::{BitBlock, Word, BLOCK_BITS, WORDS_PER_BLOCK};

/// A fixed-size packed bit vector, rounded up to whole 256-bit blocks.
///
/// The allocation holds `block_count(nbits)` blocks, all zeroed on
/// construction. Lengths are always reported rounded up to the block size;
/// callers that need a logical length track it themselves. Every public
/// operation keeps the bits beyond any caller's logical length at zero, so
/// derived equality and popcounts behave as if the padding did not exist.
#[must_use]
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitVec {
    blocks: Vec<BitBlock>,
}

/// Number of 256-bit blocks needed to hold `nbits` bits.
#[must_use]
pub fn block_count(nbits: usize) -> usize {
    nbits.div_ceil(BLOCK_BITS)
}

impl BitVec {
    pub fn zeros(nbits: usize) -> Self {
        BitVec {
            blocks: vec![BitBlock::default(); block_count(nbits)],
        }
    }

    /// Fill the first `nbits` bits uniformly at random, leaving the rest zero.
    pub fn random(nbits: usize, rng: &mut impl Rng) -> Self {
        let mut result = Self::zeros(nbits);
        rng.fill(result.as_words_mut());
        result.mask_above(nbits);
        result
    }

    /// Rounded-up length in bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len() * BLOCK_BITS
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.blocks.iter().all(BitBlock::is_zero)
    }

    #[must_use]
    pub fn popcount(&self) -> usize {
        self.blocks.iter().map(BitBlock::popcount).sum()
    }

    /// Set all bits to zero.
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            block.clear();
        }
    }

    /// Zero every bit at position `nbits` or above.
    pub fn mask_above(&mut self, nbits: usize) {
        let words = self.as_words_mut();
        let full_words = nbits / Word::BITS as usize;
        let spare_bits = nbits % Word::BITS as usize;
        if spare_bits != 0 && full_words < words.len() {
            words[full_words] &= (1 << spare_bits) - 1;
        }
        let first_cleared = full_words + usize::from(spare_bits != 0);
        for word in &mut words[first_cleared..] {
            *word = 0;
        }
    }

    #[must_use]
    pub fn index(&self, index: usize) -> bool {
        self.blocks[index / BLOCK_BITS].index(index % BLOCK_BITS)
    }

    pub fn assign_index(&mut self, index: usize, to: bool) {
        self.blocks[index / BLOCK_BITS].assign_index(index % BLOCK_BITS, to);
    }

    pub fn negate_index(&mut self, index: usize) {
        self.blocks[index / BLOCK_BITS].negate_index(index % BLOCK_BITS);
    }

    pub fn bitxor_assign(&mut self, other: &BitVec) {
        assert_eq!(self.blocks.len(), other.blocks.len());
        for (block, other) in self.blocks.iter_mut().zip(other.blocks.iter()) {
            *block ^= other;
        }
    }

    pub fn bitand_assign(&mut self, other: &BitVec) {
        assert_eq!(self.blocks.len(), other.blocks.len());
        for (block, other) in self.blocks.iter_mut().zip(other.blocks.iter()) {
            *block &= other;
        }
    }

    #[must_use]
    pub fn blocks(&self) -> &[BitBlock] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [BitBlock] {
        &mut self.blocks
    }

    /// View the data as a flat slice of words (u64s) for SIMD kernels and
    /// fast serialization.
    #[must_use]
    pub fn as_words(&self) -> &[Word] {
        unsafe { std::slice::from_raw_parts(self.blocks.as_ptr().cast::<Word>(), self.blocks.len() * WORDS_PER_BLOCK) }
    }

    pub fn as_words_mut(&mut self) -> &mut [Word] {
        unsafe {
            std::slice::from_raw_parts_mut(self.blocks.as_mut_ptr().cast::<Word>(), self.blocks.len() * WORDS_PER_BLOCK)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(|index| self.index(index))
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<Iterator: IntoIterator<Item = bool>>(iterator: Iterator) -> Self {
        let bits: Vec<bool> = iterator.into_iter().collect();
        let mut result = BitVec::zeros(bits.len());
        for (index, bit) in bits.into_iter().enumerate() {
            result.assign_index(index, bit);
        }
        result
    }
}

impl fmt::Debug for BitVec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "BitVec[")?;
        for bit in self.iter() {
            write!(formatter, "{}", u8::from(bit))?;
        }
        write!(formatter, "]")
    }
}
