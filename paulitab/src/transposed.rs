use bitplane::{transpose_tiles, BitBlock, WORDS_PER_BLOCK};

use crate::tableau::{bit_address, ceil256, Tableau, X2X_QUAD, X2Z_QUAD, Z2X_QUAD, Z2Z_QUAD};

/// Scoped column-major view of a [`Tableau`].
///
/// Construction transposes every 256x256 tile of the four quadrants in
/// place; dropping the view transposes them back. While the view is live,
/// the two bit columns belonging to one input qubit are contiguous, so
/// appending a gate to the circuit history touches all 2n observables with a
/// word-parallel walk that also updates the sign vector in 256-bit chunks.
///
/// The exclusive borrow makes the bracket airtight: no row-major access can
/// happen while the view exists, and only one view per tableau can exist.
pub struct BlockTransposedTableau<'a> {
    tableau: &'a mut Tableau,
}

impl<'a> BlockTransposedTableau<'a> {
    pub fn new(tableau: &'a mut Tableau) -> Self {
        transpose_tiles(tableau.xz.blocks_mut());
        BlockTransposedTableau { tableau }
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.tableau.num_qubits
    }

    /// Block index of the first chunk of the transposed column of `qubit` in
    /// `quadrant`. Successive chunks are one tile column apart.
    fn column_base(&self, quadrant: usize, qubit: usize) -> usize {
        bit_address(0, qubit, self.tableau.tiles_per_side(), quadrant, true) >> 8
    }

    /// Blocks between successive chunks of one transposed column.
    fn column_stride(&self) -> usize {
        self.tableau.tiles_per_side() * 256
    }

    /// Sign chunks to walk: one 256-bit block per 256 observables, X halves
    /// first. The bit columns of the X2X/X2Z quadrants run straight into
    /// Z2X/Z2Z at the same stride, so one walk covers all 2n observables.
    fn sign_chunks(&self) -> usize {
        2 * self.tableau.tiles_per_side()
    }

    pub fn append_cx(&mut self, control: usize, target: usize) {
        assert_ne!(control, target);
        let control_x = self.column_base(X2X_QUAD, control);
        let control_z = self.column_base(X2Z_QUAD, control);
        let target_x = self.column_base(X2X_QUAD, target);
        let target_z = self.column_base(X2Z_QUAD, target);
        let stride = self.column_stride();
        let chunks = self.sign_chunks();
        let Tableau { xz, signs, .. } = &mut *self.tableau;
        let (xz, signs) = (xz.blocks_mut(), signs.blocks_mut());
        for chunk in 0..chunks {
            let offset = chunk * stride;
            let xc = xz[control_x + offset];
            let zc = xz[control_z + offset];
            let xt = xz[target_x + offset];
            let zt = xz[target_z + offset];
            for word in 0..WORDS_PER_BLOCK {
                signs[chunk].words[word] ^= (xc.words[word] & zt.words[word]) & !(zc.words[word] ^ xt.words[word]);
            }
            xz[control_z + offset] = xor_blocks(zc, zt);
            xz[target_x + offset] = xor_blocks(xt, xc);
        }
    }

    pub fn append_cz(&mut self, control: usize, target: usize) {
        assert_ne!(control, target);
        let control_x = self.column_base(X2X_QUAD, control);
        let control_z = self.column_base(X2Z_QUAD, control);
        let target_x = self.column_base(X2X_QUAD, target);
        let target_z = self.column_base(X2Z_QUAD, target);
        let stride = self.column_stride();
        let chunks = self.sign_chunks();
        let Tableau { xz, signs, .. } = &mut *self.tableau;
        let (xz, signs) = (xz.blocks_mut(), signs.blocks_mut());
        for chunk in 0..chunks {
            let offset = chunk * stride;
            let xc = xz[control_x + offset];
            let zc = xz[control_z + offset];
            let xt = xz[target_x + offset];
            let zt = xz[target_z + offset];
            for word in 0..WORDS_PER_BLOCK {
                signs[chunk].words[word] ^= xc.words[word] & xt.words[word] & (zc.words[word] ^ zt.words[word]);
            }
            xz[target_z + offset] = xor_blocks(zt, xc);
            xz[control_z + offset] = xor_blocks(zc, xt);
        }
    }

    pub fn append_h(&mut self, target: usize) {
        let target_x = self.column_base(X2X_QUAD, target);
        let target_z = self.column_base(X2Z_QUAD, target);
        let stride = self.column_stride();
        let chunks = self.sign_chunks();
        let Tableau { xz, signs, .. } = &mut *self.tableau;
        let (xz, signs) = (xz.blocks_mut(), signs.blocks_mut());
        for chunk in 0..chunks {
            let offset = chunk * stride;
            xz.swap(target_x + offset, target_z + offset);
            let x = xz[target_x + offset];
            let z = xz[target_z + offset];
            for word in 0..WORDS_PER_BLOCK {
                signs[chunk].words[word] ^= x.words[word] & z.words[word];
            }
        }
    }

    pub fn append_h_yz(&mut self, target: usize) {
        let target_x = self.column_base(X2X_QUAD, target);
        let target_z = self.column_base(X2Z_QUAD, target);
        let stride = self.column_stride();
        let chunks = self.sign_chunks();
        let Tableau { xz, signs, .. } = &mut *self.tableau;
        let (xz, signs) = (xz.blocks_mut(), signs.blocks_mut());
        for chunk in 0..chunks {
            let offset = chunk * stride;
            let x = xz[target_x + offset];
            let z = xz[target_z + offset];
            for word in 0..WORDS_PER_BLOCK {
                signs[chunk].words[word] ^= !z.words[word] & x.words[word];
            }
            xz[target_x + offset] = xor_blocks(x, z);
        }
    }

    pub fn append_x(&mut self, target: usize) {
        let target_z = self.column_base(X2Z_QUAD, target);
        let stride = self.column_stride();
        let chunks = self.sign_chunks();
        let Tableau { xz, signs, .. } = &mut *self.tableau;
        let (xz, signs) = (xz.blocks_mut(), signs.blocks_mut());
        for chunk in 0..chunks {
            let z = xz[target_z + chunk * stride];
            for word in 0..WORDS_PER_BLOCK {
                signs[chunk].words[word] ^= z.words[word];
            }
        }
    }

    pub fn append_z(&mut self, target: usize) {
        let target_x = self.column_base(X2X_QUAD, target);
        let stride = self.column_stride();
        let chunks = self.sign_chunks();
        let Tableau { xz, signs, .. } = &mut *self.tableau;
        let (xz, signs) = (xz.blocks_mut(), signs.blocks_mut());
        for chunk in 0..chunks {
            let x = xz[target_x + chunk * stride];
            for word in 0..WORDS_PER_BLOCK {
                signs[chunk].words[word] ^= x.words[word];
            }
        }
    }

    /// The x bit at `output_qubit` of the Z observable of `input_qubit`,
    /// read through the transposed addressing.
    #[must_use]
    pub fn z_obs_x_bit(&self, input_qubit: usize, output_qubit: usize) -> bool {
        self.tableau.xz.index(bit_address(
            input_qubit,
            output_qubit,
            self.tableau.tiles_per_side(),
            Z2X_QUAD,
            true,
        ))
    }

    /// The z bit at `output_qubit` of the Z observable of `input_qubit`.
    #[must_use]
    pub fn z_obs_z_bit(&self, input_qubit: usize, output_qubit: usize) -> bool {
        self.tableau.xz.index(bit_address(
            input_qubit,
            output_qubit,
            self.tableau.tiles_per_side(),
            Z2Z_QUAD,
            true,
        ))
    }

    #[must_use]
    pub fn z_sign(&self, qubit: usize) -> bool {
        self.tableau.signs.index(ceil256(self.tableau.num_qubits) + qubit)
    }
}

impl Drop for BlockTransposedTableau<'_> {
    fn drop(&mut self) {
        transpose_tiles(self.tableau.xz.blocks_mut());
    }
}

fn xor_blocks(mut left: BitBlock, right: BitBlock) -> BitBlock {
    left ^= &right;
    left
}
