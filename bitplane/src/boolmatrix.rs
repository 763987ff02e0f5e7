use rand::Rng;

use crate::bitvec::BitVec;

/// A small dense square matrix over GF(2).
///
/// Row-oriented and deliberately simple: this type only exists to compose the
/// 2n x 2n symplectic matrices produced while sampling random Cliffords, where
/// n is a qubit count rather than a shot count. The hot-path bit types are
/// [`crate::BitVec`] and [`crate::BitMatrix`].
#[must_use]
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BoolMatrix {
    size: usize,
    rows: Vec<BitVec>,
}

impl BoolMatrix {
    pub fn zeros(size: usize) -> Self {
        BoolMatrix {
            size,
            rows: vec![BitVec::zeros(size); size],
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut result = Self::zeros(size);
        for index in 0..size {
            result.set(index, index, true);
        }
        result
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> bool {
        self.rows[row].index(column)
    }

    pub fn set(&mut self, row: usize, column: usize, to: bool) {
        self.rows[row].assign_index(column, to);
    }

    /// Fill every entry with an independent fair coin flip.
    pub fn randomize(&mut self, rng: &mut impl Rng) {
        let size = self.size;
        for row in &mut self.rows {
            *row = BitVec::random(size, rng);
        }
    }

    /// Matrix product over GF(2).
    ///
    /// # Panics
    ///
    /// Panics if the operand sizes differ.
    #[must_use]
    pub fn multiply(&self, rhs: &BoolMatrix) -> BoolMatrix {
        assert_eq!(self.size, rhs.size);
        let mut result = BoolMatrix::zeros(self.size);
        for (row_index, result_row) in result.rows.iter_mut().enumerate() {
            for column in 0..self.size {
                if self.get(row_index, column) {
                    result_row.bitxor_assign(&rhs.rows[column]);
                }
            }
        }
        result
    }

    #[must_use]
    pub fn transposed(&self) -> BoolMatrix {
        let mut result = BoolMatrix::zeros(self.size);
        for row in 0..self.size {
            for column in 0..self.size {
                if self.get(row, column) {
                    result.set(column, row, true);
                }
            }
        }
        result
    }

    /// Inverse of a lower-unitriangular matrix by forward substitution.
    ///
    /// # Panics
    ///
    /// Debug-asserts that the diagonal is all ones.
    #[must_use]
    pub fn inverted_lower_triangular(&self) -> BoolMatrix {
        let mut result = BoolMatrix::zeros(self.size);
        for row in 0..self.size {
            debug_assert!(self.get(row, row));
            result.set(row, row, true);
            for column in 0..row {
                if self.get(row, column) {
                    let (head, tail) = result.rows.split_at_mut(row);
                    tail[0].bitxor_assign(&head[column]);
                }
            }
        }
        result
    }

    /// Assemble a matrix of twice the size from four equally sized quadrants.
    pub fn from_quadrants(
        upper_left: &BoolMatrix,
        upper_right: &BoolMatrix,
        lower_left: &BoolMatrix,
        lower_right: &BoolMatrix,
    ) -> BoolMatrix {
        let size = upper_left.size;
        assert!(upper_right.size == size && lower_left.size == size && lower_right.size == size);
        let mut result = BoolMatrix::zeros(2 * size);
        for row in 0..size {
            for column in 0..size {
                result.set(row, column, upper_left.get(row, column));
                result.set(row, column + size, upper_right.get(row, column));
                result.set(row + size, column, lower_left.get(row, column));
                result.set(row + size, column + size, lower_right.get(row, column));
            }
        }
        result
    }

    pub fn swap_rows(&mut self, first: usize, second: usize) {
        self.rows.swap(first, second);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn identity_is_multiplicative_unit() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut matrix = BoolMatrix::zeros(9);
        matrix.randomize(&mut rng);
        let identity = BoolMatrix::identity(9);
        assert_eq!(identity.multiply(&matrix), matrix);
        assert_eq!(matrix.multiply(&identity), matrix);
    }

    #[test]
    fn lower_triangular_inverse_cancels() {
        let mut rng = SmallRng::seed_from_u64(11);
        let size = 17;
        let mut lower = BoolMatrix::identity(size);
        for row in 0..size {
            for column in 0..row {
                lower.set(row, column, rng.gen());
            }
        }
        let inverse = lower.inverted_lower_triangular();
        assert_eq!(lower.multiply(&inverse), BoolMatrix::identity(size));
    }

    #[test]
    fn transpose_is_involutive() {
        let mut rng = SmallRng::seed_from_u64(13);
        let mut matrix = BoolMatrix::zeros(21);
        matrix.randomize(&mut rng);
        assert_eq!(matrix.transposed().transposed(), matrix);
    }
}
