use bitplane::BoolMatrix;
use rand::Rng;

use crate::tableau::{ceil256, Tableau};

/// Samples a vector of bits and a permutation from a skewed distribution.
///
/// Reference:
///     "Hadamard-free circuits expose the structure of the Clifford group"
///     Sergey Bravyi, Dmitri Maslov
///     https://arxiv.org/abs/2003.09412
pub fn sample_qmallows(num_qubits: usize, rng: &mut impl Rng) -> (Vec<bool>, Vec<usize>) {
    let mut hada = Vec::with_capacity(num_qubits);
    let mut permutation = Vec::with_capacity(num_qubits);
    let mut remaining_indices: Vec<usize> = (0..num_qubits).collect();
    for _ in 0..num_qubits {
        let remaining = remaining_indices.len();
        let uniform: f64 = rng.gen();
        let epsilon = 4f64.powi(-(remaining as i32));
        let raw = -(uniform + (1.0 - uniform) * epsilon).log2().ceil();
        // uniform can be exactly zero, which lands on the closed end 2m.
        let mut index = (raw as usize).min(2 * remaining - 1);
        hada.push(index < remaining);
        if index >= remaining {
            index = 2 * remaining - index - 1;
        }
        permutation.push(remaining_indices.remove(index));
    }
    (hada, permutation)
}

/// Samples a uniformly random symplectic 2n x 2n matrix over GF(2).
///
/// Composes F' · (permuted-hadamard'd F) where F and F' are built from
/// random symmetric and lower-unitriangular factors, with the factors of F'
/// masked by patterns that depend on the Q-Mallows draw.
fn random_symplectic_raw(num_qubits: usize, rng: &mut impl Rng) -> BoolMatrix {
    let (hada, perm) = sample_qmallows(num_qubits, rng);

    let mut symmetric = BoolMatrix::zeros(num_qubits);
    for col in 0..num_qubits {
        symmetric.set(col, col, rng.gen());
        for row in col + 1..num_qubits {
            let bit: bool = rng.gen();
            symmetric.set(row, col, bit);
            symmetric.set(col, row, bit);
        }
    }

    let mut symmetric_m = BoolMatrix::zeros(num_qubits);
    for col in 0..num_qubits {
        symmetric_m.set(col, col, rng.gen::<bool>() && hada[col]);
        for row in col + 1..num_qubits {
            let mut bit = hada[row] && hada[col];
            bit |= hada[row] > hada[col] && perm[row] < perm[col];
            bit |= hada[row] < hada[col] && perm[row] > perm[col];
            bit &= rng.gen::<bool>();
            symmetric_m.set(row, col, bit);
            symmetric_m.set(col, row, bit);
        }
    }

    let mut lower = BoolMatrix::identity(num_qubits);
    for col in 0..num_qubits {
        for row in col + 1..num_qubits {
            lower.set(row, col, rng.gen());
        }
    }

    let mut lower_m = BoolMatrix::identity(num_qubits);
    for col in 0..num_qubits {
        for row in col + 1..num_qubits {
            let mut bit = hada[row] < hada[col];
            bit |= hada[row] && hada[col] && perm[row] > perm[col];
            bit |= !hada[row] && !hada[col] && perm[row] < perm[col];
            bit &= rng.gen::<bool>();
            lower_m.set(row, col, bit);
        }
    }

    let prod = symmetric.multiply(&lower);
    let prod_m = symmetric_m.multiply(&lower_m);

    let inv = lower.inverted_lower_triangular().transposed();
    let inv_m = lower_m.inverted_lower_triangular().transposed();

    let zero = BoolMatrix::zeros(num_qubits);
    let fused = BoolMatrix::from_quadrants(&lower, &zero, &prod, &inv);
    let fused_m = BoolMatrix::from_quadrants(&lower_m, &zero, &prod_m, &inv_m);

    let mut composed = BoolMatrix::zeros(2 * num_qubits);
    // Apply the permutation to both halves.
    for row in 0..num_qubits {
        for col in 0..2 * num_qubits {
            composed.set(row, col, fused.get(perm[row], col));
            composed.set(row + num_qubits, col, fused.get(perm[row] + num_qubits, col));
        }
    }
    // Apply the Hadamard layer: swap rows i and i + n wherever hada[i].
    for row in 0..num_qubits {
        if hada[row] {
            composed.swap_rows(row, row + num_qubits);
        }
    }

    fused_m.multiply(&composed)
}

impl Tableau {
    /// Draw a tableau uniformly at random from the n-qubit Clifford group.
    ///
    /// The symplectic part comes from the Bravyi–Maslov Hadamard-free
    /// decomposition; the 2n signs are independent fair coin flips. The
    /// caller's generator is used throughout so results are reproducible
    /// from a single seed.
    pub fn random(num_qubits: usize, rng: &mut impl Rng) -> Tableau {
        let raw = random_symplectic_raw(num_qubits, rng);
        let mut result = Tableau::identity(num_qubits);
        for row in 0..num_qubits {
            {
                let mut x_obs = result.x_obs_mut(row);
                for col in 0..num_qubits {
                    x_obs.set_x_bit(col, raw.get(row, col));
                    x_obs.set_z_bit(col, raw.get(row, col + num_qubits));
                }
            }
            let mut z_obs = result.z_obs_mut(row);
            for col in 0..num_qubits {
                z_obs.set_x_bit(col, raw.get(row + num_qubits, col));
                z_obs.set_z_bit(col, raw.get(row + num_qubits, col + num_qubits));
            }
        }
        for row in 0..num_qubits {
            result.signs.assign_index(row, rng.gen());
            result.signs.assign_index(ceil256(num_qubits) + row, rng.gen());
        }
        debug_assert!(result.satisfies_invariants());
        result
    }
}
