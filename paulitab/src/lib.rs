//! Pauli and stabilizer-tableau algebra for Clifford circuit simulation.
//!
//! A [`PauliString`] is an n-qubit Pauli operator with a ±1 sign, packed as
//! two bit vectors. A [`Tableau`] stores the images of all 2n single-qubit X
//! and Z observables under an accumulated Clifford, in four 256-bit-tiled
//! quadrants so that both row-oriented updates ([`Tableau::prepend_h`] and
//! friends) and column-oriented updates (the scoped
//! [`BlockTransposedTableau`]) stay word-parallel. [`Tableau::random`] draws
//! uniformly from the Clifford group via the Bravyi–Maslov Hadamard-free
//! decomposition.

pub mod pauli;
pub mod random;
pub mod tableau;
pub mod transposed;

pub use pauli::{PauliParseError, PauliString, PauliStringMut, PauliStringRef};
pub use random::sample_qmallows;
pub use tableau::{Tableau, GATE_TABLEAUS};
pub use transposed::BlockTransposedTableau;
