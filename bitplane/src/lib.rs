//! Bit-packed storage for stabilizer simulation.
//!
//! Everything in this crate is built around [`BitBlock`], a 256-bit unit of
//! storage aligned so that LLVM can lower operations on it to SIMD
//! instructions. [`BitVec`] and [`BitMatrix`] are flat allocations of such
//! blocks; higher layers address individual bits or whole blocks through
//! them. [`transpose`] contains the blockwise bit-transpose kernels used to
//! switch a tiled bit matrix between row-major and column-major access.

pub mod bitblock;
pub mod bitmatrix;
pub mod bitvec;
pub mod boolmatrix;
pub mod transpose;

pub use bitblock::{BitBlock, Word, BLOCK_BITS, WORDS_PER_BLOCK};
pub use bitmatrix::BitMatrix;
pub use bitvec::{block_count, BitVec};
pub use boolmatrix::BoolMatrix;
pub use transpose::{transpose_64x64, transpose_tile_256, transpose_tiles};
