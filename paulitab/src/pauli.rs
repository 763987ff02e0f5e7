use std::fmt;
use std::marker::PhantomData;
use std::ops::Mul;
use std::str::FromStr;

use bitplane::{block_count, BitBlock, BitVec, Word, WORDS_PER_BLOCK};
use rand::Rng;

/// A malformed Pauli string literal.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid pauli string character '{character}'")]
pub struct PauliParseError {
    pub character: char,
}

/// An n-qubit Pauli operator with a ±1 sign.
///
/// Qubit q holds one of I, X, Y, Z encoded by the bit pair
/// `(x_bits[q], z_bits[q])`: (0,0) is I, (1,0) is X, (0,1) is Z and (1,1) is
/// Y. The sign bit is true for −1. Products of such operators are always ±1
/// times another such operator; the factors of i that appear while
/// multiplying are tracked by a `log_i` counter whose final parity callers
/// assert.
#[must_use]
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PauliString {
    num_qubits: usize,
    sign: bool,
    x_bits: BitVec,
    z_bits: BitVec,
}

impl PauliString {
    pub fn identity(num_qubits: usize) -> Self {
        PauliString {
            num_qubits,
            sign: false,
            x_bits: BitVec::zeros(num_qubits),
            z_bits: BitVec::zeros(num_qubits),
        }
    }

    pub fn random(num_qubits: usize, rng: &mut impl Rng) -> Self {
        PauliString {
            num_qubits,
            sign: rng.gen(),
            x_bits: BitVec::random(num_qubits, rng),
            z_bits: BitVec::random(num_qubits, rng),
        }
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[must_use]
    pub fn sign(&self) -> bool {
        self.sign
    }

    pub fn set_sign(&mut self, sign: bool) {
        self.sign = sign;
    }

    pub fn toggle_sign_if(&mut self, condition: bool) {
        self.sign ^= condition;
    }

    #[must_use]
    pub fn x_bit(&self, qubit: usize) -> bool {
        self.x_bits.index(qubit)
    }

    #[must_use]
    pub fn z_bit(&self, qubit: usize) -> bool {
        self.z_bits.index(qubit)
    }

    pub fn set_x_bit(&mut self, qubit: usize, to: bool) {
        self.x_bits.assign_index(qubit, to);
    }

    pub fn set_z_bit(&mut self, qubit: usize, to: bool) {
        self.z_bits.assign_index(qubit, to);
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        !self.sign && self.x_bits.is_zero() && self.z_bits.is_zero()
    }

    /// Read-only view with the same layout the tableau row views use.
    #[must_use]
    pub fn as_ref(&self) -> PauliStringRef<'_> {
        PauliStringRef {
            num_qubits: self.num_qubits,
            sign: self.sign,
            bits: RawPauli {
                x: self.x_bits.blocks().as_ptr().cast_mut(),
                z: self.z_bits.blocks().as_ptr().cast_mut(),
                stride: 1,
            },
            _borrow: PhantomData,
        }
    }

    /// Whether `self` and `other` commute as operators; signs are irrelevant.
    ///
    /// # Panics
    ///
    /// Panics if the qubit counts differ.
    #[must_use]
    pub fn commutes(&self, other: &PauliString) -> bool {
        self.as_ref().commutes(&other.as_ref())
    }

    /// Multiply `self` on the right by `other`, returning the accumulated
    /// `log_i` phase exponent (mod 4). The sign bit of `other` is folded in;
    /// a caller who knows the product is ±1 times a Pauli asserts the low bit
    /// of the result is zero and applies bit 1 to the sign.
    pub fn inplace_right_mul_returning_log_i(&mut self, other: &PauliStringRef<'_>) -> u8 {
        assert_eq!(self.num_qubits, other.num_qubits);
        let chunks = block_count(self.num_qubits);
        let raw = RawPauli {
            x: self.x_bits.blocks_mut().as_mut_ptr(),
            z: self.z_bits.blocks_mut().as_mut_ptr(),
            stride: 1,
        };
        let log_i = unsafe { mul_bits_right(raw, other.bits, chunks) };
        self.sign ^= other.sign;
        log_i
    }

    /// Right-multiplication sugar: asserts the product is real and applies
    /// the resulting sign.
    pub fn mul_from(&mut self, other: &PauliStringRef<'_>) {
        let log_i = self.inplace_right_mul_returning_log_i(other);
        assert_eq!(log_i & 1, 0);
        self.sign ^= (log_i & 2) != 0;
    }
}

impl Mul<&PauliString> for &PauliString {
    type Output = PauliString;

    fn mul(self, rhs: &PauliString) -> PauliString {
        let mut result = self.clone();
        result.mul_from(&rhs.as_ref());
        result
    }
}

impl FromStr for PauliString {
    type Err = PauliParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut characters = text.chars().peekable();
        let sign = match characters.peek() {
            Some('+') => {
                characters.next();
                false
            }
            Some('-') => {
                characters.next();
                true
            }
            _ => false,
        };
        let body: Vec<char> = characters.collect();
        let mut result = PauliString::identity(body.len());
        result.sign = sign;
        for (qubit, character) in body.into_iter().enumerate() {
            match character {
                'I' | '_' => {}
                'X' => result.set_x_bit(qubit, true),
                'Y' => {
                    result.set_x_bit(qubit, true);
                    result.set_z_bit(qubit, true);
                }
                'Z' => result.set_z_bit(qubit, true),
                character => return Err(PauliParseError { character }),
            }
        }
        Ok(result)
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", if self.sign { '-' } else { '+' })?;
        for qubit in 0..self.num_qubits {
            let character = match (self.x_bit(qubit), self.z_bit(qubit)) {
                (false, false) => '_',
                (true, false) => 'X',
                (true, true) => 'Y',
                (false, true) => 'Z',
            };
            write!(formatter, "{character}")?;
        }
        Ok(())
    }
}

/// Raw location of a Pauli's bit storage: the x and z bit planes each consist
/// of `ceil(n / 256)` blocks spaced `stride` blocks apart. Owned strings are
/// contiguous (stride 1); tableau rows hop one 256x256 tile per chunk.
#[derive(Clone, Copy)]
pub(crate) struct RawPauli {
    pub x: *mut BitBlock,
    pub z: *mut BitBlock,
    pub stride: usize,
}

impl RawPauli {
    #[inline]
    unsafe fn x_chunk(&self, chunk: usize) -> *mut BitBlock {
        self.x.add(chunk * self.stride)
    }

    #[inline]
    unsafe fn z_chunk(&self, chunk: usize) -> *mut BitBlock {
        self.z.add(chunk * self.stride)
    }
}

/// Location of one sign bit inside a packed word array.
#[derive(Clone, Copy)]
pub(crate) struct BitPtr {
    pub word: *mut Word,
    pub mask: Word,
}

impl BitPtr {
    pub(crate) fn new(words: *mut Word, bit_index: usize) -> Self {
        BitPtr {
            word: unsafe { words.add(bit_index / Word::BITS as usize) },
            mask: 1 << (bit_index % Word::BITS as usize),
        }
    }

    pub(crate) fn get(&self) -> bool {
        unsafe { (*self.word & self.mask) != 0 }
    }

    pub(crate) fn toggle(&self) {
        unsafe { *self.word ^= self.mask };
    }

    pub(crate) fn toggle_if(&self, condition: bool) {
        if condition {
            self.toggle();
        }
    }

    pub(crate) fn set(&self, to: bool) {
        unsafe {
            if to {
                *self.word |= self.mask;
            } else {
                *self.word &= !self.mask;
            }
        }
    }
}

/// Read-only view of a Pauli operator, possibly strided into tableau storage.
#[derive(Clone, Copy)]
pub struct PauliStringRef<'a> {
    pub(crate) num_qubits: usize,
    pub(crate) sign: bool,
    pub(crate) bits: RawPauli,
    pub(crate) _borrow: PhantomData<&'a ()>,
}

impl PauliStringRef<'_> {
    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[must_use]
    pub fn sign(&self) -> bool {
        self.sign
    }

    #[must_use]
    pub fn x_bit(&self, qubit: usize) -> bool {
        assert!(qubit < self.num_qubits);
        unsafe { (*self.bits.x_chunk(qubit / 256)).index(qubit % 256) }
    }

    #[must_use]
    pub fn z_bit(&self, qubit: usize) -> bool {
        assert!(qubit < self.num_qubits);
        unsafe { (*self.bits.z_chunk(qubit / 256)).index(qubit % 256) }
    }

    /// Whether two equally sized Paulis commute. Word-parallel: the popcount
    /// parity of `x1&z2 ^ z1&x2` survives XOR folding across words.
    #[must_use]
    pub fn commutes(&self, other: &PauliStringRef<'_>) -> bool {
        assert_eq!(self.num_qubits, other.num_qubits);
        let chunks = block_count(self.num_qubits);
        let mut folded = 0u64;
        for chunk in 0..chunks {
            unsafe {
                let x1 = &*self.bits.x_chunk(chunk);
                let z1 = &*self.bits.z_chunk(chunk);
                let x2 = &*other.bits.x_chunk(chunk);
                let z2 = &*other.bits.z_chunk(chunk);
                for word in 0..WORDS_PER_BLOCK {
                    folded ^= (x1.words[word] & z2.words[word]) ^ (z1.words[word] & x2.words[word]);
                }
            }
        }
        folded.count_ones() % 2 == 0
    }

    #[must_use]
    pub fn to_owned(&self) -> PauliString {
        let mut result = PauliString::identity(self.num_qubits);
        result.sign = self.sign;
        let chunks = block_count(self.num_qubits);
        for chunk in 0..chunks {
            unsafe {
                result.x_bits.blocks_mut()[chunk] = *self.bits.x_chunk(chunk);
                result.z_bits.blocks_mut()[chunk] = *self.bits.z_chunk(chunk);
            }
        }
        result
    }

    /// Copy the bit pairs at `qubits` into the low qubits of `target`.
    pub fn gather_into(&self, target: &mut PauliString, qubits: &[usize]) {
        assert_eq!(target.num_qubits(), qubits.len());
        for (gathered, &scattered) in qubits.iter().enumerate() {
            target.set_x_bit(gathered, self.x_bit(scattered));
            target.set_z_bit(gathered, self.z_bit(scattered));
        }
    }
}

/// Mutable view of a Pauli operator; aliases tableau storage, so at most one
/// mutable view per observable is live at a time.
pub struct PauliStringMut<'a> {
    pub(crate) num_qubits: usize,
    pub(crate) sign: BitPtr,
    pub(crate) bits: RawPauli,
    pub(crate) _borrow: PhantomData<&'a mut ()>,
}

impl PauliStringMut<'_> {
    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[must_use]
    pub fn as_ref(&self) -> PauliStringRef<'_> {
        PauliStringRef {
            num_qubits: self.num_qubits,
            sign: self.sign.get(),
            bits: self.bits,
            _borrow: PhantomData,
        }
    }

    #[must_use]
    pub fn sign(&self) -> bool {
        self.sign.get()
    }

    pub fn set_sign(&mut self, to: bool) {
        self.sign.set(to);
    }

    pub fn toggle_sign(&mut self) {
        self.sign.toggle();
    }

    #[must_use]
    pub fn x_bit(&self, qubit: usize) -> bool {
        self.as_ref().x_bit(qubit)
    }

    #[must_use]
    pub fn z_bit(&self, qubit: usize) -> bool {
        self.as_ref().z_bit(qubit)
    }

    pub fn set_x_bit(&mut self, qubit: usize, to: bool) {
        assert!(qubit < self.num_qubits);
        unsafe { (*self.bits.x_chunk(qubit / 256)).assign_index(qubit % 256, to) };
    }

    pub fn set_z_bit(&mut self, qubit: usize, to: bool) {
        assert!(qubit < self.num_qubits);
        unsafe { (*self.bits.z_chunk(qubit / 256)).assign_index(qubit % 256, to) };
    }

    /// See [`PauliString::inplace_right_mul_returning_log_i`].
    pub fn inplace_right_mul_returning_log_i(&mut self, other: &PauliStringRef<'_>) -> u8 {
        assert_eq!(self.num_qubits, other.num_qubits);
        let chunks = block_count(self.num_qubits);
        let log_i = unsafe { mul_bits_right(self.bits, other.bits, chunks) };
        self.sign.toggle_if(other.sign);
        log_i
    }

    /// Right-multiplication sugar over the above; the product must be real.
    pub fn mul_from(&mut self, other: &PauliStringRef<'_>) {
        let log_i = self.inplace_right_mul_returning_log_i(other);
        assert_eq!(log_i & 1, 0);
        self.sign.toggle_if((log_i & 2) != 0);
    }

    /// Swap two equally sized Paulis, bits and signs. The views may share
    /// backing storage but must not describe the same observable.
    pub fn swap_with(&mut self, other: &mut PauliStringMut<'_>) {
        assert_eq!(self.num_qubits, other.num_qubits);
        let chunks = block_count(self.num_qubits);
        unsafe {
            for chunk in 0..chunks {
                std::ptr::swap(self.bits.x_chunk(chunk), other.bits.x_chunk(chunk));
                std::ptr::swap(self.bits.z_chunk(chunk), other.bits.z_chunk(chunk));
            }
        }
        let self_sign = self.sign.get();
        let other_sign = other.sign.get();
        self.sign.set(other_sign);
        other.sign.set(self_sign);
    }

    /// Overwrite this view with `other`, bits and sign.
    pub fn overwrite_with(&mut self, other: &PauliStringRef<'_>) {
        assert_eq!(self.num_qubits, other.num_qubits);
        let chunks = block_count(self.num_qubits);
        unsafe {
            for chunk in 0..chunks {
                *self.bits.x_chunk(chunk) = *other.bits.x_chunk(chunk);
                *self.bits.z_chunk(chunk) = *other.bits.z_chunk(chunk);
            }
        }
        self.sign.set(other.sign);
    }

    /// Overwrite the bit pairs at `qubits` with the low qubits of `source`,
    /// folding the source sign into this view's sign.
    pub fn scatter_into(&mut self, source: &PauliString, qubits: &[usize]) {
        assert_eq!(source.num_qubits(), qubits.len());
        for (gathered, &scattered) in qubits.iter().enumerate() {
            self.set_x_bit(scattered, source.x_bit(gathered));
            self.set_z_bit(scattered, source.z_bit(gathered));
        }
        self.sign.toggle_if(source.sign());
    }
}

/// Word-parallel in-place right multiplication of the bit planes, returning
/// the accumulated `log_i` exponent (mod 4). Signs are not touched.
///
/// Per qubit, writing each operand as i^(x·z)·X^x·Z^z, the product
/// contributes x1·z1 + x2·z2 + 2·(z1·x2) − x3·z3 factors of i, where
/// (x3, z3) is the XOR of the operand bits. The four popcounts are summed
/// across all words; the subtraction is exact mod 4 under wrapping
/// arithmetic.
pub(crate) unsafe fn mul_bits_right(destination: RawPauli, source: RawPauli, chunks: usize) -> u8 {
    let mut count_y_destination = 0u64;
    let mut count_y_source = 0u64;
    let mut count_anticommuting = 0u64;
    let mut count_y_product = 0u64;
    for chunk in 0..chunks {
        let destination_x = destination.x_chunk(chunk);
        let destination_z = destination.z_chunk(chunk);
        let source_x = &*source.x_chunk(chunk);
        let source_z = &*source.z_chunk(chunk);
        for word in 0..WORDS_PER_BLOCK {
            let x1 = (*destination_x).words[word];
            let z1 = (*destination_z).words[word];
            let x2 = source_x.words[word];
            let z2 = source_z.words[word];
            let x3 = x1 ^ x2;
            let z3 = z1 ^ z2;
            count_y_destination += (x1 & z1).count_ones() as u64;
            count_y_source += (x2 & z2).count_ones() as u64;
            count_anticommuting += (z1 & x2).count_ones() as u64;
            count_y_product += (x3 & z3).count_ones() as u64;
            (*destination_x).words[word] = x3;
            (*destination_z).words[word] = z3;
        }
    }
    let log_i = (count_y_destination + count_y_source + 2 * count_anticommuting).wrapping_sub(count_y_product);
    (log_i & 3) as u8
}
