use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::LazyLock;

use bitplane::{block_count, BitBlock, BitVec, Word, BLOCK_BITS};

use crate::pauli::{BitPtr, PauliString, PauliStringMut, PauliStringRef, RawPauli};

pub(crate) const X2X_QUAD: usize = 0;
pub(crate) const Z2X_QUAD: usize = 1;
pub(crate) const X2Z_QUAD: usize = 2;
pub(crate) const Z2Z_QUAD: usize = 3;

/// Qubit count rounded up to a whole 256-qubit tile.
pub(crate) fn ceil256(num_qubits: usize) -> usize {
    block_count(num_qubits) * BLOCK_BITS
}

/// Locate one bit of the quadrant-packed tableau data.
///
/// Row-major: the 256 bits of output-qubit coordinates inside a tile are
/// contiguous and tiles are arranged column-major by 256-qubit block, so each
/// observable's row hops one tile (256 blocks) per chunk. In the transposed
/// layout the two in-tile coordinates swap roles and the tile arrangement is
/// unchanged.
pub(crate) fn bit_address(
    input_qubit: usize,
    output_qubit: usize,
    tiles_per_side: usize,
    quadrant: usize,
    transposed: bool,
) -> usize {
    let mut col_low = input_qubit & 0xFF;
    let mut row_low = output_qubit & 0xFF;
    if transposed {
        std::mem::swap(&mut col_low, &mut row_low);
    }
    let bit_offset = row_low | (col_low << 8);

    let col_block = input_qubit >> 8;
    let row_block = output_qubit >> 8;
    let block_index = row_block + col_block * tiles_per_side;

    bit_offset + (block_index << 16) + quadrant * tiles_per_side * tiles_per_side * (1 << 16)
}

/// A 2n-row stabilizer tableau: the images of X_0..X_{n-1} and Z_0..Z_{n-1}
/// under the Clifford accumulated so far.
///
/// The bits live in four n x n quadrants (X2X, Z2X, X2Z, Z2Z), each tiled
/// into 256x256 blocks addressed by [`bit_address`]; the signs of the 2n
/// observables live in a separate vector, X signs first. The quadrant order
/// puts the x-halves of both observable families adjacent, so a single
/// linear walk of the sign vector matches a linear walk of the bit columns
/// during appends. The tableau is mutated only in place; no reallocation
/// happens after construction.
#[must_use]
#[derive(Clone, PartialEq, Eq)]
pub struct Tableau {
    pub(crate) num_qubits: usize,
    pub(crate) xz: BitVec,
    pub(crate) signs: BitVec,
}

/// Raw pointers into one tableau's storage, from which disjoint observable
/// views are carved. Obtained from an exclusive borrow; the caller guarantees
/// that simultaneously live mutable views describe distinct observables.
#[derive(Clone, Copy)]
pub(crate) struct RawTableau {
    xz: *mut BitBlock,
    signs: *mut Word,
    num_qubits: usize,
    tiles_per_side: usize,
}

impl RawTableau {
    unsafe fn obs_bits(&self, quad_x: usize, quad_z: usize, qubit: usize) -> RawPauli {
        let x_base = bit_address(qubit, 0, self.tiles_per_side, quad_x, false) >> 8;
        let z_base = bit_address(qubit, 0, self.tiles_per_side, quad_z, false) >> 8;
        RawPauli {
            x: self.xz.add(x_base),
            z: self.xz.add(z_base),
            stride: 256,
        }
    }

    pub(crate) unsafe fn x_obs_mut<'a>(&self, qubit: usize) -> PauliStringMut<'a> {
        PauliStringMut {
            num_qubits: self.num_qubits,
            sign: BitPtr::new(self.signs, qubit),
            bits: self.obs_bits(X2X_QUAD, X2Z_QUAD, qubit),
            _borrow: PhantomData,
        }
    }

    pub(crate) unsafe fn z_obs_mut<'a>(&self, qubit: usize) -> PauliStringMut<'a> {
        PauliStringMut {
            num_qubits: self.num_qubits,
            sign: BitPtr::new(self.signs, self.tiles_per_side * BLOCK_BITS + qubit),
            bits: self.obs_bits(Z2X_QUAD, Z2Z_QUAD, qubit),
            _borrow: PhantomData,
        }
    }

    pub(crate) unsafe fn x_obs<'a>(&self, qubit: usize) -> PauliStringRef<'a> {
        self.x_obs_mut(qubit).as_ref().copy_lifetime()
    }

    pub(crate) unsafe fn z_obs<'a>(&self, qubit: usize) -> PauliStringRef<'a> {
        self.z_obs_mut(qubit).as_ref().copy_lifetime()
    }
}

impl PauliStringRef<'_> {
    pub(crate) fn copy_lifetime<'b>(self) -> PauliStringRef<'b> {
        PauliStringRef {
            num_qubits: self.num_qubits,
            sign: self.sign,
            bits: self.bits,
            _borrow: PhantomData,
        }
    }
}

impl Tableau {
    /// The identity tableau: every observable maps to itself with sign +.
    pub fn identity(num_qubits: usize) -> Self {
        let tiles_per_side = block_count(num_qubits);
        let rounded = ceil256(num_qubits);
        let mut tableau = Tableau {
            num_qubits,
            xz: BitVec::zeros(4 * rounded * rounded),
            signs: BitVec::zeros(2 * rounded),
        };
        for qubit in 0..num_qubits {
            tableau
                .xz
                .assign_index(bit_address(qubit, qubit, tiles_per_side, X2X_QUAD, false), true);
            tableau
                .xz
                .assign_index(bit_address(qubit, qubit, tiles_per_side, Z2Z_QUAD, false), true);
        }
        tableau
    }

    /// A single-qubit gate tableau from its images of X and Z.
    ///
    /// # Panics
    ///
    /// Panics if either literal is not a signed one-qubit Pauli.
    pub fn gate1(x_image: &str, z_image: &str) -> Self {
        let mut tableau = Tableau::identity(1);
        tableau.x_obs_mut(0).overwrite_with(&x_image.parse::<PauliString>().unwrap().as_ref());
        tableau.z_obs_mut(0).overwrite_with(&z_image.parse::<PauliString>().unwrap().as_ref());
        tableau
    }

    /// A two-qubit gate tableau from its images of X1, Z1, X2, Z2.
    pub fn gate2(x1_image: &str, z1_image: &str, x2_image: &str, z2_image: &str) -> Self {
        let mut tableau = Tableau::identity(2);
        tableau.x_obs_mut(0).overwrite_with(&x1_image.parse::<PauliString>().unwrap().as_ref());
        tableau.z_obs_mut(0).overwrite_with(&z1_image.parse::<PauliString>().unwrap().as_ref());
        tableau.x_obs_mut(1).overwrite_with(&x2_image.parse::<PauliString>().unwrap().as_ref());
        tableau.z_obs_mut(1).overwrite_with(&z2_image.parse::<PauliString>().unwrap().as_ref());
        tableau
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub(crate) fn tiles_per_side(&self) -> usize {
        block_count(self.num_qubits)
    }

    fn raw(&self) -> RawTableau {
        RawTableau {
            xz: self.xz.blocks().as_ptr().cast_mut(),
            signs: self.signs.as_words().as_ptr().cast_mut(),
            num_qubits: self.num_qubits,
            tiles_per_side: self.tiles_per_side(),
        }
    }

    fn raw_mut(&mut self) -> RawTableau {
        RawTableau {
            xz: self.xz.blocks_mut().as_mut_ptr(),
            signs: self.signs.as_words_mut().as_mut_ptr(),
            num_qubits: self.num_qubits,
            tiles_per_side: self.tiles_per_side(),
        }
    }

    /// View of the image of X at `qubit`, with its sign.
    #[must_use]
    pub fn x_obs(&self, qubit: usize) -> PauliStringRef<'_> {
        assert!(qubit < self.num_qubits);
        unsafe { self.raw().x_obs(qubit) }
    }

    /// View of the image of Z at `qubit`, with its sign.
    #[must_use]
    pub fn z_obs(&self, qubit: usize) -> PauliStringRef<'_> {
        assert!(qubit < self.num_qubits);
        unsafe { self.raw().z_obs(qubit) }
    }

    pub fn x_obs_mut(&mut self, qubit: usize) -> PauliStringMut<'_> {
        assert!(qubit < self.num_qubits);
        unsafe { self.raw_mut().x_obs_mut(qubit) }
    }

    pub fn z_obs_mut(&mut self, qubit: usize) -> PauliStringMut<'_> {
        assert!(qubit < self.num_qubits);
        unsafe { self.raw_mut().z_obs_mut(qubit) }
    }

    /// Sign of the Z observable at `qubit`.
    #[must_use]
    pub fn z_sign(&self, qubit: usize) -> bool {
        assert!(qubit < self.num_qubits);
        self.signs.index(ceil256(self.num_qubits) + qubit)
    }

    /// The image of Y at `qubit`, derived from the X and Z images via
    /// Y = iXZ.
    pub fn eval_y_obs(&self, qubit: usize) -> PauliString {
        let mut result = self.x_obs(qubit).to_owned();
        let mut log_i = result.inplace_right_mul_returning_log_i(&self.z_obs(qubit));
        log_i = log_i.wrapping_add(1);
        assert_eq!(log_i & 1, 0);
        result.toggle_sign_if(log_i & 2 != 0);
        result
    }

    // ========== Prepend gates ==========
    //
    // Each prepend_* updates the tableau as if the named gate were inserted
    // at the front of the circuit history: every stored observable is
    // replaced by its image under the gate, which only touches the rows of
    // the targeted qubits.

    pub fn prepend_h(&mut self, qubit: usize) {
        assert!(qubit < self.num_qubits);
        let raw = self.raw_mut();
        let mut x = unsafe { raw.x_obs_mut(qubit) };
        let mut z = unsafe { raw.z_obs_mut(qubit) };
        x.swap_with(&mut z);
    }

    pub fn prepend_h_xy(&mut self, qubit: usize) {
        assert!(qubit < self.num_qubits);
        let raw = self.raw_mut();
        let mut x = unsafe { raw.x_obs_mut(qubit) };
        let mut z = unsafe { raw.z_obs_mut(qubit) };
        let log_i = 1u8.wrapping_add(x.inplace_right_mul_returning_log_i(&z.as_ref()));
        debug_assert_eq!(log_i & 1, 0);
        z.toggle_sign();
        if log_i & 2 != 0 {
            x.toggle_sign();
        }
    }

    pub fn prepend_h_yz(&mut self, qubit: usize) {
        assert!(qubit < self.num_qubits);
        let raw = self.raw_mut();
        let mut x = unsafe { raw.x_obs_mut(qubit) };
        let mut z = unsafe { raw.z_obs_mut(qubit) };
        let log_i = 3u8.wrapping_add(z.inplace_right_mul_returning_log_i(&x.as_ref()));
        debug_assert_eq!(log_i & 1, 0);
        x.toggle_sign();
        if log_i & 2 != 0 {
            z.toggle_sign();
        }
    }

    pub fn prepend_x(&mut self, qubit: usize) {
        self.z_obs_mut(qubit).toggle_sign();
    }

    pub fn prepend_y(&mut self, qubit: usize) {
        self.x_obs_mut(qubit).toggle_sign();
        self.z_obs_mut(qubit).toggle_sign();
    }

    pub fn prepend_z(&mut self, qubit: usize) {
        self.x_obs_mut(qubit).toggle_sign();
    }

    pub fn prepend_sqrt_x(&mut self, qubit: usize) {
        self.prepend_sqrt_x_phased(qubit, 1);
    }

    pub fn prepend_sqrt_x_dag(&mut self, qubit: usize) {
        self.prepend_sqrt_x_phased(qubit, 3);
    }

    fn prepend_sqrt_x_phased(&mut self, qubit: usize, quarter_turns: u8) {
        assert!(qubit < self.num_qubits);
        let raw = self.raw_mut();
        let mut z = unsafe { raw.z_obs_mut(qubit) };
        let x = unsafe { raw.x_obs(qubit) };
        let log_i = quarter_turns.wrapping_add(z.inplace_right_mul_returning_log_i(&x));
        debug_assert_eq!(log_i & 1, 0);
        if log_i & 2 != 0 {
            z.toggle_sign();
        }
    }

    pub fn prepend_sqrt_y(&mut self, qubit: usize) {
        assert!(qubit < self.num_qubits);
        let raw = self.raw_mut();
        let mut x = unsafe { raw.x_obs_mut(qubit) };
        let mut z = unsafe { raw.z_obs_mut(qubit) };
        z.toggle_sign();
        x.swap_with(&mut z);
    }

    pub fn prepend_sqrt_y_dag(&mut self, qubit: usize) {
        assert!(qubit < self.num_qubits);
        let raw = self.raw_mut();
        let mut x = unsafe { raw.x_obs_mut(qubit) };
        let mut z = unsafe { raw.z_obs_mut(qubit) };
        x.swap_with(&mut z);
        z.toggle_sign();
    }

    pub fn prepend_sqrt_z(&mut self, qubit: usize) {
        self.prepend_sqrt_z_phased(qubit, 1);
    }

    pub fn prepend_sqrt_z_dag(&mut self, qubit: usize) {
        self.prepend_sqrt_z_phased(qubit, 3);
    }

    fn prepend_sqrt_z_phased(&mut self, qubit: usize, quarter_turns: u8) {
        assert!(qubit < self.num_qubits);
        let raw = self.raw_mut();
        let mut x = unsafe { raw.x_obs_mut(qubit) };
        let z = unsafe { raw.z_obs(qubit) };
        let log_i = quarter_turns.wrapping_add(x.inplace_right_mul_returning_log_i(&z));
        debug_assert_eq!(log_i & 1, 0);
        if log_i & 2 != 0 {
            x.toggle_sign();
        }
    }

    pub fn prepend_cx(&mut self, control: usize, target: usize) {
        assert!(control < self.num_qubits && target < self.num_qubits);
        assert_ne!(control, target);
        let raw = self.raw_mut();
        let mut z_target = unsafe { raw.z_obs_mut(target) };
        let z_control = unsafe { raw.z_obs(control) };
        z_target.mul_from(&z_control);
        let mut x_control = unsafe { raw.x_obs_mut(control) };
        let x_target = unsafe { raw.x_obs(target) };
        x_control.mul_from(&x_target);
    }

    pub fn prepend_cy(&mut self, control: usize, target: usize) {
        self.prepend_h_yz(target);
        self.prepend_cz(control, target);
        self.prepend_h_yz(target);
    }

    pub fn prepend_cz(&mut self, control: usize, target: usize) {
        assert!(control < self.num_qubits && target < self.num_qubits);
        assert_ne!(control, target);
        let raw = self.raw_mut();
        let mut x_target = unsafe { raw.x_obs_mut(target) };
        let z_control = unsafe { raw.z_obs(control) };
        x_target.mul_from(&z_control);
        let mut x_control = unsafe { raw.x_obs_mut(control) };
        let z_target = unsafe { raw.z_obs(target) };
        x_control.mul_from(&z_target);
    }

    pub fn prepend_swap(&mut self, first: usize, second: usize) {
        assert!(first < self.num_qubits && second < self.num_qubits);
        assert_ne!(first, second);
        let raw = self.raw_mut();
        let mut x_first = unsafe { raw.x_obs_mut(first) };
        let mut x_second = unsafe { raw.x_obs_mut(second) };
        x_first.swap_with(&mut x_second);
        let mut z_first = unsafe { raw.z_obs_mut(first) };
        let mut z_second = unsafe { raw.z_obs_mut(second) };
        z_first.swap_with(&mut z_second);
    }

    // ========== Scatter / gather ==========

    /// Evaluate the image under this tableau of a k-qubit Pauli whose qubits
    /// sit at `scattered_indices`, as an n-qubit Pauli.
    pub fn scatter_eval(&self, gathered_input: &PauliStringRef<'_>, scattered_indices: &[usize]) -> PauliString {
        assert_eq!(gathered_input.num_qubits(), scattered_indices.len());
        let mut result = PauliString::identity(self.num_qubits);
        result.set_sign(gathered_input.sign());
        for (k_gathered, &k_scattered) in scattered_indices.iter().enumerate() {
            let x = gathered_input.x_bit(k_gathered);
            let z = gathered_input.z_bit(k_gathered);
            if x {
                if z {
                    // Multiply by Y using Y = i*X*Z.
                    let mut log_i = 1u8;
                    log_i = log_i.wrapping_add(result.inplace_right_mul_returning_log_i(&self.x_obs(k_scattered)));
                    log_i = log_i.wrapping_add(result.inplace_right_mul_returning_log_i(&self.z_obs(k_scattered)));
                    assert_eq!(log_i & 1, 0);
                    result.toggle_sign_if(log_i & 2 != 0);
                } else {
                    result.mul_from(&self.x_obs(k_scattered));
                }
            } else if z {
                result.mul_from(&self.z_obs(k_scattered));
            }
        }
        result
    }

    /// Apply an arbitrary k-qubit Clifford `operation` to the front of the
    /// circuit history, at the given target qubits.
    pub fn inplace_scatter_prepend(&mut self, operation: &Tableau, target_qubits: &[usize]) {
        assert_eq!(operation.num_qubits, target_qubits.len());
        let mut new_x = Vec::with_capacity(operation.num_qubits);
        let mut new_z = Vec::with_capacity(operation.num_qubits);
        for qubit in 0..operation.num_qubits {
            new_x.push(self.scatter_eval(&operation.x_obs(qubit), target_qubits));
            new_z.push(self.scatter_eval(&operation.z_obs(qubit), target_qubits));
        }
        for (qubit, &target) in target_qubits.iter().enumerate() {
            self.x_obs_mut(target).overwrite_with(&new_x[qubit].as_ref());
            self.z_obs_mut(target).overwrite_with(&new_z[qubit].as_ref());
        }
    }

    /// Apply an arbitrary k-qubit Clifford `operation` to the end of the
    /// circuit history, at the given target qubits.
    pub fn inplace_scatter_append(&mut self, operation: &Tableau, target_qubits: &[usize]) {
        assert_eq!(operation.num_qubits, target_qubits.len());
        let raw = self.raw_mut();
        for qubit in 0..self.num_qubits {
            let mut x = unsafe { raw.x_obs_mut(qubit) };
            operation.apply_within(&mut x, target_qubits);
            let mut z = unsafe { raw.z_obs_mut(qubit) };
            operation.apply_within(&mut z, target_qubits);
        }
    }

    /// Conjugate the qubits of `target` at `target_qubits` by this tableau.
    pub fn apply_within(&self, target: &mut PauliStringMut<'_>, target_qubits: &[usize]) {
        assert_eq!(self.num_qubits, target_qubits.len());
        let mut gathered = PauliString::identity(self.num_qubits);
        target.as_ref().gather_into(&mut gathered, target_qubits);
        let transformed = self.apply(&gathered);
        target.scatter_into(&transformed, target_qubits);
    }

    /// Treating the tableau as a Clifford U, return U p U†.
    pub fn apply(&self, pauli: &PauliString) -> PauliString {
        assert_eq!(pauli.num_qubits(), self.num_qubits);
        let indices: Vec<usize> = (0..self.num_qubits).collect();
        self.scatter_eval(&pauli.as_ref(), &indices)
    }

    // ========== Validity ==========

    /// The symplectic-with-signs validity check: X and Z anticommute on the
    /// same qubit and all cross pairs commute.
    #[must_use]
    pub fn satisfies_invariants(&self) -> bool {
        for q1 in 0..self.num_qubits {
            let x1 = self.x_obs(q1);
            let z1 = self.z_obs(q1);
            if x1.commutes(&z1) {
                return false;
            }
            for q2 in q1 + 1..self.num_qubits {
                let x2 = self.x_obs(q2);
                let z2 = self.z_obs(q2);
                if !x1.commutes(&x2) || !x1.commutes(&z2) || !z1.commutes(&x2) || !z1.commutes(&z2) {
                    return false;
                }
            }
        }
        true
    }

    /// Grow the tableau so gates may mention qubits up to `num_qubits - 1`,
    /// acting as the identity on the new qubits. Growth within the current
    /// 256-qubit tile just extends the diagonal; crossing a tile boundary
    /// reallocates.
    pub fn ensure_num_qubits(&mut self, num_qubits: usize) {
        if num_qubits <= self.num_qubits {
            return;
        }
        if block_count(num_qubits) == self.tiles_per_side() {
            let tiles_per_side = self.tiles_per_side();
            for qubit in self.num_qubits..num_qubits {
                self.xz
                    .assign_index(bit_address(qubit, qubit, tiles_per_side, X2X_QUAD, false), true);
                self.xz
                    .assign_index(bit_address(qubit, qubit, tiles_per_side, Z2Z_QUAD, false), true);
            }
            self.num_qubits = num_qubits;
            return;
        }
        let mut grown = Tableau::identity(num_qubits);
        for qubit in 0..self.num_qubits {
            let old_x = self.x_obs(qubit);
            let old_z = self.z_obs(qubit);
            let mut new_x = grown.x_obs_mut(qubit);
            for k in 0..self.num_qubits {
                new_x.set_x_bit(k, old_x.x_bit(k));
                new_x.set_z_bit(k, old_x.z_bit(k));
            }
            new_x.set_sign(old_x.sign());
            let mut new_z = grown.z_obs_mut(qubit);
            for k in 0..self.num_qubits {
                new_z.set_x_bit(k, old_z.x_bit(k));
                new_z.set_z_bit(k, old_z.z_bit(k));
            }
            new_z.set_sign(old_z.sign());
        }
        *self = grown;
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "Tableau {{")?;
        for qubit in 0..self.num_qubits {
            writeln!(formatter, "  qubit {qubit}_x: {}", self.x_obs(qubit).to_owned())?;
            writeln!(formatter, "  qubit {qubit}_z: {}", self.z_obs(qubit).to_owned())?;
        }
        write!(formatter, "}}")
    }
}

impl fmt::Debug for Tableau {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, formatter)
    }
}

/// Process-wide table mapping gate names to their tableaus. Immutable after
/// initialization.
pub static GATE_TABLEAUS: LazyLock<HashMap<&'static str, Tableau>> = LazyLock::new(|| {
    HashMap::from([
        ("I", Tableau::gate1("+X", "+Z")),
        // Pauli gates.
        ("X", Tableau::gate1("+X", "-Z")),
        ("Y", Tableau::gate1("-X", "-Z")),
        ("Z", Tableau::gate1("-X", "+Z")),
        // Axis exchange gates.
        ("H", Tableau::gate1("+Z", "+X")),
        ("H_XY", Tableau::gate1("+Y", "-Z")),
        ("H_XZ", Tableau::gate1("+Z", "+X")),
        ("H_YZ", Tableau::gate1("-X", "+Y")),
        // 90 degree rotation gates.
        ("SQRT_X", Tableau::gate1("+X", "-Y")),
        ("SQRT_X_DAG", Tableau::gate1("+X", "+Y")),
        ("SQRT_Y", Tableau::gate1("-Z", "+X")),
        ("SQRT_Y_DAG", Tableau::gate1("+Z", "-X")),
        ("SQRT_Z", Tableau::gate1("+Y", "+Z")),
        ("SQRT_Z_DAG", Tableau::gate1("-Y", "+Z")),
        ("S", Tableau::gate1("+Y", "+Z")),
        ("S_DAG", Tableau::gate1("-Y", "+Z")),
        // Two qubit gates.
        ("CNOT", Tableau::gate2("+XX", "+Z_", "+_X", "+ZZ")),
        ("CX", Tableau::gate2("+XX", "+Z_", "+_X", "+ZZ")),
        ("CY", Tableau::gate2("+XY", "+Z_", "+ZX", "+ZZ")),
        ("CZ", Tableau::gate2("+XZ", "+Z_", "+ZX", "+_Z")),
        ("SWAP", Tableau::gate2("+_X", "+_Z", "+X_", "+Z_")),
    ])
});
