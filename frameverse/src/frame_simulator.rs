use std::io::Write;

use bitplane::bitmatrix::xor_row;
use bitplane::BitMatrix;
use rand::Rng;

use crate::circuit::{Circuit, Gate, Instruction};
use crate::output::{write_batch, SampleFormat};

/// Cursor over the shots of a batch hit by an error channel.
///
/// Instead of tossing one coin per shot, the cursor jumps ahead by a
/// geometrically distributed stride (the floor of ln(u)/ln(1-p) for uniform
/// u), so the work done scales with the number of hits rather than the
/// batch width. The degenerate p = 1 case falls out of the arithmetic:
/// ln(1-p) is -inf, every stride is zero, and every shot is hit.
struct ShotHits {
    inverse_log_miss: f64,
    shot_count: usize,
    next_shot: usize,
}

impl ShotHits {
    fn new(probability: f64, shot_count: usize) -> Self {
        debug_assert!((0.0..=1.0).contains(&probability));
        ShotHits {
            inverse_log_miss: (1.0 - probability).ln().recip(),
            shot_count,
            next_shot: if probability > 0.0 { 0 } else { shot_count },
        }
    }

    fn next(&mut self, rng: &mut impl Rng) -> Option<usize> {
        if self.next_shot >= self.shot_count {
            return None;
        }
        let uniform: f64 = rng.gen();
        // non-negative, so the saturating cast is the floor
        let stride = (uniform.ln() * self.inverse_log_miss) as usize;
        self.next_shot = self.next_shot.saturating_add(stride);
        if self.next_shot >= self.shot_count {
            return None;
        }
        let hit = self.next_shot;
        self.next_shot += 1;
        Some(hit)
    }
}

/// A uniformly random non-identity Pauli on `qubit_count` qubits, packed as
/// interleaved component pairs: bits 2q and 2q+1 are the x and z components
/// of qubit q.
fn random_error_pattern(qubit_count: usize, rng: &mut impl Rng) -> u64 {
    debug_assert!(qubit_count > 0 && 2 * qubit_count < u64::BITS as usize);
    let patterns = (1u64 << (2 * qubit_count)) - 1;
    rng.gen_range(1..=patterns)
}

/// Batched Pauli-frame simulator.
///
/// Holds one Pauli frame per shot, column-packed so every deterministic gate
/// is a handful of word-parallel row operations across the whole batch. Each
/// frame is the XOR difference between its shot's trajectory and the
/// reference trajectory; a shot's measurement bit is the reference bit XOR
/// the frame's x component at the measured qubit.
pub struct FrameSimulator {
    num_qubits: usize,
    batch_size: usize,
    x_table: BitMatrix,
    z_table: BitMatrix,
    out_table: BitMatrix,
    recorded: usize,
}

impl FrameSimulator {
    /// # Panics
    ///
    /// Panics unless `batch_size` is a positive multiple of 256.
    pub fn new(num_qubits: usize, num_measurements: usize, batch_size: usize) -> Self {
        assert!(batch_size > 0 && batch_size % 256 == 0);
        FrameSimulator {
            num_qubits,
            batch_size,
            x_table: BitMatrix::zeros(num_qubits, batch_size),
            z_table: BitMatrix::zeros(num_qubits, batch_size),
            out_table: BitMatrix::zeros(num_measurements, batch_size),
            recorded: 0,
        }
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    #[must_use]
    pub fn out_table(&self) -> &BitMatrix {
        &self.out_table
    }

    /// Start a fresh batch: clear observable frame components and recorded
    /// outcomes, and randomize the Z components.
    ///
    /// A Z frame on a freshly initialized |0> qubit is unobservable, but
    /// later gates can rotate it into an observable X component. Seeding
    /// every qubit's Z row with uniform bits is what makes nondeterministic
    /// measurements vary from shot to shot instead of copying the reference.
    pub fn reset_batch(&mut self, rng: &mut impl Rng) {
        for qubit in 0..self.num_qubits {
            self.x_table.clear_row(qubit);
            self.z_table.randomize_row(qubit, rng);
        }
        for row in 0..self.out_table.row_count() {
            self.out_table.clear_row(row);
        }
        self.recorded = 0;
    }

    // ========== Deterministic gates ==========
    //
    // A Pauli frame commutes through a Clifford gate by conjugation, which
    // on the (x, z) component rows is a fixed pattern of swaps and XORs,
    // applied to all shots at once. Signs are irrelevant: frames are
    // differences, not states.

    fn do_hadamard(&mut self, qubit: usize) {
        self.x_table.row_mut(qubit).swap_with_slice(self.z_table.row_mut(qubit));
    }

    /// SQRT_Z and H_XY share this map: X picks up a Z component.
    fn do_sqrt_z(&mut self, qubit: usize) {
        xor_row(self.z_table.row_mut(qubit), self.x_table.row(qubit));
    }

    /// SQRT_X and H_YZ share this map: Z picks up an X component.
    fn do_sqrt_x(&mut self, qubit: usize) {
        xor_row(self.x_table.row_mut(qubit), self.z_table.row(qubit));
    }

    fn do_cx(&mut self, control: usize, target: usize) {
        self.x_table.xor_row_into(control, target);
        self.z_table.xor_row_into(target, control);
    }

    fn do_cz(&mut self, first: usize, second: usize) {
        xor_row(self.z_table.row_mut(second), self.x_table.row(first));
        xor_row(self.z_table.row_mut(first), self.x_table.row(second));
    }

    fn do_cy(&mut self, control: usize, target: usize) {
        // read the old target components before they change
        xor_row(self.z_table.row_mut(control), self.x_table.row(target));
        self.z_table.xor_row_into(target, control);
        self.x_table.xor_row_into(control, target);
        xor_row(self.z_table.row_mut(target), self.x_table.row(control));
    }

    fn do_swap(&mut self, first: usize, second: usize) {
        self.x_table.swap_rows(first, second);
        self.z_table.swap_rows(first, second);
    }

    // ========== Measurement and reset ==========

    fn do_measure(&mut self, qubit: usize, flip_probability: f64, reference: &[bool], rng: &mut impl Rng) {
        let record = self.recorded;
        self.recorded += 1;
        self.out_table.clear_row(record);
        self.out_table.xor_row_into_from(&self.x_table, qubit, record);
        if reference[record] {
            self.out_table.complement_row(record);
        }
        if flip_probability > 0.0 {
            let mut hits = ShotHits::new(flip_probability, self.batch_size);
            while let Some(shot) = hits.next(rng) {
                self.out_table.negate((record, shot));
            }
        }
        // The Z component is unobservable after collapse; rerandomizing it
        // decouples later measurements from stale anticommuting history.
        self.z_table.randomize_row(qubit, rng);
    }

    fn do_reset(&mut self, qubit: usize, rng: &mut impl Rng) {
        self.x_table.clear_row(qubit);
        self.z_table.randomize_row(qubit, rng);
    }

    // ========== Noise channels ==========

    fn do_x_error(&mut self, qubit: usize, probability: f64, rng: &mut impl Rng) {
        let mut hits = ShotHits::new(probability, self.batch_size);
        while let Some(shot) = hits.next(rng) {
            self.x_table.negate((qubit, shot));
        }
    }

    fn do_z_error(&mut self, qubit: usize, probability: f64, rng: &mut impl Rng) {
        let mut hits = ShotHits::new(probability, self.batch_size);
        while let Some(shot) = hits.next(rng) {
            self.z_table.negate((qubit, shot));
        }
    }

    fn do_depolarize1(&mut self, qubit: usize, probability: f64, rng: &mut impl Rng) {
        let mut hits = ShotHits::new(probability, self.batch_size);
        while let Some(shot) = hits.next(rng) {
            let pattern = random_error_pattern(1, rng);
            if pattern & 1 != 0 {
                self.x_table.negate((qubit, shot));
            }
            if pattern & 2 != 0 {
                self.z_table.negate((qubit, shot));
            }
        }
    }

    fn do_depolarize2(&mut self, first: usize, second: usize, probability: f64, rng: &mut impl Rng) {
        let mut hits = ShotHits::new(probability, self.batch_size);
        while let Some(shot) = hits.next(rng) {
            let mut pattern = random_error_pattern(2, rng);
            for qubit in [first, second] {
                if pattern & 1 != 0 {
                    self.x_table.negate((qubit, shot));
                }
                if pattern & 2 != 0 {
                    self.z_table.negate((qubit, shot));
                }
                pattern >>= 2;
            }
        }
    }

    // ========== Dispatch ==========

    pub fn do_instruction(&mut self, instruction: &Instruction, reference: &[bool], rng: &mut impl Rng) {
        let targets = instruction.targets.as_slice();
        let probability = instruction.probability;
        match instruction.gate {
            // Pauli gates commute with every frame, no change.
            Gate::Identity | Gate::PauliX | Gate::PauliY | Gate::PauliZ | Gate::Tick => {}
            Gate::Hadamard | Gate::SqrtY | Gate::SqrtYDag => {
                targets.iter().for_each(|&q| self.do_hadamard(q));
            }
            Gate::SqrtZ | Gate::SqrtZDag | Gate::HadamardXY => {
                targets.iter().for_each(|&q| self.do_sqrt_z(q));
            }
            Gate::SqrtX | Gate::SqrtXDag | Gate::HadamardYZ => {
                targets.iter().for_each(|&q| self.do_sqrt_x(q));
            }
            Gate::ControlledX => {
                for pair in targets.chunks_exact(2) {
                    self.do_cx(pair[0], pair[1]);
                }
            }
            Gate::ControlledY => {
                for pair in targets.chunks_exact(2) {
                    self.do_cy(pair[0], pair[1]);
                }
            }
            Gate::ControlledZ => {
                for pair in targets.chunks_exact(2) {
                    self.do_cz(pair[0], pair[1]);
                }
            }
            Gate::Swap => {
                for pair in targets.chunks_exact(2) {
                    self.do_swap(pair[0], pair[1]);
                }
            }
            Gate::Measure => {
                for &target in targets {
                    self.do_measure(target, probability, reference, rng);
                }
            }
            Gate::Reset => {
                for &target in targets {
                    self.do_reset(target, rng);
                }
            }
            Gate::XError if probability > 0.0 => {
                targets.iter().for_each(|&q| self.do_x_error(q, probability, rng));
            }
            Gate::ZError if probability > 0.0 => {
                targets.iter().for_each(|&q| self.do_z_error(q, probability, rng));
            }
            Gate::Depolarize1 if probability > 0.0 => {
                targets.iter().for_each(|&q| self.do_depolarize1(q, probability, rng));
            }
            Gate::Depolarize2 if probability > 0.0 => {
                for pair in targets.chunks_exact(2) {
                    self.do_depolarize2(pair[0], pair[1], probability, rng);
                }
            }
            Gate::XError | Gate::ZError | Gate::Depolarize1 | Gate::Depolarize2 => {}
        }
    }

    /// Sample `shots` shots of `circuit` against `reference` and write them
    /// in `format`. Shots are processed in batches of up to 1024 (rounded up
    /// internally to a multiple of 256, with trailing columns discarded at
    /// emit time).
    ///
    /// # Errors
    ///
    /// Fails only on writer errors.
    pub fn sample_out(
        circuit: &Circuit,
        reference: &[bool],
        shots: usize,
        writer: &mut impl Write,
        format: SampleFormat,
        rng: &mut impl Rng,
    ) -> std::io::Result<()> {
        assert_eq!(reference.len(), circuit.num_measurements);
        const MAX_BATCH: usize = 1024;
        let capacity = shots.min(MAX_BATCH).next_multiple_of(256);
        let mut simulator = FrameSimulator::new(circuit.num_qubits, circuit.num_measurements, capacity);
        let mut remaining = shots;
        while remaining > 0 {
            let batch_shots = remaining.min(MAX_BATCH);
            simulator.reset_batch(rng);
            for instruction in &circuit.instructions {
                simulator.do_instruction(instruction, reference, rng);
            }
            write_batch(writer, &simulator.out_table, batch_shots, format)?;
            remaining -= batch_shots;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn instruction_of(line: &str) -> Instruction {
        crate::circuit::parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn cx_propagates_x_to_target_and_z_to_control() {
        let mut simulator = FrameSimulator::new(2, 0, 256);
        simulator.x_table.set((0, 0), true);
        simulator.z_table.set((1, 1), true);
        simulator.do_cx(0, 1);
        assert!(simulator.x_table.get((0, 0)) && simulator.x_table.get((1, 0)));
        assert!(simulator.z_table.get((1, 1)) && simulator.z_table.get((0, 1)));
    }

    #[test]
    fn hadamard_exchanges_components() {
        let mut simulator = FrameSimulator::new(1, 0, 256);
        simulator.x_table.set((0, 3), true);
        simulator.do_hadamard(0);
        assert!(!simulator.x_table.get((0, 3)));
        assert!(simulator.z_table.get((0, 3)));
    }

    #[test]
    fn x_error_flips_outcomes_against_reference() {
        let mut rng = SmallRng::seed_from_u64(17);
        let circuit = Circuit::from_text("X_ERROR(1) 0\nM 0\n").unwrap();
        let mut simulator = FrameSimulator::new(1, 1, 256);
        for instruction in &circuit.instructions {
            simulator.do_instruction(instruction, &[false], &mut rng);
        }
        for shot in 0..256 {
            assert!(simulator.out_table.get((0, shot)));
        }
    }

    #[test]
    fn reference_bit_complements_the_whole_row() {
        let mut rng = SmallRng::seed_from_u64(17);
        let mut simulator = FrameSimulator::new(1, 1, 256);
        simulator.do_instruction(&instruction_of("M 0"), &[true], &mut rng);
        for shot in 0..256 {
            assert!(simulator.out_table.get((0, shot)));
        }
    }

    #[test]
    fn z_error_is_invisible_to_z_measurement() {
        let mut rng = SmallRng::seed_from_u64(5);
        let circuit = Circuit::from_text("Z_ERROR(1) 0\nM 0\n").unwrap();
        let mut simulator = FrameSimulator::new(1, 1, 256);
        for instruction in &circuit.instructions {
            simulator.do_instruction(instruction, &[false], &mut rng);
        }
        for shot in 0..256 {
            assert!(!simulator.out_table.get((0, shot)));
        }
    }

    #[test]
    fn depolarize1_rate_is_close_to_p() {
        let mut rng = SmallRng::seed_from_u64(11);
        let batch = 102_400;
        let mut simulator = FrameSimulator::new(1, 0, batch);
        simulator.do_instruction(&instruction_of("DEPOLARIZE1(0.15) 0"), &[], &mut rng);
        let mut faulted = 0usize;
        for shot in 0..batch {
            if simulator.x_table.get((0, shot)) || simulator.z_table.get((0, shot)) {
                faulted += 1;
            }
        }
        let rate = faulted as f64 / batch as f64;
        assert!((rate - 0.15).abs() < 0.01, "rate {rate}");
    }

    #[test]
    fn reset_clears_observable_component() {
        let mut rng = SmallRng::seed_from_u64(23);
        let circuit = Circuit::from_text("X_ERROR(1) 0\nR 0\nM 0\n").unwrap();
        let mut simulator = FrameSimulator::new(1, 1, 256);
        for instruction in &circuit.instructions {
            simulator.do_instruction(instruction, &[false], &mut rng);
        }
        for shot in 0..256 {
            assert!(!simulator.out_table.get((0, shot)));
        }
    }

    #[test]
    fn shot_hits_match_the_requested_rate() {
        let mut rng = SmallRng::seed_from_u64(42);
        let shot_count = 100_000;
        let probability = 0.1;
        let mut hits = ShotHits::new(probability, shot_count);
        let mut count = 0usize;
        while hits.next(&mut rng).is_some() {
            count += 1;
        }
        let expected = probability * shot_count as f64;
        let deviation = (count as f64 - expected).abs();
        assert!(deviation < 5.0 * expected.sqrt(), "saw {count}, expected ~{expected}");
    }

    #[test]
    fn probability_one_hits_every_shot() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut hits = ShotHits::new(1.0, 2000);
        for expected in 0..2000 {
            assert_eq!(hits.next(&mut rng), Some(expected));
        }
        assert!(hits.next(&mut rng).is_none());
    }

    #[test]
    fn probability_zero_hits_nothing() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut hits = ShotHits::new(0.0, 2000);
        assert!(hits.next(&mut rng).is_none());
    }

    #[test]
    fn error_patterns_are_never_identity_and_cover_all_choices() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut seen = [false; 15];
        for _ in 0..10_000 {
            let pattern = random_error_pattern(2, &mut rng);
            assert!((1..=15).contains(&pattern));
            seen[(pattern - 1) as usize] = true;
        }
        assert!(seen.iter().all(|&pattern| pattern));
    }
}
