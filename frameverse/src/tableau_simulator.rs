use std::io::{BufRead, Write};

use paulitab::{BlockTransposedTableau, Tableau};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::circuit::{parse_line, Circuit, CircuitParseError, Gate, Instruction};

/// Seed of the deterministic run that produces the reference sample.
const REFERENCE_SEED: u64 = 0;

/// Errors surfaced while streaming a circuit.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum StreamError {
    #[display("{_0}")]
    Io(std::io::Error),
    #[display("{_0}")]
    Parse(CircuitParseError),
}

/// Single-stream stabilizer simulator.
///
/// Tracks the inverse of the Clifford accumulated so far, so that applying a
/// circuit gate is a row-oriented prepend of the gate's adjoint, and a
/// measurement's determinism can be read straight off the measured Z
/// observable's row. Collapse happens inside a [`BlockTransposedTableau`]
/// scope where the required elimination gates are cheap column appends.
pub struct TableauSimulator {
    inv_state: Tableau,
    pub measurement_record: Vec<bool>,
}

impl TableauSimulator {
    pub fn new(num_qubits: usize) -> Self {
        TableauSimulator {
            inv_state: Tableau::identity(num_qubits),
            measurement_record: Vec::new(),
        }
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.inv_state.num_qubits()
    }

    fn ensure_qubit(&mut self, qubit: usize) {
        self.inv_state.ensure_num_qubits(qubit + 1);
    }

    /// Measure qubit `qubit` in the Z basis, collapsing the state.
    pub fn measure(&mut self, qubit: usize, rng: &mut impl Rng) -> bool {
        self.ensure_qubit(qubit);
        let num_qubits = self.inv_state.num_qubits();

        // Search for any stabilizer generator that anticommutes with the
        // measurement observable.
        let pivot = {
            let z_obs = self.inv_state.z_obs(qubit);
            (0..num_qubits).find(|&k| z_obs.x_bit(k))
        };
        let Some(pivot) = pivot else {
            // No anticommuting stabilizer generator: deterministic outcome.
            return self.inv_state.z_sign(qubit);
        };

        // Partial Gaussian elimination over the anticommuting generators,
        // phrased as no-effect-because-control-is-zero gates introduced at
        // the start of time.
        {
            let mut transposed = BlockTransposedTableau::new(&mut self.inv_state);
            for k in pivot + 1..num_qubits {
                if transposed.z_obs_x_bit(qubit, k) {
                    transposed.append_cx(pivot, k);
                }
            }

            // Swap the now-isolated anticommuting generator for one that
            // commutes with the measurement.
            if transposed.z_obs_z_bit(qubit, pivot) {
                transposed.append_h_yz(pivot);
            } else {
                transposed.append_h(pivot);
            }

            // Assign the measurement result.
            let result: bool = rng.gen();
            if transposed.z_sign(qubit) != result {
                transposed.append_x(pivot);
            }
        }

        self.inv_state.z_sign(qubit)
    }

    /// Measure, then flip the qubit back to |0> if the outcome was 1.
    pub fn reset(&mut self, qubit: usize, rng: &mut impl Rng) {
        if self.measure(qubit, rng) {
            self.inv_state.prepend_x(qubit);
        }
    }

    /// Apply one unitary gate from the circuit vocabulary to the given
    /// targets (pairs for two-qubit gates). Applying gate G to the end of
    /// the circuit prepends G's adjoint to the tracked inverse.
    pub fn apply_unitary(&mut self, gate: Gate, targets: &[usize]) {
        for &target in targets {
            self.ensure_qubit(target);
        }
        match gate {
            Gate::Identity => {}
            Gate::PauliX => targets.iter().for_each(|&q| self.inv_state.prepend_x(q)),
            Gate::PauliY => targets.iter().for_each(|&q| self.inv_state.prepend_y(q)),
            Gate::PauliZ => targets.iter().for_each(|&q| self.inv_state.prepend_z(q)),
            Gate::Hadamard => targets.iter().for_each(|&q| self.inv_state.prepend_h(q)),
            Gate::HadamardXY => targets.iter().for_each(|&q| self.inv_state.prepend_h_xy(q)),
            Gate::HadamardYZ => targets.iter().for_each(|&q| self.inv_state.prepend_h_yz(q)),
            Gate::SqrtX => targets.iter().for_each(|&q| self.inv_state.prepend_sqrt_x_dag(q)),
            Gate::SqrtXDag => targets.iter().for_each(|&q| self.inv_state.prepend_sqrt_x(q)),
            Gate::SqrtY => targets.iter().for_each(|&q| self.inv_state.prepend_sqrt_y_dag(q)),
            Gate::SqrtYDag => targets.iter().for_each(|&q| self.inv_state.prepend_sqrt_y(q)),
            Gate::SqrtZ => targets.iter().for_each(|&q| self.inv_state.prepend_sqrt_z_dag(q)),
            Gate::SqrtZDag => targets.iter().for_each(|&q| self.inv_state.prepend_sqrt_z(q)),
            Gate::ControlledX => {
                for pair in targets.chunks_exact(2) {
                    self.inv_state.prepend_cx(pair[0], pair[1]);
                }
            }
            Gate::ControlledY => {
                for pair in targets.chunks_exact(2) {
                    self.inv_state.prepend_cy(pair[0], pair[1]);
                }
            }
            Gate::ControlledZ => {
                for pair in targets.chunks_exact(2) {
                    self.inv_state.prepend_cz(pair[0], pair[1]);
                }
            }
            Gate::Swap => {
                for pair in targets.chunks_exact(2) {
                    self.inv_state.prepend_swap(pair[0], pair[1]);
                }
            }
            gate => panic!("{} is not a unitary gate", gate.name()),
        }
    }

    /// Execute one instruction. Noise instructions are skipped: this
    /// simulator produces the noiseless reference trajectory.
    pub fn apply_instruction(&mut self, instruction: &Instruction, rng: &mut impl Rng) {
        match instruction.gate {
            Gate::Measure => {
                for &target in &instruction.targets {
                    let outcome = self.measure(target, rng);
                    self.measurement_record.push(outcome);
                }
            }
            Gate::Reset => {
                for &target in &instruction.targets {
                    self.reset(target, rng);
                }
            }
            Gate::Tick => {}
            gate if gate.is_noise() => {}
            _ => self.apply_unitary(instruction.gate, &instruction.targets),
        }
    }

    /// Run the whole circuit deterministically (fixed seed) and return the
    /// bit string of all measurement outcomes. Feeds the frame simulator.
    #[must_use]
    pub fn reference_sample_circuit(circuit: &Circuit) -> Vec<bool> {
        let mut rng = StdRng::seed_from_u64(REFERENCE_SEED);
        let mut simulator = TableauSimulator::new(circuit.num_qubits);
        for instruction in &circuit.instructions {
            simulator.apply_instruction(instruction, &mut rng);
        }
        debug_assert_eq!(simulator.measurement_record.len(), circuit.num_measurements);
        simulator.measurement_record
    }

    /// Stream circuit operations from `input`, applying them as they arrive
    /// and printing measurement outcomes immediately in `01` format. Used
    /// both for the interactive REPL and for plain single-shot sampling.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or on the first malformed line.
    pub fn sample_stream(
        input: impl BufRead,
        mut output: impl Write,
        interactive: bool,
        rng: &mut impl Rng,
    ) -> Result<(), StreamError> {
        let mut simulator = TableauSimulator::new(0);
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let parsed = parse_line(&line).map_err(|message| CircuitParseError {
                line_number: index + 1,
                line: line.clone(),
                message,
            })?;
            let Some(instruction) = parsed else { continue };
            let recorded_before = simulator.measurement_record.len();
            simulator.apply_instruction(&instruction, rng);
            for &outcome in &simulator.measurement_record[recorded_before..] {
                output.write_all(if outcome { b"1" } else { b"0" })?;
            }
            if interactive && instruction.gate == Gate::Measure {
                output.write_all(b"\n")?;
                output.flush()?;
            }
        }
        if !interactive {
            output.write_all(b"\n")?;
        }
        output.flush()?;
        Ok(())
    }

    /// Same fixed seed as [`TableauSimulator::reference_sample_circuit`],
    /// for callers that need bit-identical streams.
    #[must_use]
    pub fn reference_rng() -> StdRng {
        StdRng::seed_from_u64(REFERENCE_SEED)
    }
}
