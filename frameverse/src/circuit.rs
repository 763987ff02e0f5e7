use smallvec::SmallVec;

pub type QubitId = usize;

/// The operations recognized in circuit text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Gate {
    Identity,
    PauliX,
    PauliY,
    PauliZ,
    Hadamard,
    HadamardXY,
    HadamardYZ,
    SqrtX,
    SqrtXDag,
    SqrtY,
    SqrtYDag,
    SqrtZ,
    SqrtZDag,
    ControlledX,
    ControlledY,
    ControlledZ,
    Swap,
    Measure,
    Reset,
    XError,
    ZError,
    Depolarize1,
    Depolarize2,
    Tick,
}

impl Gate {
    /// Look a gate up by its circuit-text name, including aliases.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Gate> {
        Some(match name {
            "I" => Gate::Identity,
            "X" => Gate::PauliX,
            "Y" => Gate::PauliY,
            "Z" => Gate::PauliZ,
            "H" | "H_XZ" => Gate::Hadamard,
            "H_XY" => Gate::HadamardXY,
            "H_YZ" => Gate::HadamardYZ,
            "SQRT_X" => Gate::SqrtX,
            "SQRT_X_DAG" => Gate::SqrtXDag,
            "SQRT_Y" => Gate::SqrtY,
            "SQRT_Y_DAG" => Gate::SqrtYDag,
            "SQRT_Z" | "S" => Gate::SqrtZ,
            "SQRT_Z_DAG" | "S_DAG" => Gate::SqrtZDag,
            "CX" | "CNOT" => Gate::ControlledX,
            "CY" => Gate::ControlledY,
            "CZ" => Gate::ControlledZ,
            "SWAP" => Gate::Swap,
            "M" => Gate::Measure,
            "R" => Gate::Reset,
            "X_ERROR" => Gate::XError,
            "Z_ERROR" => Gate::ZError,
            "DEPOLARIZE1" => Gate::Depolarize1,
            "DEPOLARIZE2" => Gate::Depolarize2,
            "TICK" => Gate::Tick,
            _ => return None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::Identity => "I",
            Gate::PauliX => "X",
            Gate::PauliY => "Y",
            Gate::PauliZ => "Z",
            Gate::Hadamard => "H",
            Gate::HadamardXY => "H_XY",
            Gate::HadamardYZ => "H_YZ",
            Gate::SqrtX => "SQRT_X",
            Gate::SqrtXDag => "SQRT_X_DAG",
            Gate::SqrtY => "SQRT_Y",
            Gate::SqrtYDag => "SQRT_Y_DAG",
            Gate::SqrtZ => "SQRT_Z",
            Gate::SqrtZDag => "SQRT_Z_DAG",
            Gate::ControlledX => "CX",
            Gate::ControlledY => "CY",
            Gate::ControlledZ => "CZ",
            Gate::Swap => "SWAP",
            Gate::Measure => "M",
            Gate::Reset => "R",
            Gate::XError => "X_ERROR",
            Gate::ZError => "Z_ERROR",
            Gate::Depolarize1 => "DEPOLARIZE1",
            Gate::Depolarize2 => "DEPOLARIZE2",
            Gate::Tick => "TICK",
        }
    }

    /// Whether targets are consumed in pairs.
    #[must_use]
    pub fn is_two_qubit(&self) -> bool {
        matches!(
            self,
            Gate::ControlledX | Gate::ControlledY | Gate::ControlledZ | Gate::Swap | Gate::Depolarize2
        )
    }

    /// Whether the gate only makes sense with a probability argument.
    #[must_use]
    pub fn is_noise(&self) -> bool {
        matches!(
            self,
            Gate::XError | Gate::ZError | Gate::Depolarize1 | Gate::Depolarize2
        )
    }
}

/// One parsed circuit line: a gate, its integer targets and, for noisy
/// operations, a probability.
#[derive(Clone, PartialEq, Debug)]
pub struct Instruction {
    pub gate: Gate,
    pub targets: SmallVec<[QubitId; 4]>,
    pub probability: f64,
}

/// A malformed circuit line, with enough context to report it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("circuit parse error at line {line_number}: {message}: \"{line}\"")]
pub struct CircuitParseError {
    pub line_number: usize,
    pub line: String,
    pub message: String,
}

/// A parsed circuit with its qubit and measurement totals precomputed.
#[derive(Clone, PartialEq, Debug, Default)]
#[must_use]
pub struct Circuit {
    pub instructions: Vec<Instruction>,
    pub num_qubits: usize,
    pub num_measurements: usize,
}

impl Circuit {
    /// Parse the line-oriented circuit text format: blank lines and `#`
    /// comments are skipped; every other line is a gate name, an optional
    /// parenthesized probability, and integer qubit targets.
    ///
    /// # Errors
    ///
    /// Returns a [`CircuitParseError`] naming the offending line.
    pub fn from_text(text: &str) -> Result<Circuit, CircuitParseError> {
        let mut circuit = Circuit::default();
        for (index, line) in text.lines().enumerate() {
            let parsed = parse_line(line).map_err(|message| CircuitParseError {
                line_number: index + 1,
                line: line.to_string(),
                message,
            })?;
            if let Some(instruction) = parsed {
                circuit.account_for(&instruction);
                circuit.instructions.push(instruction);
            }
        }
        Ok(circuit)
    }

    pub(crate) fn account_for(&mut self, instruction: &Instruction) {
        for &target in &instruction.targets {
            self.num_qubits = self.num_qubits.max(target + 1);
        }
        if instruction.gate == Gate::Measure {
            self.num_measurements += instruction.targets.len();
        }
    }
}

/// Parse a single line; `Ok(None)` for blanks and comments.
pub fn parse_line(line: &str) -> Result<Option<Instruction>, String> {
    let body = line.split('#').next().unwrap_or("").trim();
    if body.is_empty() {
        return Ok(None);
    }

    let mut tokens = body.split_whitespace();
    let head = tokens.next().expect("non-empty line has a first token");

    let (name, probability) = match head.split_once('(') {
        None => (head, None),
        Some((name, argument)) => {
            let argument = argument
                .strip_suffix(')')
                .ok_or_else(|| format!("unterminated probability argument in \"{head}\""))?;
            let probability: f64 = argument
                .parse()
                .map_err(|_| format!("malformed probability \"{argument}\""))?;
            if !(0.0..=1.0).contains(&probability) {
                return Err(format!("probability {probability} is outside [0, 1]"));
            }
            (name, Some(probability))
        }
    };

    let gate = Gate::from_name(name).ok_or_else(|| format!("unknown gate name \"{name}\""))?;

    match probability {
        Some(_) if !gate.is_noise() && gate != Gate::Measure => {
            return Err(format!("gate {} does not take a probability", gate.name()));
        }
        None if gate.is_noise() => {
            return Err(format!("gate {} requires a probability", gate.name()));
        }
        _ => {}
    }

    let mut targets: SmallVec<[QubitId; 4]> = SmallVec::new();
    for token in tokens {
        let target: QubitId = token
            .parse()
            .map_err(|_| format!("malformed qubit target \"{token}\""))?;
        targets.push(target);
    }

    if gate == Gate::Tick {
        if !targets.is_empty() {
            return Err("TICK takes no targets".to_string());
        }
    } else if targets.is_empty() {
        return Err(format!("gate {} requires at least one target", gate.name()));
    }
    if gate.is_two_qubit() {
        if targets.len() % 2 != 0 {
            return Err(format!("gate {} requires an even number of targets", gate.name()));
        }
        for pair in targets.chunks_exact(2) {
            if pair[0] == pair[1] {
                return Err(format!("gate {} applied to a repeated qubit {}", gate.name(), pair[0]));
            }
        }
    }

    Ok(Some(Instruction {
        gate,
        targets,
        probability: probability.unwrap_or(0.0),
    }))
}
