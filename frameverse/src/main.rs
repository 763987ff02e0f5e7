use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::process::ExitCode;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use frameverse::{Circuit, FrameSimulator, SampleFormat, TableauSimulator};

const MAX_SHOTS: usize = 1 << 30;

#[derive(Parser)]
#[command(name = "frameverse", about = "Sample measurement outcomes of a stabilizer circuit read from stdin")]
struct Args {
    /// Number of shots to sample.
    #[arg(long, default_value_t = 1)]
    shots: usize,

    /// Skip the reference-sample computation and assume an all-zero
    /// reference.
    #[arg(long)]
    frame0: bool,

    /// Interactive single-shot streaming mode.
    #[arg(long)]
    repl: bool,

    /// Output format: 01, b8 or ptb64.
    #[arg(long, default_value = "01")]
    format: String,

    /// Output path; '-' or absent means stdout.
    #[arg(long)]
    out: Option<String>,
}

fn usage_error(message: &str) -> ExitCode {
    eprintln!("{message}");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let args = Args::parse();

    let Some(format) = SampleFormat::from_name(&args.format) else {
        return usage_error(&format!("Unknown format '{}'. Expected 01, b8 or ptb64.", args.format));
    };
    if args.shots < 1 || args.shots > MAX_SHOTS {
        return usage_error(&format!("--shots must be in 1..={MAX_SHOTS}."));
    }
    if args.repl && args.shots != 1 {
        return usage_error("Incompatible arguments. Multiple shots and repl.");
    }
    if args.repl && format != SampleFormat::Ascii01 {
        return usage_error("Incompatible arguments. Binary output format and repl.");
    }
    if args.repl && args.frame0 {
        return usage_error("Incompatible arguments. --repl and --frame0.");
    }

    let mut writer: Box<dyn Write> = match args.out.as_deref() {
        None | Some("-") => Box::new(BufWriter::new(io::stdout())),
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(error) => {
                eprintln!("Failed to open '{path}' to write: {error}");
                return ExitCode::FAILURE;
            }
        },
    };

    let mut rng = StdRng::from_entropy();

    if args.frame0 {
        let circuit = match read_circuit_from_stdin() {
            Ok(circuit) => circuit,
            Err(message) => return usage_error(&message),
        };
        let reference = vec![false; circuit.num_measurements];
        if let Err(error) = FrameSimulator::sample_out(&circuit, &reference, args.shots, &mut writer, format, &mut rng)
        {
            eprintln!("Failed to write samples: {error}");
            return ExitCode::FAILURE;
        }
    } else if args.shots == 1 && format == SampleFormat::Ascii01 {
        let stdin = io::stdin();
        if let Err(error) = TableauSimulator::sample_stream(stdin.lock(), &mut writer, args.repl, &mut rng) {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    } else {
        let circuit = match read_circuit_from_stdin() {
            Ok(circuit) => circuit,
            Err(message) => return usage_error(&message),
        };
        let reference = TableauSimulator::reference_sample_circuit(&circuit);
        if let Err(error) = FrameSimulator::sample_out(&circuit, &reference, args.shots, &mut writer, format, &mut rng)
        {
            eprintln!("Failed to write samples: {error}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(error) = writer.flush() {
        eprintln!("Failed to write samples: {error}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn read_circuit_from_stdin() -> Result<Circuit, String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .map_err(|error| format!("Failed to read circuit from stdin: {error}"))?;
    Circuit::from_text(&text).map_err(|error| error.to_string())
}
