use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use frameverse::{Circuit, FrameSimulator, SampleFormat, TableauSimulator};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn surface_like_circuit(distance: usize, rounds: usize) -> Circuit {
    let mut text = String::new();
    for _ in 0..rounds {
        for qubit in 0..distance - 1 {
            text.push_str(&format!("CX {} {}\n", qubit, qubit + 1));
            text.push_str(&format!("DEPOLARIZE2(0.001) {} {}\n", qubit, qubit + 1));
        }
        for qubit in 0..distance {
            text.push_str(&format!("M {qubit}\n"));
        }
    }
    Circuit::from_text(&text).unwrap()
}

pub fn batch_sampling_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("FrameSimulator::sample_out");
    group.sample_size(20);
    for (distance, rounds, shots) in [(25usize, 25usize, 1024usize), (101, 10, 4096)] {
        let circuit = surface_like_circuit(distance, rounds);
        let reference = TableauSimulator::reference_sample_circuit(&circuit);
        group.throughput(Throughput::Elements(shots as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("d{distance}_r{rounds}_s{shots}")),
            &shots,
            |bencher, &shots| {
                bencher.iter(|| {
                    let mut rng = StdRng::seed_from_u64(0);
                    let mut sink = std::io::sink();
                    FrameSimulator::sample_out(&circuit, &reference, shots, &mut sink, SampleFormat::Bytes8, &mut rng)
                        .unwrap();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, batch_sampling_benchmark);
criterion_main!(benches);
