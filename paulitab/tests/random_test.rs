use paulitab::{sample_qmallows, Tableau};
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[test]
fn qmallows_outputs_are_well_formed() {
    let mut rng = SmallRng::seed_from_u64(19);
    for num_qubits in [1usize, 2, 10, 50] {
        let (hada, perm) = sample_qmallows(num_qubits, &mut rng);
        assert_eq!(hada.len(), num_qubits);
        assert_eq!(perm.len(), num_qubits);
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..num_qubits).collect::<Vec<_>>());
    }
}

#[test]
fn qmallows_single_qubit_marginal() {
    // For n = 1 the hadamard indicator is true with probability exactly 2/3.
    let mut rng = SmallRng::seed_from_u64(111);
    let trials = 40_000;
    let mut hits = 0usize;
    for _ in 0..trials {
        let (hada, _) = sample_qmallows(1, &mut rng);
        hits += usize::from(hada[0]);
    }
    let rate = hits as f64 / trials as f64;
    assert!((rate - 2.0 / 3.0).abs() < 0.01, "rate {rate}");
}

#[test]
fn random_tableaus_satisfy_invariants_small() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..1000 {
        let tableau = Tableau::random(16, &mut rng);
        assert!(tableau.satisfies_invariants());
    }
}

#[test]
fn random_tableaus_satisfy_invariants_large() {
    let mut rng = SmallRng::seed_from_u64(43);
    for _ in 0..50 {
        let tableau = Tableau::random(100, &mut rng);
        assert!(tableau.satisfies_invariants());
    }
    // one draw past the 256-qubit tile boundary
    let tableau = Tableau::random(300, &mut rng);
    assert!(tableau.satisfies_invariants());
}

#[test]
fn random_is_reproducible_from_the_seed() {
    let first = Tableau::random(24, &mut SmallRng::seed_from_u64(7));
    let second = Tableau::random(24, &mut SmallRng::seed_from_u64(7));
    let different = Tableau::random(24, &mut SmallRng::seed_from_u64(8));
    assert_eq!(first, second);
    assert_ne!(first, different);
}

#[test]
fn random_sign_bits_vary() {
    let mut rng = SmallRng::seed_from_u64(12);
    let mut seen_positive = false;
    let mut seen_negative = false;
    for _ in 0..50 {
        let tableau = Tableau::random(4, &mut rng);
        for qubit in 0..4 {
            if tableau.z_sign(qubit) {
                seen_negative = true;
            } else {
                seen_positive = true;
            }
        }
    }
    assert!(seen_positive && seen_negative);
}
