use paulitab::PauliString;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[test]
fn parse_and_display_round_trip() {
    for text in ["+X", "-Y", "+_", "-XYZ_", "+XXZZY_Y"] {
        let pauli: PauliString = text.parse().unwrap();
        assert_eq!(pauli.to_string(), text);
    }
}

#[test]
fn parse_accepts_implicit_sign_and_aliases() {
    let pauli: PauliString = "IXYZ".parse().unwrap();
    assert_eq!(pauli.to_string(), "+_XYZ");
    assert!(!pauli.sign());
    assert!(pauli.x_bit(1));
    assert!(pauli.x_bit(2) && pauli.z_bit(2));
    assert!(pauli.z_bit(3));
}

#[test]
fn parse_rejects_garbage() {
    let error = "+XQZ".parse::<PauliString>().unwrap_err();
    assert_eq!(error.character, 'Q');
    assert!("XY Z".parse::<PauliString>().is_err());
}

#[test]
fn single_qubit_products() {
    let x: PauliString = "X".parse().unwrap();
    let z: PauliString = "Z".parse().unwrap();

    // X * Z = -iY: bits become Y, one factor of -i left over.
    let mut product = x.clone();
    let log_i = product.inplace_right_mul_returning_log_i(&z.as_ref());
    assert_eq!(log_i, 3);
    assert!(product.x_bit(0) && product.z_bit(0));

    // Z * X = +iY.
    let mut product = z.clone();
    let log_i = product.inplace_right_mul_returning_log_i(&x.as_ref());
    assert_eq!(log_i, 1);

    // X * X = identity with no phase.
    let mut product = x.clone();
    assert_eq!(product.inplace_right_mul_returning_log_i(&x.as_ref()), 0);
    assert!(product.is_identity());
}

#[test]
fn commutation_basics() {
    let x: PauliString = "X_".parse().unwrap();
    let z0: PauliString = "Z_".parse().unwrap();
    let z1: PauliString = "_Z".parse().unwrap();
    let yy: PauliString = "YY".parse().unwrap();
    let xx: PauliString = "XX".parse().unwrap();
    assert!(!x.commutes(&z0));
    assert!(x.commutes(&z1));
    assert!(yy.commutes(&xx));
}

fn random_pauli(num_qubits: usize, seed: u64) -> PauliString {
    let mut rng = SmallRng::seed_from_u64(seed);
    PauliString::random(num_qubits, &mut rng)
}

proptest! {
    #[test]
    fn multiplying_twice_by_the_same_operand_cancels(seed in any::<u64>(), num_qubits in 1usize..700) {
        let left = random_pauli(num_qubits, seed);
        let right = random_pauli(num_qubits, seed.wrapping_add(1));
        let mut product = left.clone();
        let first = product.inplace_right_mul_returning_log_i(&right.as_ref());
        let second = product.inplace_right_mul_returning_log_i(&right.as_ref());
        prop_assert_eq!(&product, &left);
        prop_assert_eq!((first + second) % 4, 0);
    }

    #[test]
    fn opposite_order_phases_cancel(seed in any::<u64>(), num_qubits in 1usize..700) {
        let left = random_pauli(num_qubits, seed);
        let right = random_pauli(num_qubits, seed.wrapping_add(1));
        let mut left_right = left.clone();
        let log_left_right = left_right.inplace_right_mul_returning_log_i(&right.as_ref());
        let mut right_left = right.clone();
        let log_right_left = right_left.inplace_right_mul_returning_log_i(&left.as_ref());
        prop_assert_eq!((log_left_right + log_right_left) % 4, 0);
    }

    #[test]
    fn commutation_matches_phase_parity(seed in any::<u64>(), num_qubits in 1usize..700) {
        let left = random_pauli(num_qubits, seed);
        let right = random_pauli(num_qubits, seed.wrapping_add(1));
        let mut product = left.clone();
        let log_i = product.inplace_right_mul_returning_log_i(&right.as_ref());
        prop_assert_eq!(left.commutes(&right), log_i & 1 == 0);
    }

    #[test]
    fn mul_operator_agrees_with_raw_kernel(seed in any::<u64>(), num_qubits in 1usize..300) {
        let left = random_pauli(num_qubits, seed);
        let mut right = random_pauli(num_qubits, seed.wrapping_add(1));
        // force the operands to commute so the sugar operator is usable
        if !left.commutes(&right) {
            for qubit in 0..num_qubits {
                if left.x_bit(qubit) || left.z_bit(qubit) {
                    right.set_x_bit(qubit, left.x_bit(qubit));
                    right.set_z_bit(qubit, left.z_bit(qubit));
                }
            }
        }
        prop_assume!(left.commutes(&right));
        let product = &left * &right;
        let double = &product * &right;
        prop_assert_eq!(double, left);
    }
}
