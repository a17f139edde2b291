//! Single-bit logic gates and truth-table enumeration.

use crate::MachineError;

/// A single logic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Bit {
    /// Logic low.
    #[default]
    Zero = 0,
    /// Logic high.
    One = 1,
}

impl Bit {
    /// Converts a boolean level into a bit.
    #[must_use]
    pub const fn from_bool(level: bool) -> Self {
        if level {
            Self::One
        } else {
            Self::Zero
        }
    }

    /// Returns `true` for logic high.
    #[must_use]
    pub const fn is_set(self) -> bool {
        matches!(self, Self::One)
    }

    /// Numeric value of the bit (`0` or `1`).
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<bool> for Bit {
    fn from(level: bool) -> Self {
        Self::from_bool(level)
    }
}

/// Rows of a truth table, each row most-significant bit first.
pub type TruthTable = Vec<Vec<Bit>>;

/// Inverter.
#[must_use]
pub const fn not(input: Bit) -> Bit {
    match input {
        Bit::Zero => Bit::One,
        Bit::One => Bit::Zero,
    }
}

/// Two-input AND gate.
#[must_use]
pub const fn and(a: Bit, b: Bit) -> Bit {
    match (a, b) {
        (Bit::One, Bit::One) => Bit::One,
        _ => Bit::Zero,
    }
}

/// Two-input OR gate.
#[must_use]
pub const fn or(a: Bit, b: Bit) -> Bit {
    match (a, b) {
        (Bit::Zero, Bit::Zero) => Bit::Zero,
        _ => Bit::One,
    }
}

/// Chains two-input AND gates left to right across `inputs`.
///
/// # Errors
///
/// Returns [`MachineError::Arity`] when fewer than two inputs are given.
pub fn cascade_and(inputs: &[Bit]) -> Result<Bit, MachineError> {
    match inputs {
        [first, second, rest @ ..] => Ok(rest
            .iter()
            .fold(and(*first, *second), |acc, bit| and(acc, *bit))),
        _ => Err(MachineError::Arity {
            inputs: inputs.len(),
        }),
    }
}

/// Enumerates every `inputs`-bit combination in increasing numeric order.
///
/// Row `i` is the zero-padded binary representation of `i`, most significant
/// bit first.
///
/// # Panics
///
/// Panics when `inputs` is at least the pointer width, since the row count
/// would not fit in `usize`.
#[must_use]
pub fn generate_truth_table(inputs: u32) -> TruthTable {
    let rows = 1_usize << inputs;
    (0..rows)
        .map(|row| {
            (0..inputs)
                .rev()
                .map(|position| Bit::from_bool((row >> position) & 1 == 1))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{and, cascade_and, generate_truth_table, not, or, Bit};
    use crate::MachineError;

    const ZERO: Bit = Bit::Zero;
    const ONE: Bit = Bit::One;

    #[rstest]
    #[case(ZERO, ZERO, ZERO, ZERO)]
    #[case(ZERO, ONE, ZERO, ONE)]
    #[case(ONE, ZERO, ZERO, ONE)]
    #[case(ONE, ONE, ONE, ONE)]
    fn two_input_gates_follow_boolean_algebra(
        #[case] a: Bit,
        #[case] b: Bit,
        #[case] expected_and: Bit,
        #[case] expected_or: Bit,
    ) {
        assert_eq!(and(a, b), expected_and);
        assert_eq!(or(a, b), expected_or);
    }

    #[test]
    fn inverter_flips_levels() {
        assert_eq!(not(ZERO), ONE);
        assert_eq!(not(ONE), ZERO);
        assert_eq!(or(ONE, not(ONE)), ONE);
        assert_eq!(or(ZERO, not(ZERO)), ONE);
    }

    #[test]
    fn cascade_and_rejects_fewer_than_two_inputs() {
        assert_eq!(cascade_and(&[]), Err(MachineError::Arity { inputs: 0 }));
        assert_eq!(cascade_and(&[ONE]), Err(MachineError::Arity { inputs: 1 }));
    }

    #[test]
    fn cascade_and_is_low_when_any_input_is_low() {
        assert_eq!(cascade_and(&[ONE, ONE]), Ok(ONE));
        assert_eq!(cascade_and(&[ONE, ONE, ONE, ONE]), Ok(ONE));
        assert_eq!(cascade_and(&[ONE, ONE, ZERO, ONE]), Ok(ZERO));
        assert_eq!(cascade_and(&[ZERO, ONE, ONE]), Ok(ZERO));
    }

    #[test]
    fn two_input_table_is_in_binary_order() {
        assert_eq!(
            generate_truth_table(2),
            vec![
                vec![ZERO, ZERO],
                vec![ZERO, ONE],
                vec![ONE, ZERO],
                vec![ONE, ONE],
            ]
        );
    }

    fn row_value(row: &[Bit]) -> usize {
        row.iter()
            .fold(0, |acc, bit| (acc << 1) | usize::from(bit.as_u8()))
    }

    proptest! {
        #[test]
        fn truth_table_enumerates_every_pattern_once(inputs in 1_u32..=10) {
            let table = generate_truth_table(inputs);
            prop_assert_eq!(table.len(), 1_usize << inputs);
            for (index, row) in table.iter().enumerate() {
                prop_assert_eq!(row.len(), inputs as usize);
                prop_assert_eq!(row_value(row), index);
            }
            for pair in table.windows(2) {
                prop_assert!(row_value(&pair[0]) < row_value(&pair[1]));
            }
        }
    }
}
