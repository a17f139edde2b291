//! Full address decoding: one chip-select line per address combination.
//!
//! Each output line owns an AND term over the chip-select inputs. A literal in
//! the term is the input itself where the line's truth-table row holds a one,
//! and the inverted input where it holds a zero, so exactly one term is high for
//! any input combination.

use crate::gates::{cascade_and, generate_truth_table, not, Bit, TruthTable};
use crate::MachineError;

/// One-hot chip-select decoder built from logic-gate primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipSelectDecoder {
    number_of_chips: usize,
    chip_select_bits: u32,
    terms: TruthTable,
    decoded: Vec<Bit>,
}

impl ChipSelectDecoder {
    /// Builds the decoder and computes its chip-select vector.
    ///
    /// Lines beyond the `2^chip_select_bits` truth-table rows stay low.
    ///
    /// # Errors
    ///
    /// Propagates gate arity failures.
    pub fn new(number_of_chips: usize, chip_select_bits: u32) -> Result<Self, MachineError> {
        let terms = generate_truth_table(chip_select_bits);
        let mut decoded = vec![Bit::Zero; number_of_chips];
        for (line, row) in decoded.iter_mut().zip(&terms) {
            *line = evaluate_term(row, row)?;
        }

        Ok(Self {
            number_of_chips,
            chip_select_bits,
            terms,
            decoded,
        })
    }

    /// Number of chip-select output lines.
    #[must_use]
    pub const fn number_of_chips(&self) -> usize {
        self.number_of_chips
    }

    /// Number of chip-select input bits.
    #[must_use]
    pub const fn chip_select_bits(&self) -> u32 {
        self.chip_select_bits
    }

    /// Decoded chip-select vector, one entry per chip.
    #[must_use]
    pub fn decoded_lines(&self) -> &[Bit] {
        &self.decoded
    }

    /// Returns `Some(index)` when the chip at `index` decodes as selected.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::DecoderIndex`] when `index` is outside the chip range.
    pub fn chip_selection_value(&self, index: u64) -> Result<Option<u64>, MachineError> {
        let line = self.line_index(index)?;
        Ok(self.decoded[line].is_set().then_some(index))
    }

    /// Evaluates every output term for a chip-select input.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::DecoderIndex`] when `input` is outside the chip range.
    pub fn decode_lines(&self, input: u64) -> Result<Vec<Bit>, MachineError> {
        let line = self.line_index(input)?;
        let Some(inputs) = self.terms.get(line) else {
            return Ok(vec![Bit::Zero; self.number_of_chips]);
        };

        let mut outputs = vec![Bit::Zero; self.number_of_chips];
        for (output, term) in outputs.iter_mut().zip(&self.terms) {
            *output = evaluate_term(term, inputs)?;
        }
        Ok(outputs)
    }

    fn line_index(&self, index: u64) -> Result<usize, MachineError> {
        usize::try_from(index)
            .ok()
            .filter(|line| *line < self.number_of_chips)
            .ok_or(MachineError::DecoderIndex {
                index,
                chips: self.number_of_chips,
            })
    }
}

fn evaluate_term(term: &[Bit], inputs: &[Bit]) -> Result<Bit, MachineError> {
    let literals: Vec<Bit> = term
        .iter()
        .zip(inputs)
        .map(|(wanted, input)| match wanted {
            Bit::One => *input,
            Bit::Zero => not(*input),
        })
        .collect();

    // Zero- and one-input terms need no gate.
    match literals.as_slice() {
        [] => Ok(Bit::One),
        [single] => Ok(*single),
        _ => cascade_and(&literals),
    }
}
