//! Execution unit: owns the working registers and turns fetched words back
//! into instruction text.

use instruction_codec::WordBits;
use tracing::info;

use crate::registers::GeneralRegisters;
use crate::{MachineError, Mode};

/// A word pulled from the prefetch queue together with its decoded text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Raw fetched word.
    pub word: u64,
    /// Instruction text recovered by the codec.
    pub text: String,
}

/// Decode half of the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionUnit {
    registers: GeneralRegisters,
    codec_word: WordBits,
}

impl ExecutionUnit {
    /// Creates an execution unit for `mode` decoding with `codec_word`.
    #[must_use]
    pub const fn new(mode: Mode, codec_word: WordBits) -> Self {
        Self {
            registers: GeneralRegisters::new(mode),
            codec_word,
        }
    }

    /// Alphabet used to decode fetched words.
    #[must_use]
    pub const fn codec_word(&self) -> WordBits {
        self.codec_word
    }

    /// Switches the decode alphabet.
    pub fn set_codec_word(&mut self, codec_word: WordBits) {
        self.codec_word = codec_word;
    }

    /// General-purpose and pointer registers.
    #[must_use]
    pub const fn registers(&self) -> &GeneralRegisters {
        &self.registers
    }

    /// Mutable general-purpose and pointer registers.
    pub fn registers_mut(&mut self) -> &mut GeneralRegisters {
        &mut self.registers
    }

    /// Decodes one fetched word.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::Codec`] when the word is not valid instruction text.
    pub fn decode(&self, word: u64) -> Result<DecodedInstruction, MachineError> {
        let text = instruction_codec::decode(word, self.codec_word)?;
        info!(word, text = %text, "instruction decoded");
        Ok(DecodedInstruction { word, text })
    }
}
