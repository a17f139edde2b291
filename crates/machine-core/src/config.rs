//! Machine wiring parameters.

use instruction_codec::WordBits;

use crate::memory::{ChipSpec, MemoryTopology, WordSize, MEMORY_CHIPS};
use crate::{Architecture, MachineError, Mode};

/// Address lines of the default machine (1 KiB of byte locations).
pub const DEFAULT_ADDRESS_LINES: u32 = 10;

/// Top-level configuration for one machine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MachineConfig {
    /// Signal table bound to the control bus.
    pub architecture: Architecture,
    /// Processor addressing mode.
    pub mode: Mode,
    /// Address lines driven by the processor.
    pub address_lines: u32,
    /// Locations per memory chip.
    pub locations_per_chip: usize,
    /// Memory word width in bits; also selects the decode alphabet.
    pub word_size_bits: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            architecture: Architecture::X86,
            mode: Mode::Real,
            address_lines: DEFAULT_ADDRESS_LINES,
            locations_per_chip: MEMORY_CHIPS.locations_per_chip,
            word_size_bits: MEMORY_CHIPS.word_size.bits(),
        }
    }
}

impl MachineConfig {
    /// Memory word width.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::UnsupportedWordSize`] unless `word_size_bits`
    /// is 8, 16 or 32.
    pub const fn word_size(&self) -> Result<WordSize, MachineError> {
        WordSize::from_bits(self.word_size_bits)
    }

    /// Decode alphabet matching the memory word.
    ///
    /// # Errors
    ///
    /// Same as [`MachineConfig::word_size`].
    pub fn codec_word(&self) -> Result<WordBits, MachineError> {
        self.word_size().map(WordSize::codec_word)
    }

    /// Chip model for the memory array.
    ///
    /// # Errors
    ///
    /// Same as [`MachineConfig::word_size`].
    pub fn chip_spec(&self) -> Result<ChipSpec, MachineError> {
        Ok(ChipSpec {
            locations_per_chip: self.locations_per_chip,
            word_size: self.word_size()?,
        })
    }

    /// Checks every parameter without building a machine.
    ///
    /// # Errors
    ///
    /// Returns the first [`MachineError`] construction would raise.
    pub fn validate(&self) -> Result<MemoryTopology, MachineError> {
        MemoryTopology::derive(self.address_lines, self.chip_spec()?)
    }
}
