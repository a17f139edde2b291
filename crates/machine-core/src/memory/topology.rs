//! Chip layout derived from the processor's address lines.

use crate::memory::WordSize;
use crate::MachineError;

/// Largest supported address-line count (16 MiB of locations).
pub const MAX_ADDRESS_LINES: u32 = 24;

/// Memory chip model shared by every chip in the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ChipSpec {
    /// Addressable locations per chip.
    pub locations_per_chip: usize,
    /// Width of one location.
    pub word_size: WordSize,
}

/// Default chip: 128 one-byte locations.
pub const MEMORY_CHIPS: ChipSpec = ChipSpec {
    locations_per_chip: 128,
    word_size: WordSize::Byte,
};

impl Default for ChipSpec {
    fn default() -> Self {
        MEMORY_CHIPS
    }
}

/// Validates an address-line count.
///
/// # Errors
///
/// Returns [`MachineError::AddressLines`] outside `1..=MAX_ADDRESS_LINES`.
pub fn validate_address_lines(lines: u32) -> Result<u32, MachineError> {
    if lines >= 1 && lines <= MAX_ADDRESS_LINES {
        Ok(lines)
    } else {
        Err(MachineError::AddressLines {
            lines,
            max: MAX_ADDRESS_LINES,
        })
    }
}

/// Chip-array geometry for one processor/chip pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryTopology {
    /// Address lines driven by the processor.
    pub address_lines: u32,
    /// Chip model.
    pub chip: ChipSpec,
    /// Total addressable bytes, `2^address_lines * word bytes`.
    pub total_bytes: usize,
    /// Bytes held by one chip.
    pub bytes_per_chip: usize,
    /// Chips needed to cover the address space.
    pub number_of_chips: usize,
    /// High-order address bits that select a chip.
    pub chip_select_bits: u32,
    /// Low-order address bits that select a location inside a chip.
    pub addressing_depth: u32,
}

impl MemoryTopology {
    /// Derives the chip array for `address_lines` and `chip`.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::AddressLines`] for unsupported line counts and
    /// [`MachineError::SpecMismatch`] when whole chips cannot cover the address
    /// space exactly, that is unless `chip_select_bits + addressing_depth`
    /// equals `address_lines`.
    pub fn derive(address_lines: u32, chip: ChipSpec) -> Result<Self, MachineError> {
        let address_lines = validate_address_lines(address_lines)?;
        let word_bytes = chip.word_size.bytes();
        let total_bytes = (1_usize << address_lines) * word_bytes;
        let bytes_per_chip = chip.locations_per_chip.saturating_mul(word_bytes);
        let number_of_chips = total_bytes.checked_div(bytes_per_chip).unwrap_or(0);

        let chip_select_bits = exact_log2(number_of_chips);
        let addressing_depth = exact_log2(chip.locations_per_chip);
        let exact = chip_select_bits.is_some()
            && addressing_depth.is_some()
            && number_of_chips * bytes_per_chip == total_bytes;
        let chip_select_bits = chip_select_bits.unwrap_or_else(|| floor_log2(number_of_chips));
        let addressing_depth =
            addressing_depth.unwrap_or_else(|| floor_log2(chip.locations_per_chip));

        if !exact || chip_select_bits + addressing_depth != address_lines {
            return Err(MachineError::SpecMismatch {
                chip_select_bits,
                addressing_depth,
                address_lines,
            });
        }

        Ok(Self {
            address_lines,
            chip,
            total_bytes,
            bytes_per_chip,
            number_of_chips,
            chip_select_bits,
            addressing_depth,
        })
    }

    /// Mask selecting the in-chip part of an address.
    #[must_use]
    pub const fn internal_mask(&self) -> u64 {
        (1_u64 << self.addressing_depth) - 1
    }
}

const fn exact_log2(value: usize) -> Option<u32> {
    if value.is_power_of_two() {
        Some(value.trailing_zeros())
    } else {
        None
    }
}

fn floor_log2(value: usize) -> u32 {
    value.checked_ilog2().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ChipSpec, MemoryTopology, MAX_ADDRESS_LINES, MEMORY_CHIPS};
    use crate::memory::WordSize;
    use crate::MachineError;

    #[test]
    fn ten_line_byte_memory_splits_into_eight_chips() {
        let topology = MemoryTopology::derive(10, MEMORY_CHIPS).expect("matching specs");
        assert_eq!(topology.total_bytes, 1024);
        assert_eq!(topology.bytes_per_chip, 128);
        assert_eq!(topology.number_of_chips, 8);
        assert_eq!(topology.chip_select_bits, 3);
        assert_eq!(topology.addressing_depth, 7);
        assert_eq!(topology.chip_select_bits + topology.addressing_depth, 10);
        assert_eq!(topology.internal_mask(), 0x7F);
    }

    #[rstest]
    #[case(WordSize::Byte, 1024)]
    #[case(WordSize::Word, 2048)]
    #[case(WordSize::DoubleWord, 4096)]
    fn total_bytes_scale_with_word_size(#[case] word_size: WordSize, #[case] total: usize) {
        let chip = ChipSpec {
            locations_per_chip: 256,
            word_size,
        };
        let topology = MemoryTopology::derive(10, chip).expect("matching specs");
        assert_eq!(topology.total_bytes, total);
        assert_eq!(topology.number_of_chips, 4);
        assert_eq!(topology.chip_select_bits, 2);
        assert_eq!(topology.addressing_depth, 8);
    }

    #[test]
    fn a_single_chip_needs_no_select_bits() {
        let chip = ChipSpec {
            locations_per_chip: 1024,
            word_size: WordSize::Byte,
        };
        let topology = MemoryTopology::derive(10, chip).expect("matching specs");
        assert_eq!(topology.number_of_chips, 1);
        assert_eq!(topology.chip_select_bits, 0);
    }

    #[rstest]
    #[case(100, 3, 6)]
    #[case(2048, 0, 11)]
    fn chips_that_do_not_tile_the_space_are_rejected(
        #[case] locations_per_chip: usize,
        #[case] chip_select_bits: u32,
        #[case] addressing_depth: u32,
    ) {
        let chip = ChipSpec {
            locations_per_chip,
            word_size: WordSize::Byte,
        };
        assert_eq!(
            MemoryTopology::derive(10, chip),
            Err(MachineError::SpecMismatch {
                chip_select_bits,
                addressing_depth,
                address_lines: 10
            })
        );
    }

    #[test]
    fn address_line_count_is_bounded() {
        assert_eq!(
            MemoryTopology::derive(0, MEMORY_CHIPS),
            Err(MachineError::AddressLines {
                lines: 0,
                max: MAX_ADDRESS_LINES
            })
        );
        assert!(MemoryTopology::derive(MAX_ADDRESS_LINES + 1, MEMORY_CHIPS).is_err());
    }
}
