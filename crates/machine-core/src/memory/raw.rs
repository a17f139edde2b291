//! Byte-addressable backing store that moves whole words little-endian.

use instruction_codec::WordBits;

use crate::MachineError;

/// Width of one memory location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WordSize {
    /// 8-bit locations.
    #[default]
    Byte,
    /// 16-bit locations.
    Word,
    /// 32-bit locations.
    DoubleWord,
}

impl WordSize {
    /// Resolves a byte count into a supported word size.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::UnsupportedWordSize`] for anything but 1, 2 or 4.
    pub fn from_bytes(bytes: usize) -> Result<Self, MachineError> {
        match bytes {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Word),
            4 => Ok(Self::DoubleWord),
            _ => Err(MachineError::UnsupportedWordSize {
                bits: u32::try_from(bytes.saturating_mul(8)).unwrap_or(u32::MAX),
            }),
        }
    }

    /// Resolves a bit count into a supported word size.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::UnsupportedWordSize`] for anything but 8, 16 or 32.
    pub const fn from_bits(bits: u32) -> Result<Self, MachineError> {
        match bits {
            8 => Ok(Self::Byte),
            16 => Ok(Self::Word),
            32 => Ok(Self::DoubleWord),
            _ => Err(MachineError::UnsupportedWordSize { bits }),
        }
    }

    /// Bytes per location.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::DoubleWord => 4,
        }
    }

    /// Bits per location.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Byte => 8,
            Self::Word => 16,
            Self::DoubleWord => 32,
        }
    }

    /// Largest storable value.
    #[must_use]
    pub const fn max_value(self) -> u64 {
        match self {
            Self::Byte => u8::MAX as u64,
            Self::Word => u16::MAX as u64,
            Self::DoubleWord => u32::MAX as u64,
        }
    }

    /// Codec alphabet matching this word width.
    #[must_use]
    pub const fn codec_word(self) -> WordBits {
        match self {
            Self::Byte => WordBits::Eight,
            Self::Word => WordBits::Sixteen,
            Self::DoubleWord => WordBits::ThirtyTwo,
        }
    }
}

/// Fixed-length byte store read and written one word at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMemoryBuffer {
    bytes: Box<[u8]>,
    word_size: WordSize,
}

impl RawMemoryBuffer {
    /// Allocates a zeroed buffer of `len` bytes holding `word_size_bytes`-wide words.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::UnsupportedWordSize`] unless the word size is 1, 2 or 4.
    pub fn new(len: usize, word_size_bytes: usize) -> Result<Self, MachineError> {
        WordSize::from_bytes(word_size_bytes).map(|word_size| Self::with_word_size(len, word_size))
    }

    /// Allocates a zeroed buffer of `len` bytes.
    #[must_use]
    pub fn with_word_size(len: usize, word_size: WordSize) -> Self {
        Self {
            bytes: vec![0; len].into_boxed_slice(),
            word_size,
        }
    }

    /// Buffer length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-length buffer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Configured word size.
    #[must_use]
    pub const fn word_size(&self) -> WordSize {
        self.word_size
    }

    /// Raw byte view.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Writes `value` at `address` as one little-endian word.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::AddressOutOfRange`] when the word would extend
    /// past the buffer and [`MachineError::WordOverflow`] when `value` is wider
    /// than the word.
    pub fn store_value(&mut self, address: usize, value: u64) -> Result<(), MachineError> {
        let overflow = MachineError::WordOverflow {
            value,
            bytes: self.word_size.bytes(),
        };
        let range = self.word_range(address)?;
        let cells = &mut self.bytes[range];
        match self.word_size {
            WordSize::Byte => {
                cells.copy_from_slice(&u8::try_from(value).map_err(|_| overflow)?.to_le_bytes());
            }
            WordSize::Word => {
                cells.copy_from_slice(&u16::try_from(value).map_err(|_| overflow)?.to_le_bytes());
            }
            WordSize::DoubleWord => {
                cells.copy_from_slice(&u32::try_from(value).map_err(|_| overflow)?.to_le_bytes());
            }
        }
        Ok(())
    }

    /// Reads the little-endian word at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::AddressOutOfRange`] when the word would extend
    /// past the buffer.
    pub fn get_value(&self, address: usize) -> Result<u64, MachineError> {
        let cells = &self.bytes[self.word_range(address)?];
        let mut wide = [0_u8; 8];
        wide[..cells.len()].copy_from_slice(cells);
        Ok(u64::from_le_bytes(wide))
    }

    fn word_range(&self, address: usize) -> Result<std::ops::Range<usize>, MachineError> {
        address
            .checked_add(self.word_size.bytes())
            .filter(|end| *end <= self.bytes.len())
            .map(|end| address..end)
            .ok_or(MachineError::AddressOutOfRange {
                address: address as u64,
                len: self.bytes.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{RawMemoryBuffer, WordSize};
    use crate::MachineError;

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(8)]
    fn unsupported_word_sizes_are_rejected(#[case] bytes: usize) {
        assert_eq!(
            RawMemoryBuffer::new(16, bytes),
            Err(MachineError::UnsupportedWordSize {
                bits: u32::try_from(bytes * 8).unwrap()
            })
        );
    }

    #[test]
    fn words_are_stored_little_endian() {
        let mut buffer = RawMemoryBuffer::new(8, 4).unwrap();
        buffer.store_value(2, 0x1122_3344).unwrap();
        assert_eq!(buffer.as_bytes(), &[0, 0, 0x44, 0x33, 0x22, 0x11, 0, 0]);

        let mut buffer = RawMemoryBuffer::new(4, 2).unwrap();
        buffer.store_value(1, 0xBEEF).unwrap();
        assert_eq!(buffer.as_bytes(), &[0, 0xEF, 0xBE, 0]);
        assert_eq!(buffer.get_value(0), Ok(0xEF00));
    }

    #[test]
    fn words_crossing_the_end_are_rejected() {
        let mut buffer = RawMemoryBuffer::new(4, 2).unwrap();
        assert_eq!(
            buffer.store_value(3, 1),
            Err(MachineError::AddressOutOfRange { address: 3, len: 4 })
        );
        assert_eq!(
            buffer.get_value(usize::MAX),
            Err(MachineError::AddressOutOfRange {
                address: u64::MAX,
                len: 4
            })
        );
    }

    #[test]
    fn values_wider_than_the_word_are_rejected() {
        let mut buffer = RawMemoryBuffer::new(4, 1).unwrap();
        assert_eq!(
            buffer.store_value(0, 0x100),
            Err(MachineError::WordOverflow {
                value: 0x100,
                bytes: 1
            })
        );
        assert_eq!(buffer.get_value(0), Ok(0));
    }

    proptest! {
        #[test]
        fn store_then_get_roundtrips(
            size in prop::sample::select(vec![WordSize::Byte, WordSize::Word, WordSize::DoubleWord]),
            raw in any::<u64>(),
            address in 0_usize..60,
        ) {
            let mut buffer = RawMemoryBuffer::with_word_size(64, size);
            let value = raw & size.max_value();
            buffer.store_value(address, value).unwrap();
            prop_assert_eq!(buffer.get_value(address), Ok(value));
        }
    }
}
