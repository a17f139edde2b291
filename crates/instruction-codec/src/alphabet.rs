//! Positional-numeral alphabets selected by machine word width.

use crate::CodecError;

/// Octal alphabet used for 8-bit words.
pub const BASE8_ALPHABET: &str = "01234567";
/// Hexadecimal alphabet used for 16-bit words.
pub const BASE16_ALPHABET: &str = "0123456789abcdef";
/// Crockford-style base-32 alphabet used for 32-bit words.
pub const BASE32_ALPHABET: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Machine word width that selects the codec alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WordBits {
    /// 8-bit word, base-8 numerals.
    #[default]
    Eight,
    /// 16-bit word, base-16 numerals.
    Sixteen,
    /// 32-bit word, base-32 numerals.
    ThirtyTwo,
}

impl WordBits {
    /// All supported word widths in ascending order.
    pub const ALL: [Self; 3] = [Self::Eight, Self::Sixteen, Self::ThirtyTwo];

    /// Resolves a bit width into a supported word.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedWord`] for widths other than 8, 16 and 32.
    pub const fn from_bits(bits: u32) -> Result<Self, CodecError> {
        match bits {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            32 => Ok(Self::ThirtyTwo),
            _ => Err(CodecError::UnsupportedWord { bits }),
        }
    }

    /// Width of the word in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::ThirtyTwo => 32,
        }
    }

    /// Radix of the word's numeral alphabet.
    #[must_use]
    pub const fn radix(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::ThirtyTwo => 32,
        }
    }

    /// Digit characters in ascending value order.
    #[must_use]
    pub const fn alphabet(self) -> &'static str {
        match self {
            Self::Eight => BASE8_ALPHABET,
            Self::Sixteen => BASE16_ALPHABET,
            Self::ThirtyTwo => BASE32_ALPHABET,
        }
    }

    /// Largest value a word of this width can hold.
    #[must_use]
    pub const fn max_value(self) -> u64 {
        u64::MAX >> (64 - self.bits())
    }

    /// Character for a digit value below the radix.
    #[must_use]
    pub fn digit_char(self, digit: u8) -> Option<char> {
        self.alphabet().chars().nth(usize::from(digit))
    }

    /// Digit value of an alphabet character.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidDigit`] when `ch` is not in the alphabet.
    pub fn digit_value(self, ch: char) -> Result<u8, CodecError> {
        self.alphabet()
            .chars()
            .position(|candidate| candidate == ch)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or(CodecError::InvalidDigit {
                digit: ch,
                radix: self.radix(),
            })
    }
}
