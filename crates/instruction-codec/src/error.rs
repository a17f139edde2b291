use thiserror::Error;

/// Failures raised while translating between instruction text and machine words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CodecError {
    /// Encoded value is wider than the selected machine word.
    #[error("encoded value does not fit in a {bits}-bit word")]
    Overflow {
        /// Width of the word the value had to fit into.
        bits: u32,
    },
    /// Numeral contained a character outside the word's alphabet.
    #[error("digit {digit:?} is not part of the base-{radix} alphabet")]
    InvalidDigit {
        /// Offending character.
        digit: char,
        /// Radix of the alphabet that rejected it.
        radix: u32,
    },
    /// Decoded byte sequence is not UTF-8 text.
    #[error("bytes of word {value:#x} are not valid UTF-8")]
    InvalidUtf8 {
        /// Word whose bytes failed to decode.
        value: u64,
    },
    /// Requested word width has no alphabet.
    #[error("unsupported codec word width: {bits} bits")]
    UnsupportedWord {
        /// Requested width in bits.
        bits: u32,
    },
}
