//! Instruction text to machine word translation.
//!
//! Text bytes are re-expressed as a numeral in the word's positional alphabet
//! and the numeral is read back as an unsigned integer. Decoding walks the same
//! path in reverse, so `decode(encode(text)) == text` for any text whose value
//! fits the word. Leading NUL bytes carry no positional weight and are lost.

use crate::{CodecError, WordBits};

/// Encodes instruction text into an unsigned machine word.
///
/// # Errors
///
/// Returns [`CodecError::Overflow`] when the encoded value is wider than `word`.
pub fn encode(text: &str, word: WordBits) -> Result<u64, CodecError> {
    let digits = bytes_to_digits(text.as_bytes(), word.radix());
    digits_to_value(&digits, word)
}

/// Decodes a machine word back into the instruction text it was encoded from.
///
/// # Errors
///
/// Returns [`CodecError::Overflow`] when `value` is wider than `word`, or
/// [`CodecError::InvalidUtf8`] when the recovered bytes are not text.
pub fn decode(value: u64, word: WordBits) -> Result<String, CodecError> {
    if value > word.max_value() {
        return Err(CodecError::Overflow { bits: word.bits() });
    }
    let digits = value_to_digits(value, word.radix());
    let bytes = digits_to_bytes(&digits, word.radix());
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { value })
}

/// Renders a word as a numeral in the word's alphabet (`"0"` for zero).
#[must_use]
pub fn render(value: u64, word: WordBits) -> String {
    let digits = value_to_digits(value, word.radix());
    if digits.is_empty() {
        return word.digit_char(0).map(String::from).unwrap_or_default();
    }
    digits
        .iter()
        .filter_map(|digit| word.digit_char(*digit))
        .collect()
}

/// Parses a numeral written in the word's alphabet.
///
/// # Errors
///
/// Returns [`CodecError::InvalidDigit`] for characters outside the alphabet
/// and [`CodecError::Overflow`] when the value is wider than `word`.
pub fn parse(numeral: &str, word: WordBits) -> Result<u64, CodecError> {
    let digits = numeral
        .chars()
        .map(|ch| word.digit_value(ch))
        .collect::<Result<Vec<_>, _>>()?;
    digits_to_value(&digits, word)
}

#[allow(clippy::cast_possible_truncation)]
fn bytes_to_digits(bytes: &[u8], radix: u32) -> Vec<u8> {
    // Little-endian accumulator of base-`radix` digits.
    let mut digits: Vec<u8> = Vec::new();
    for &byte in bytes {
        let mut carry = u32::from(byte);
        for digit in &mut digits {
            carry += u32::from(*digit) << 8;
            *digit = (carry % radix) as u8;
            carry /= radix;
        }
        while carry > 0 {
            digits.push((carry % radix) as u8);
            carry /= radix;
        }
    }
    digits.reverse();
    digits
}

#[allow(clippy::cast_possible_truncation)]
fn digits_to_bytes(digits: &[u8], radix: u32) -> Vec<u8> {
    let mut bytes: Vec<u8> = Vec::new();
    for &digit in digits.iter().skip_while(|digit| **digit == 0) {
        let mut carry = u32::from(digit);
        for byte in &mut bytes {
            carry += u32::from(*byte) * radix;
            *byte = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }
    bytes.reverse();
    bytes
}

fn digits_to_value(digits: &[u8], word: WordBits) -> Result<u64, CodecError> {
    let overflow = CodecError::Overflow { bits: word.bits() };
    let value = digits.iter().try_fold(0_u64, |acc, digit| {
        acc.checked_mul(u64::from(word.radix()))
            .and_then(|shifted| shifted.checked_add(u64::from(*digit)))
            .ok_or(overflow)
    })?;
    if value > word.max_value() {
        return Err(overflow);
    }
    Ok(value)
}

#[allow(clippy::cast_possible_truncation)]
fn value_to_digits(mut value: u64, radix: u32) -> Vec<u8> {
    let radix = u64::from(radix);
    let mut digits = Vec::new();
    while value > 0 {
        digits.push((value % radix) as u8);
        value /= radix;
    }
    digits.reverse();
    digits
}
