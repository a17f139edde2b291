//! Instruction codec for the x86 bus simulator.
//!
//! Translates instruction text into machine words and back, using the
//! positional alphabet selected by the word width.

/// Positional alphabets keyed by word width.
pub mod alphabet;
pub use alphabet::{WordBits, BASE16_ALPHABET, BASE32_ALPHABET, BASE8_ALPHABET};

/// Text to word encode/decode pipeline.
pub mod codec;
pub use codec::{decode, encode, parse, render};

/// Codec error taxonomy.
pub mod error;
pub use error::CodecError;
