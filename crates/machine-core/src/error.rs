use instruction_codec::CodecError;
use thiserror::Error;

use crate::{Architecture, Mode};

/// Error classes used by hosts to separate wiring mistakes from protocol misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// Machine was assembled from inconsistent parts.
    Configuration,
    /// Bus or decode protocol was driven incorrectly.
    Protocol,
    /// A value or address fell outside its legal range.
    Range,
}

/// Fail-fast errors raised by the bus engine, memory and processor model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// Control signal name is not in the architecture's signal table.
    #[error("control signal `{signal}` is not defined for the {architecture} architecture")]
    InvalidSignal {
        /// Rejected signal name.
        signal: String,
        /// Architecture bound to the control bus.
        architecture: Architecture,
    },
    /// Control bus was driven without naming a signal.
    #[error("the {architecture} control bus requires a signal name")]
    MissingSignal {
        /// Architecture bound to the control bus.
        architecture: Architecture,
    },
    /// Memory access fell outside the backing buffer.
    #[error("address {address:#x} is outside the {len}-byte memory")]
    AddressOutOfRange {
        /// Requested byte address.
        address: u64,
        /// Buffer length in bytes.
        len: usize,
    },
    /// Decoder lookup outside the chip range.
    #[error("chip-select index {index} is outside 0..{chips}")]
    DecoderIndex {
        /// Requested chip-select input.
        index: u64,
        /// Number of decoded chip lines.
        chips: usize,
    },
    /// Decoder produced no active chip line for the address.
    #[error("no memory chip is selected for address {address:#x}")]
    NoChipSelected {
        /// Address that failed to select a chip.
        address: u64,
    },
    /// Memory topology does not cover the processor's address lines.
    #[error(
        "memory topology ({chip_select_bits} chip-select + {addressing_depth} addressing bits) \
         does not match {address_lines} cpu address lines"
    )]
    SpecMismatch {
        /// Bits needed to select a chip.
        chip_select_bits: u32,
        /// Bits needed to address a location inside a chip.
        addressing_depth: u32,
        /// Address lines driven by the processor.
        address_lines: u32,
    },
    /// Register offset outside the active mode's range.
    #[error("offset {offset:#x} is outside the {mode} mode range")]
    OffsetRange {
        /// Rejected offset.
        offset: u128,
        /// Active addressing mode.
        mode: Mode,
    },
    /// Cascading AND requires at least two inputs.
    #[error("cascading AND requires at least two inputs, got {inputs}")]
    Arity {
        /// Number of inputs supplied.
        inputs: usize,
    },
    /// Raw memory only supports 8, 16 and 32-bit words.
    #[error("unsupported memory word size: {bits} bits")]
    UnsupportedWordSize {
        /// Requested word size in bits.
        bits: u32,
    },
    /// Value does not fit in the configured memory word.
    #[error("value {value:#x} does not fit in a {bytes}-byte word")]
    WordOverflow {
        /// Rejected value.
        value: u64,
        /// Configured word size in bytes.
        bytes: usize,
    },
    /// Physical address computation is only defined for real mode.
    #[error("physical address computation is not supported in {mode} mode")]
    UnsupportedMode {
        /// Mode that was active during the fetch.
        mode: Mode,
    },
    /// Processor address-line count outside the supported range.
    #[error("address line count {lines} is outside 1..={max}")]
    AddressLines {
        /// Requested address-line count.
        lines: u32,
        /// Largest supported count.
        max: u32,
    },
    /// `READ` was strobed while no address was on the address bus.
    #[error("read strobed with no address latched")]
    NoAddressLatched,
    /// A bus handler was re-entered while it was still running.
    #[error("handler on channel {channel} re-entered during dispatch")]
    ReentrantDispatch {
        /// Channel whose dispatch recursed.
        channel: String,
    },
    /// Fetched word could not be decoded back into instruction text.
    #[error("instruction decode failed: {0}")]
    Codec(#[from] CodecError),
}

impl MachineError {
    /// Returns the reporting class for this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::SpecMismatch { .. }
            | Self::Arity { .. }
            | Self::UnsupportedWordSize { .. }
            | Self::UnsupportedMode { .. }
            | Self::AddressLines { .. } => ErrorClass::Configuration,
            Self::InvalidSignal { .. }
            | Self::MissingSignal { .. }
            | Self::NoChipSelected { .. }
            | Self::NoAddressLatched
            | Self::ReentrantDispatch { .. }
            | Self::Codec(_) => ErrorClass::Protocol,
            Self::AddressOutOfRange { .. }
            | Self::DecoderIndex { .. }
            | Self::OffsetRange { .. }
            | Self::WordOverflow { .. } => ErrorClass::Range,
        }
    }
}
