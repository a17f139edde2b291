//! Microprocessor model: a bus-interface unit feeding a prefetch queue that
//! the execution unit drains.

/// Fetch cycle and physical addressing.
pub mod biu;
/// Register file and instruction decode.
pub mod eu;
/// Bounded prefetch FIFO.
pub mod queue;

pub use biu::{BiuState, BusInterfaceUnit, FetchOutcome};
pub use eu::{DecodedInstruction, ExecutionUnit};
pub use queue::{PrefetchQueue, QueueFull, PREFETCH_QUEUE_CAPACITY};

use instruction_codec::WordBits;
use tracing::debug;

use crate::bus::SystemBuses;
use crate::memory::validate_address_lines;
use crate::registers::{InstructionPointer, SegmentRegister};
use crate::{MachineError, Mode};

/// An 8086-style processor bound to one machine's buses.
#[derive(Debug)]
pub struct Microprocessor {
    address_lines: u32,
    mode: Mode,
    biu: BusInterfaceUnit,
    eu: ExecutionUnit,
}

impl Microprocessor {
    /// Creates a processor driving `address_lines` lines in `mode`, decoding
    /// fetched words with the 8-bit alphabet.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::AddressLines`] when `address_lines` is outside
    /// `1..=MAX_ADDRESS_LINES`.
    pub fn new(address_lines: u32, mode: Mode, buses: &SystemBuses) -> Result<Self, MachineError> {
        let address_lines = validate_address_lines(address_lines)?;
        Ok(Self {
            address_lines,
            mode,
            biu: BusInterfaceUnit::new(address_lines, mode, buses)?,
            eu: ExecutionUnit::new(mode, WordBits::default()),
        })
    }

    /// Replaces the decode alphabet, keeping register contents.
    #[must_use]
    pub fn with_codec_word(mut self, codec_word: WordBits) -> Self {
        self.eu.set_codec_word(codec_word);
        self
    }

    /// Number of address lines.
    #[must_use]
    pub const fn address_lines(&self) -> u32 {
        self.address_lines
    }

    /// Addressing mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Bus-interface unit.
    #[must_use]
    pub const fn biu(&self) -> &BusInterfaceUnit {
        &self.biu
    }

    /// Execution unit.
    #[must_use]
    pub const fn eu(&self) -> &ExecutionUnit {
        &self.eu
    }

    /// Mutable execution unit.
    pub fn eu_mut(&mut self) -> &mut ExecutionUnit {
        &mut self.eu
    }

    /// Current fetch phase.
    #[must_use]
    pub const fn biu_state(&self) -> BiuState {
        self.biu.state()
    }

    /// Words waiting in the prefetch queue.
    #[must_use]
    pub const fn queue_len(&self) -> usize {
        self.biu.queue().len()
    }

    /// Instruction pointer.
    #[must_use]
    pub const fn instruction_pointer(&self) -> &InstructionPointer {
        self.biu.instruction_pointer()
    }

    /// Loads the code segment base.
    pub fn set_code_segment(&mut self, base: u16) {
        self.biu.segments_mut().set_base(SegmentRegister::Cs, base);
    }

    /// Moves the instruction pointer and discards prefetched words.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::OffsetRange`] when `offset` is outside the mode range.
    pub fn jump(&mut self, offset: u64) -> Result<(), MachineError> {
        self.biu.instruction_pointer_mut().set_offset(offset)?;
        self.biu.queue_mut().flush();
        debug!(offset, "prefetch queue flushed");
        Ok(())
    }

    /// Fetches the next word into the prefetch queue.
    ///
    /// # Errors
    ///
    /// See [`BusInterfaceUnit::fetch`].
    pub fn fetch(&mut self) -> Result<FetchOutcome, MachineError> {
        self.biu.fetch()
    }

    /// Takes the oldest prefetched word.
    pub fn next_instruction(&mut self) -> Option<u64> {
        self.biu.queue_mut().dequeue()
    }

    /// Takes the oldest prefetched word and decodes it, or returns `None` when
    /// the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::Codec`] when the word is not valid instruction
    /// text. The word is consumed either way.
    pub fn decode(&mut self) -> Result<Option<DecodedInstruction>, MachineError> {
        self.next_instruction()
            .map(|word| self.eu.decode(word))
            .transpose()
    }
}
