//! Chip-array memory that answers the processor's read protocol.
//!
//! The processor drives an address onto the address bus and strobes `READ` on
//! the control bus. Memory latches every address it sees, and on `READ = true`
//! resolves the latched address into a chip and an in-chip location, then
//! publishes the stored word on the data bus before the strobe returns.

/// Little-endian byte store.
pub mod raw;
/// Chip geometry derived from address lines and the chip model.
pub mod topology;

pub use raw::{RawMemoryBuffer, WordSize};
pub use topology::{validate_address_lines, ChipSpec, MemoryTopology, MAX_ADDRESS_LINES, MEMORY_CHIPS};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info};

use crate::bus::{BusPayload, Subscription, SystemBuses, READ};
use crate::cpu::Microprocessor;
use crate::decoder::ChipSelectDecoder;
use crate::gates::Bit;
use crate::MachineError;

/// Explicit read request for [`Memory::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadRequest {
    /// Caller-chosen correlation id echoed in the response.
    pub id: u64,
    /// Location address as driven on the address lines.
    pub address: u64,
}

/// Answer to a [`ReadRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadResponse {
    /// Id of the originating request.
    pub id: u64,
    /// Requested address.
    pub address: u64,
    /// Word stored at the address.
    pub word: u64,
}

#[derive(Debug)]
struct MemoryCore {
    topology: MemoryTopology,
    decoder: ChipSelectDecoder,
    buffer: RawMemoryBuffer,
    latched_address: Option<u64>,
}

impl MemoryCore {
    /// High-order bits pick the chip, low-order bits the location inside it.
    fn byte_offset(&self, address: u64) -> Result<usize, MachineError> {
        let depth = self.topology.addressing_depth;
        let chip = self
            .decoder
            .chip_selection_value(address >> depth)?
            .ok_or(MachineError::NoChipSelected { address })?;
        let internal = address & self.topology.internal_mask();
        let location = (chip << depth) | internal;
        let word_bytes = self.topology.chip.word_size.bytes() as u64;
        usize::try_from(location * word_bytes).map_err(|_| MachineError::AddressOutOfRange {
            address,
            len: self.buffer.len(),
        })
    }

    fn lookup(&self, address: u64) -> Result<u64, MachineError> {
        let offset = self.byte_offset(address)?;
        self.buffer.get_value(offset)
    }
}

/// Memory chip array bound to one machine's buses.
///
/// Dropping the value unsubscribes its bus handlers.
#[derive(Debug)]
pub struct Memory {
    core: Rc<RefCell<MemoryCore>>,
    _subscriptions: Vec<Subscription>,
}

impl Memory {
    /// Builds the chip array for `cpu` and subscribes it to `buses`.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::SpecMismatch`] when `chip` cannot tile the
    /// processor's address space, or a bus subscription error.
    pub fn new(
        cpu: &Microprocessor,
        chip: ChipSpec,
        buses: &SystemBuses,
    ) -> Result<Self, MachineError> {
        let topology = MemoryTopology::derive(cpu.address_lines(), chip)?;
        let decoder = ChipSelectDecoder::new(topology.number_of_chips, topology.chip_select_bits)?;
        let buffer = RawMemoryBuffer::with_word_size(topology.total_bytes, chip.word_size);
        info!(
            total_bytes = topology.total_bytes,
            chips = topology.number_of_chips,
            chip_select_bits = topology.chip_select_bits,
            addressing_depth = topology.addressing_depth,
            "memory attached"
        );

        let core = Rc::new(RefCell::new(MemoryCore {
            topology,
            decoder,
            buffer,
            latched_address: None,
        }));

        let latch = Rc::downgrade(&core);
        let address_subscription = buses.address.subscribe(None, move |payload| {
            if let (Some(core), Some(address)) = (latch.upgrade(), payload.address()) {
                core.borrow_mut().latched_address = Some(address);
            }
            Ok(())
        })?;

        let responder = Rc::downgrade(&core);
        let data_bus = buses.data.clone();
        let read_subscription = buses.control.subscribe(Some(READ), move |payload| {
            if payload.level() != Some(true) {
                return Ok(());
            }
            let Some(word) = respond(&responder)? else {
                return Ok(());
            };
            data_bus.send(None, BusPayload::Word(word))
        })?;

        Ok(Self {
            core,
            _subscriptions: vec![address_subscription, read_subscription],
        })
    }

    /// Derived chip geometry.
    #[must_use]
    pub fn topology(&self) -> MemoryTopology {
        self.core.borrow().topology
    }

    /// Address most recently seen on the address bus.
    #[must_use]
    pub fn latched_address(&self) -> Option<u64> {
        self.core.borrow().latched_address
    }

    /// One-hot chip-select lines for `address`.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::DecoderIndex`] when the address lies beyond the
    /// chip array.
    pub fn chip_select_lines(&self, address: u64) -> Result<Vec<Bit>, MachineError> {
        let core = self.core.borrow();
        core.decoder
            .decode_lines(address >> core.topology.addressing_depth)
    }

    /// Stores `value` at byte address `address`.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::AddressOutOfRange`] outside `0..total_bytes` and
    /// [`MachineError::WordOverflow`] when `value` is wider than a word.
    pub fn write(&mut self, address: u64, value: u64) -> Result<(), MachineError> {
        let mut core = self.core.borrow_mut();
        let len = core.buffer.len();
        let offset = usize::try_from(address)
            .ok()
            .filter(|offset| *offset < len)
            .ok_or(MachineError::AddressOutOfRange { address, len })?;
        core.buffer.store_value(offset, value)?;
        info!(address, value, "memory write");
        Ok(())
    }

    /// Reads one word without going through the buses.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::DecoderIndex`] or
    /// [`MachineError::AddressOutOfRange`] when `request.address` is outside
    /// the chip array.
    pub fn read(&self, request: ReadRequest) -> Result<ReadResponse, MachineError> {
        let word = self.core.borrow().lookup(request.address)?;
        Ok(ReadResponse {
            id: request.id,
            address: request.address,
            word,
        })
    }
}

/// Resolves the latched address, releasing the core borrow before the caller
/// drives the data bus.
fn respond(core: &Weak<RefCell<MemoryCore>>) -> Result<Option<u64>, MachineError> {
    let Some(core) = core.upgrade() else {
        return Ok(None);
    };
    let core = core.borrow();
    let address = core.latched_address.ok_or(MachineError::NoAddressLatched)?;
    let word = core.lookup(address)?;
    debug!(address, word, "memory read");
    Ok(Some(word))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{ChipSpec, Memory, ReadRequest, MEMORY_CHIPS};
    use crate::bus::{BusPayload, SystemBuses, READ};
    use crate::cpu::Microprocessor;
    use crate::gates::Bit;
    use crate::memory::WordSize;
    use crate::{Architecture, MachineError, Mode};

    fn machine(address_lines: u32, chip: ChipSpec) -> (SystemBuses, Microprocessor, Memory) {
        let buses = SystemBuses::new(Architecture::X86);
        let cpu = Microprocessor::new(address_lines, Mode::Real, &buses).expect("cpu");
        let memory = Memory::new(&cpu, chip, &buses).expect("memory");
        (buses, cpu, memory)
    }

    fn data_recorder(buses: &SystemBuses) -> (Rc<RefCell<Vec<u64>>>, crate::bus::Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscription = buses
            .data
            .subscribe(None, move |payload| {
                sink.borrow_mut().extend(payload.word());
                Ok(())
            })
            .expect("data subscription");
        (seen, subscription)
    }

    #[test]
    fn default_chips_cover_ten_address_lines() {
        let (_buses, _cpu, memory) = machine(10, MEMORY_CHIPS);
        let topology = memory.topology();
        assert_eq!(topology.total_bytes, 1024);
        assert_eq!(topology.chip_select_bits + topology.addressing_depth, 10);
    }

    #[test]
    fn mismatched_chips_fail_construction() {
        let buses = SystemBuses::new(Architecture::X86);
        let cpu = Microprocessor::new(10, Mode::Real, &buses).expect("cpu");
        let chip = ChipSpec {
            locations_per_chip: 100,
            word_size: WordSize::Byte,
        };
        assert!(matches!(
            Memory::new(&cpu, chip, &buses),
            Err(MachineError::SpecMismatch { .. })
        ));
    }

    #[test]
    fn write_outside_total_bytes_is_rejected() {
        let (_buses, _cpu, mut memory) = machine(10, MEMORY_CHIPS);
        assert_eq!(
            memory.write(1024, 1),
            Err(MachineError::AddressOutOfRange {
                address: 1024,
                len: 1024
            })
        );
        assert!(memory.write(1023, 0xFF).is_ok());
    }

    #[test]
    fn read_strobe_publishes_latched_word_on_data_bus() {
        let (buses, _cpu, mut memory) = machine(10, MEMORY_CHIPS);
        memory.write(0x185, 0x4D).expect("write");
        let (seen, _subscription) = data_recorder(&buses);

        buses
            .address
            .send(None, BusPayload::Address(0x185))
            .expect("address");
        buses
            .control
            .send(Some(READ), BusPayload::Level(true))
            .expect("read");

        assert_eq!(memory.latched_address(), Some(0x185));
        assert_eq!(*seen.borrow(), vec![0x4D]);
    }

    #[test]
    fn read_without_address_fails() {
        let (buses, _cpu, _memory) = machine(10, MEMORY_CHIPS);
        assert_eq!(
            buses.control.send(Some(READ), BusPayload::Level(true)),
            Err(MachineError::NoAddressLatched)
        );
    }

    #[test]
    fn deasserted_read_is_ignored() {
        let (buses, _cpu, _memory) = machine(10, MEMORY_CHIPS);
        let (seen, _subscription) = data_recorder(&buses);
        buses
            .control
            .send(Some(READ), BusPayload::Level(false))
            .expect("read low");
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn explicit_read_echoes_request_id() {
        let (_buses, _cpu, mut memory) = machine(10, MEMORY_CHIPS);
        memory.write(0x3FF, 7).expect("write");
        let response = memory
            .read(ReadRequest {
                id: 42,
                address: 0x3FF,
            })
            .expect("read");
        assert_eq!(response.id, 42);
        assert_eq!(response.address, 0x3FF);
        assert_eq!(response.word, 7);
    }

    #[test]
    fn wide_words_are_located_by_word_index() {
        let chip = ChipSpec {
            locations_per_chip: 256,
            word_size: WordSize::Word,
        };
        let (_buses, _cpu, mut memory) = machine(10, chip);
        memory.write(2 * 0x101, 0xBEEF).expect("write");
        let response = memory
            .read(ReadRequest {
                id: 0,
                address: 0x101,
            })
            .expect("read");
        assert_eq!(response.word, 0xBEEF);
    }

    #[test]
    fn addresses_beyond_the_chip_array_fail_lookup() {
        let (_buses, _cpu, memory) = machine(10, MEMORY_CHIPS);
        assert_eq!(
            memory.read(ReadRequest {
                id: 1,
                address: 0x400
            }),
            Err(MachineError::DecoderIndex { index: 8, chips: 8 })
        );
    }

    #[test]
    fn high_address_bits_select_the_chip() {
        let (_buses, _cpu, mut memory) = machine(10, MEMORY_CHIPS);
        // Chip 3, internal location 0x05.
        memory.write(0x185, 7).expect("write");
        memory.write(0x005, 1).expect("write");
        memory.write(0x105, 2).expect("write");

        let response = memory
            .read(ReadRequest {
                id: 0,
                address: 0x185,
            })
            .expect("0x185 resolves inside the array");
        assert_eq!(response.word, 7);
        for (address, word) in [(0x005, 1), (0x105, 2)] {
            let response = memory.read(ReadRequest { id: 0, address }).expect("read");
            assert_eq!(response.word, word);
        }
    }

    #[test]
    fn chip_select_lines_are_one_hot() {
        let (_buses, _cpu, memory) = machine(10, MEMORY_CHIPS);
        let lines = memory.chip_select_lines(0x185).expect("lines");
        assert_eq!(lines.len(), 8);
        assert_eq!(lines.iter().filter(|bit| **bit == Bit::One).count(), 1);
        assert_eq!(lines[3], Bit::One);
    }

    #[test]
    fn dropping_memory_unsubscribes_handlers() {
        let (buses, _cpu, memory) = machine(10, MEMORY_CHIPS);
        assert_eq!(buses.control.listener_count(Some(READ)), Ok(1));
        drop(memory);
        assert_eq!(buses.control.listener_count(Some(READ)), Ok(0));
        assert_eq!(buses.address.listener_count(None), Ok(0));
    }
}
