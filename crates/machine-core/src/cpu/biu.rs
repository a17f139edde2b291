//! Bus-interface unit: computes physical addresses and runs the fetch cycle.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info};

use crate::bus::{BusPayload, SystemBuses, READ};
use crate::cpu::queue::PrefetchQueue;
use crate::memory::validate_address_lines;
use crate::registers::{InstructionPointer, SegmentRegister, SegmentRegisters};
use crate::{MachineError, Mode};

/// Phase of the fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BiuState {
    /// No fetch in progress.
    #[default]
    Idle,
    /// Physical address driven onto the address bus.
    AddressSent,
    /// `READ` strobed on the control bus.
    ReadSignaled,
    /// Sampling the data bus.
    AwaitingData,
    /// A fetched word is waiting in the prefetch queue.
    DequeueReady,
}

/// Result of one [`BusInterfaceUnit::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Address driven onto the address bus.
    pub physical_address: u64,
    /// Word returned on the data bus, if any device answered.
    pub word: Option<u64>,
    /// `false` when no word arrived or the prefetch queue was full.
    pub enqueued: bool,
    /// States visited by the cycle, ending where it settled before
    /// returning to [`BiuState::Idle`].
    pub states: Vec<BiuState>,
}

/// Fetch half of the processor.
#[derive(Debug)]
pub struct BusInterfaceUnit {
    buses: SystemBuses,
    address_lines: u32,
    mode: Mode,
    segments: SegmentRegisters,
    ip: InstructionPointer,
    queue: PrefetchQueue,
    state: BiuState,
}

impl BusInterfaceUnit {
    /// Creates an idle unit bound to `buses`.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::AddressLines`] when `address_lines` is outside
    /// `1..=MAX_ADDRESS_LINES`.
    pub fn new(address_lines: u32, mode: Mode, buses: &SystemBuses) -> Result<Self, MachineError> {
        let address_lines = validate_address_lines(address_lines)?;
        Ok(Self {
            buses: buses.clone(),
            address_lines,
            mode,
            segments: SegmentRegisters::new(mode),
            ip: InstructionPointer::new(mode),
            queue: PrefetchQueue::new(),
            state: BiuState::Idle,
        })
    }

    /// Current fetch phase.
    #[must_use]
    pub const fn state(&self) -> BiuState {
        self.state
    }

    /// Segment registers.
    #[must_use]
    pub const fn segments(&self) -> &SegmentRegisters {
        &self.segments
    }

    /// Mutable segment registers.
    pub fn segments_mut(&mut self) -> &mut SegmentRegisters {
        &mut self.segments
    }

    /// Instruction pointer.
    #[must_use]
    pub const fn instruction_pointer(&self) -> &InstructionPointer {
        &self.ip
    }

    /// Mutable instruction pointer.
    pub fn instruction_pointer_mut(&mut self) -> &mut InstructionPointer {
        &mut self.ip
    }

    /// Prefetch queue.
    #[must_use]
    pub const fn queue(&self) -> &PrefetchQueue {
        &self.queue
    }

    /// Mutable prefetch queue.
    pub fn queue_mut(&mut self) -> &mut PrefetchQueue {
        &mut self.queue
    }

    /// Physical address of the next fetch: `CS * 16 + IP`, wrapped to the
    /// processor's address lines.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::UnsupportedMode`] outside real mode.
    pub fn physical_address(&self) -> Result<u64, MachineError> {
        if self.mode != Mode::Real {
            return Err(MachineError::UnsupportedMode { mode: self.mode });
        }
        let segment = u64::from(self.segments.base(SegmentRegister::Cs));
        let linear = (segment << 4) + self.ip.offset_value();
        Ok(linear & ((1_u64 << self.address_lines) - 1))
    }

    /// Runs one fetch cycle and advances the instruction pointer.
    ///
    /// The data-bus listener lives only for the duration of the cycle. A
    /// full prefetch queue drops the word and is reported through
    /// [`FetchOutcome::enqueued`].
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::UnsupportedMode`] outside real mode,
    /// [`MachineError::OffsetRange`] when the instruction pointer cannot
    /// advance, or any error raised by a device while handling the cycle.
    /// A failed cycle leaves the queue and instruction pointer untouched and
    /// the unit back in [`BiuState::Idle`].
    pub fn fetch(&mut self) -> Result<FetchOutcome, MachineError> {
        let outcome = self.run_cycle();
        self.transition(BiuState::Idle);
        outcome
    }

    fn run_cycle(&mut self) -> Result<FetchOutcome, MachineError> {
        let physical_address = self.physical_address()?;
        let mut next_ip = self.ip;
        next_ip.increment()?;
        let mut states = Vec::with_capacity(4);

        let received = Rc::new(Cell::new(None));
        let slot = Rc::clone(&received);
        let data_subscription = self.buses.data.subscribe(None, move |payload| {
            if let Some(word) = payload.word() {
                slot.set(Some(word));
            }
            Ok(())
        })?;

        self.buses
            .address
            .send(None, BusPayload::Address(physical_address))?;
        states.push(self.transition(BiuState::AddressSent));

        self.buses.control.send(Some(READ), BusPayload::Level(true))?;
        states.push(self.transition(BiuState::ReadSignaled));

        states.push(self.transition(BiuState::AwaitingData));
        let word = received.take();
        drop(data_subscription);
        self.buses.control.send(Some(READ), BusPayload::Level(false))?;

        let enqueued = match word {
            Some(word) => self.queue.enqueue(word).is_ok(),
            None => false,
        };
        if enqueued {
            states.push(self.transition(BiuState::DequeueReady));
        }

        self.ip = next_ip;
        info!(physical_address, ?word, enqueued, "fetch complete");
        Ok(FetchOutcome {
            physical_address,
            word,
            enqueued,
            states,
        })
    }

    fn transition(&mut self, next: BiuState) -> BiuState {
        debug!(from = ?self.state, to = ?next, "biu transition");
        self.state = next;
        next
    }
}
