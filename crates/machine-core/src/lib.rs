//! Bus-signaling and address-decoding engine for a didactic x86 machine.
//!
//! A [`Microprocessor`] and a [`Memory`] chip array talk over instance-owned
//! [`SystemBuses`]: the processor drives an address, strobes `READ`, and the
//! memory decodes the address through a gate-level one-hot chip selector and
//! answers on the data bus.

/// Primitive logic gates and truth-table generation.
pub mod gates;
pub use gates::{and, cascade_and, generate_truth_table, not, or, Bit, TruthTable};

/// One-hot chip-select decoder built from AND-of-literals terms.
pub mod decoder;
pub use decoder::ChipSelectDecoder;

/// Mode-width registers and register files.
pub mod registers;
pub use registers::{
    GeneralRegister, GeneralRegisters, InstructionPointer, Mode, PointerRegister, Register,
    RegisterWidth, SegmentRegister, SegmentRegisters, DEFAULT_INSTRUCTION_SIZE,
};

/// Publish/subscribe buses with architecture-checked control signals.
pub mod bus;
pub use bus::{
    Architecture, Bus, BusKind, BusPayload, ChannelKey, ControlSignalSpec, SignalPolicy,
    Subscription, SystemBuses, MEMORY_IO, READ, WRITE, X86_CONTROL_SIGNALS,
};

/// Raw storage, chip topology and the memory read protocol.
pub mod memory;
pub use memory::{
    ChipSpec, Memory, MemoryTopology, RawMemoryBuffer, ReadRequest, ReadResponse, WordSize,
    MAX_ADDRESS_LINES, MEMORY_CHIPS,
};

/// Bus-interface unit, prefetch queue and execution unit.
pub mod cpu;
pub use cpu::{
    BiuState, BusInterfaceUnit, DecodedInstruction, ExecutionUnit, FetchOutcome, Microprocessor,
    PrefetchQueue, QueueFull, PREFETCH_QUEUE_CAPACITY,
};

/// Machine wiring parameters.
pub mod config;
pub use config::{MachineConfig, DEFAULT_ADDRESS_LINES};

/// Error taxonomy shared by every component.
pub mod error;
pub use error::{ErrorClass, MachineError};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
