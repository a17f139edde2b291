//! Mode-parameterized register model.

/// Register files of the bus-interface and execution units.
pub mod file;
/// Addressing modes and their register width strategies.
pub mod mode;
/// The width-polymorphic register and the instruction pointer.
pub mod register;

pub use file::{GeneralRegister, GeneralRegisters, PointerRegister, SegmentRegister, SegmentRegisters};
pub use mode::{Mode, RegisterWidth};
pub use register::{InstructionPointer, Register, DEFAULT_INSTRUCTION_SIZE};
