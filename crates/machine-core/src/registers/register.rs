use crate::registers::{Mode, RegisterWidth};
use crate::MachineError;

/// Byte step applied by [`InstructionPointer::increment`].
///
/// Instruction length is not decoded, so every fetch advances by one byte.
pub const DEFAULT_INSTRUCTION_SIZE: u64 = 1;

/// A register whose storage width follows the addressing mode.
///
/// The same type serves as an offset register (pointer, index, instruction
/// pointer) and as a base-address register (segments). Base addresses are
/// always stored as 16-bit little-endian values, whatever the mode width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    mode: Mode,
    width: RegisterWidth,
    cells: [u8; 8],
}

impl Register {
    /// Creates a zeroed register sized for `mode`.
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            width: mode.width(),
            cells: [0; 8],
        }
    }

    /// Mode the register was sized for.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Width strategy resolved from the mode.
    #[must_use]
    pub const fn width(&self) -> RegisterWidth {
        self.width
    }

    /// Stores an offset.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::OffsetRange`] when `offset` is outside the mode's
    /// `[MIN, MAX]` range.
    pub fn set_offset(&mut self, offset: u64) -> Result<(), MachineError> {
        self.check_offset(u128::from(offset))?;
        self.width.store(&mut self.cells, offset);
        Ok(())
    }

    /// Reads the offset at the mode's width.
    #[must_use]
    pub const fn offset_value(&self) -> u64 {
        self.width.load(&self.cells)
    }

    /// Stores a base address as a 16-bit little-endian value.
    pub fn set_base_address(&mut self, base: u16) {
        self.cells[..2].copy_from_slice(&base.to_le_bytes());
    }

    /// Reads the 16-bit little-endian base address.
    #[must_use]
    pub const fn base_address(&self) -> u16 {
        u16::from_le_bytes([self.cells[0], self.cells[1]])
    }

    fn check_offset(&self, offset: u128) -> Result<(), MachineError> {
        if self.mode.contains(offset) {
            Ok(())
        } else {
            Err(MachineError::OffsetRange {
                offset,
                mode: self.mode,
            })
        }
    }
}

/// Instruction pointer: an offset register that advances after each fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionPointer {
    register: Register,
}

impl InstructionPointer {
    /// Creates an instruction pointer at offset zero.
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            register: Register::new(mode),
        }
    }

    /// Current offset.
    #[must_use]
    pub const fn offset_value(&self) -> u64 {
        self.register.offset_value()
    }

    /// Moves the pointer to `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::OffsetRange`] when `offset` is outside the mode range.
    pub fn set_offset(&mut self, offset: u64) -> Result<(), MachineError> {
        self.register.set_offset(offset)
    }

    /// Advances by the fixed one-byte instruction size.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::OffsetRange`] when the pointer would pass the mode's
    /// maximum offset. The pointer is left unchanged in that case.
    pub fn increment(&mut self) -> Result<(), MachineError> {
        self.increment_by(DEFAULT_INSTRUCTION_SIZE)
    }

    /// Advances by `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::OffsetRange`] when the pointer would pass the mode's
    /// maximum offset. The pointer is left unchanged in that case.
    pub fn increment_by(&mut self, size: u64) -> Result<(), MachineError> {
        let next = u128::from(self.offset_value()) + u128::from(size);
        self.register.check_offset(next)?;
        self.register.set_offset(u64::try_from(next).unwrap_or(u64::MAX))
    }

    /// Returns to offset zero.
    pub fn reset(&mut self) {
        self.register.width.store(&mut self.register.cells, 0);
    }

    /// Underlying register.
    #[must_use]
    pub const fn register(&self) -> &Register {
        &self.register
    }
}
