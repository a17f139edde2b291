//! Register files owned by the bus-interface and execution units.

use crate::registers::{Mode, Register};

/// Segment registers held by the bus-interface unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentRegister {
    /// Code segment.
    Cs,
    /// Data segment.
    Ds,
    /// Stack segment.
    Ss,
    /// Extra segment.
    Es,
}

impl SegmentRegister {
    /// All segment registers in encoding order.
    pub const ALL: [Self; 4] = [Self::Cs, Self::Ds, Self::Ss, Self::Es];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Base-address registers of the bus-interface unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRegisters {
    registers: [Register; 4],
}

impl SegmentRegisters {
    /// Creates zero-based segments sized for `mode`.
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            registers: [Register::new(mode); 4],
        }
    }

    /// Reads a segment's base address.
    #[must_use]
    pub const fn base(&self, segment: SegmentRegister) -> u16 {
        self.registers[segment.index()].base_address()
    }

    /// Writes a segment's base address.
    pub fn set_base(&mut self, segment: SegmentRegister, base: u16) {
        self.registers[segment.index()].set_base_address(base);
    }

    /// Underlying register for a segment.
    #[must_use]
    pub const fn register(&self, segment: SegmentRegister) -> &Register {
        &self.registers[segment.index()]
    }
}

/// 16-bit general-purpose registers of the execution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneralRegister {
    /// Accumulator.
    Ax,
    /// Base register.
    Bx,
    /// Count register.
    Cx,
    /// Data register.
    Dx,
}

impl GeneralRegister {
    /// All general registers in encoding order.
    pub const ALL: [Self; 4] = [Self::Ax, Self::Bx, Self::Cx, Self::Dx];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Pointer and index registers of the execution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerRegister {
    /// Stack pointer.
    Sp,
    /// Base pointer.
    Bp,
    /// Source index.
    Si,
    /// Destination index.
    Di,
}

impl PointerRegister {
    /// All pointer/index registers in encoding order.
    pub const ALL: [Self; 4] = [Self::Sp, Self::Bp, Self::Si, Self::Di];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Execution-unit register file.
///
/// General registers are split into high and low bytes (`AH`/`AL` and so on);
/// pointer and index registers take the mode's width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralRegisters {
    words: [[u8; 2]; 4],
    pointers: [Register; 4],
}

impl GeneralRegisters {
    /// Creates a zeroed register file sized for `mode`.
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            words: [[0; 2]; 4],
            pointers: [Register::new(mode); 4],
        }
    }

    /// Reads a full 16-bit general register.
    #[must_use]
    pub const fn get(&self, reg: GeneralRegister) -> u16 {
        let [high, low] = self.words[reg.index()];
        u16::from_be_bytes([high, low])
    }

    /// Writes a full 16-bit general register.
    pub fn set(&mut self, reg: GeneralRegister, value: u16) {
        self.words[reg.index()] = value.to_be_bytes();
    }

    /// Reads the high byte (`AH`, `BH`, ...).
    #[must_use]
    pub const fn high_byte(&self, reg: GeneralRegister) -> u8 {
        self.words[reg.index()][0]
    }

    /// Reads the low byte (`AL`, `BL`, ...).
    #[must_use]
    pub const fn low_byte(&self, reg: GeneralRegister) -> u8 {
        self.words[reg.index()][1]
    }

    /// Writes the high byte, keeping the low byte.
    pub fn set_high_byte(&mut self, reg: GeneralRegister, value: u8) {
        self.words[reg.index()][0] = value;
    }

    /// Writes the low byte, keeping the high byte.
    pub fn set_low_byte(&mut self, reg: GeneralRegister, value: u8) {
        self.words[reg.index()][1] = value;
    }

    /// Pointer or index register.
    #[must_use]
    pub const fn pointer(&self, reg: PointerRegister) -> &Register {
        &self.pointers[reg.index()]
    }

    /// Mutable pointer or index register.
    pub fn pointer_mut(&mut self, reg: PointerRegister) -> &mut Register {
        &mut self.pointers[reg.index()]
    }
}
