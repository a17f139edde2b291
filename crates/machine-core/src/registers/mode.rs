use std::fmt;

/// x86 operating mode; selects the width of offset registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Mode {
    /// Real address mode, 16-bit offsets.
    #[default]
    Real,
    /// Protected virtual address mode, 32-bit offsets.
    Protected,
    /// Long mode, 64-bit offsets.
    Long,
}

impl Mode {
    /// All modes in ascending width order.
    pub const ALL: [Self; 3] = [Self::Real, Self::Protected, Self::Long];

    /// Register width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.width().bits()
    }

    /// Smallest legal offset.
    #[must_use]
    pub const fn min(self) -> u64 {
        0
    }

    /// Largest legal offset.
    #[must_use]
    pub const fn max(self) -> u64 {
        match self {
            Self::Real => 0xFFFF,
            Self::Protected => 0xFFFF_FFFF,
            Self::Long => u64::MAX,
        }
    }

    /// Returns `true` when `offset` lies in `[min, max]`.
    #[must_use]
    pub const fn contains(self, offset: u128) -> bool {
        offset >= self.min() as u128 && offset <= self.max() as u128
    }

    /// Width strategy used by registers in this mode.
    #[must_use]
    pub const fn width(self) -> RegisterWidth {
        match self {
            Self::Real => RegisterWidth::Bits16,
            Self::Protected => RegisterWidth::Bits32,
            Self::Long => RegisterWidth::Bits64,
        }
    }

    /// Canonical upper-case mode name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Real => "REAL",
            Self::Protected => "PROTECTED",
            Self::Long => "LONG",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Little-endian storage strategy for a register's backing cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterWidth {
    /// Two cells, read and written as `u16`.
    Bits16,
    /// Four cells, read and written as `u32`.
    Bits32,
    /// Eight cells, read and written as `u64`.
    Bits64,
}

impl RegisterWidth {
    /// Width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits16 => 16,
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// Width in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Bits16 => 2,
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }

    /// Writes `value` into the leading cells, little-endian, truncated to the width.
    #[allow(clippy::cast_possible_truncation)]
    pub fn store(self, cells: &mut [u8; 8], value: u64) {
        match self {
            Self::Bits16 => cells[..2].copy_from_slice(&(value as u16).to_le_bytes()),
            Self::Bits32 => cells[..4].copy_from_slice(&(value as u32).to_le_bytes()),
            Self::Bits64 => cells.copy_from_slice(&value.to_le_bytes()),
        }
    }

    /// Reads the leading cells back as a little-endian value.
    #[must_use]
    pub const fn load(self, cells: &[u8; 8]) -> u64 {
        match self {
            Self::Bits16 => u16::from_le_bytes([cells[0], cells[1]]) as u64,
            Self::Bits32 => u32::from_le_bytes([cells[0], cells[1], cells[2], cells[3]]) as u64,
            Self::Bits64 => u64::from_le_bytes(*cells),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Mode, RegisterWidth};

    #[rstest]
    #[case(Mode::Real, 16, 0xFFFF)]
    #[case(Mode::Protected, 32, 0xFFFF_FFFF)]
    #[case(Mode::Long, 64, u64::MAX)]
    fn mode_bounds_match_register_width(#[case] mode: Mode, #[case] bits: u32, #[case] max: u64) {
        assert_eq!(mode.bits(), bits);
        assert_eq!(mode.min(), 0);
        assert_eq!(mode.max(), max);
        assert!(mode.contains(u128::from(max)));
        assert!(!mode.contains(u128::from(max) + 1));
    }

    #[test]
    fn width_store_is_little_endian_and_truncating() {
        let mut cells = [0_u8; 8];
        RegisterWidth::Bits16.store(&mut cells, 0x1234);
        assert_eq!(cells, [0x34, 0x12, 0, 0, 0, 0, 0, 0]);

        RegisterWidth::Bits32.store(&mut cells, 0xDEAD_BEEF);
        assert_eq!(cells[..4], [0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(RegisterWidth::Bits32.load(&cells), 0xDEAD_BEEF);
        assert_eq!(RegisterWidth::Bits16.load(&cells), 0xBEEF);

        RegisterWidth::Bits64.store(&mut cells, 0x0102_0304_0506_0708);
        assert_eq!(cells, [8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn display_uses_canonical_names() {
        let names: Vec<String> = Mode::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["REAL", "PROTECTED", "LONG"]);
    }
}
