//! HD44780 instruction encoding.
//!
//! Every instruction is a 10-bit word: the RS and R/W lines followed by the eight data lines,
//! DB7 first. Each command starts from a constant template and overlays its parameter bits on a
//! copy, so encoding is pure and never fails.
//!
//! | Command                 | RS | RW | DB7 | DB6 | DB5 | DB4 | DB3 | DB2 | DB1 | DB0 |
//! |-------------------------|----|----|-----|-----|-----|-----|-----|-----|-----|-----|
//! | Clear display           | 0  | 0  | 0   | 0   | 0   | 0   | 0   | 0   | 0   | 1   |
//! | Return home             | 0  | 0  | 0   | 0   | 0   | 0   | 0   | 0   | 1   | 1   |
//! | Entry mode set          | 0  | 0  | 0   | 0   | 0   | 0   | 0   | 1   | I/D | S   |
//! | Display on/off control  | 0  | 0  | 0   | 0   | 0   | 0   | 1   | D   | C   | B   |
//! | Cursor/display shift    | 0  | 0  | 0   | 0   | 0   | 1   | S/C | R/L | 0   | 0   |
//! | Function set            | 0  | 0  | 0   | 0   | 1   | DL  | N   | F   | 0   | 0   |
//! | Set CGRAM address       | 0  | 0  | 0   | 1   | A   | A   | A   | A   | A   | A   |
//! | Set DDRAM address       | 0  | 0  | 1   | A   | A   | A   | A   | A   | A   | A   |
//! | Read busy flag/address  | 0  | 1  | -   | -   | -   | -   | -   | -   | -   | -   |
//! | Write data              | 1  | 0  | D   | D   | D   | D   | D   | D   | D   | D   |
//! | Read data               | 1  | 1  | -   | -   | -   | -   | -   | -   | -   | -   |
use bitvec::prelude::{BitSlice, BitVec, Msb0};
use std::fmt::{Debug, Display, Formatter};

const RS: u16 = 1 << 9;
const RW: u16 = 1 << 8;
const DB7: u16 = 1 << 7;
const DB6: u16 = 1 << 6;
const DB5: u16 = 1 << 5;
const DB4: u16 = 1 << 4;
const DB3: u16 = 1 << 3;
const DB2: u16 = 1 << 2;
const DB1: u16 = 1 << 1;
const DB0: u16 = 1;

// Templates
const CLEAR_DISPLAY: u16 = DB0;
const RETURN_HOME: u16 = DB1 | DB0;
const ENTRY_MODE_SET: u16 = DB2;
const DISPLAY_CONTROL: u16 = DB3;
const CURSOR_DISPLAY_SHIFT: u16 = DB4;
const FUNCTION_SET: u16 = DB5;
const SET_CGRAM_ADDRESS: u16 = DB6;
const SET_DDRAM_ADDRESS: u16 = DB7;
const READ_BUSY_FLAG_AND_ADDRESS: u16 = RW;
const WRITE_DATA: u16 = RS;
const READ_DATA: u16 = RS | RW;

const CGRAM_ADDRESS_MASK: u8 = 0b0011_1111;
const DDRAM_ADDRESS_MASK: u8 = 0b0111_1111;

/// Direction the cursor moves after a read/write, or a shift moves in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing/reading data.
    Left,
    /// Moves the cursor to the right after writing/reading data.
    Right,
}

/// Width of the parallel data interface.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BitWidth {
    /// 4-bit interface, data sent as two nibbles over DB7-DB4.
    Four,
    #[default]
    Eight,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum LineCount {
    One,
    #[default]
    Two,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Font {
    #[default]
    Dots5x8,
    Dots5x10,
}

/// A single 10-bit HD44780 instruction word.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Instruction(u16);

impl Instruction {
    /// Number of bits in every instruction.
    pub const LEN: usize = 10;

    const fn with(self, bit: u16, value: bool) -> Self {
        if value {
            Self(self.0 | bit)
        } else {
            Self(self.0 & !bit)
        }
    }

    /// Clears the display and sets the cursor to the home position.
    pub const fn clear_display() -> Self {
        Self(CLEAR_DISPLAY)
    }

    /// Sets the cursor to the home position and undoes any display shift.
    pub const fn return_home() -> Self {
        Self(RETURN_HOME)
    }

    /// Sets the cursor direction after each data access and whether the display shifts with it.
    pub const fn entry_mode_set(direction: CursorDirection, shift_display: bool) -> Self {
        Self(ENTRY_MODE_SET)
            .with(DB1, matches!(direction, CursorDirection::Right))
            .with(DB0, shift_display)
    }

    /// Turns the display, the cursor and the cursor blinking on or off.
    pub const fn display_control(display_on: bool, cursor_on: bool, blink_on: bool) -> Self {
        Self(DISPLAY_CONTROL)
            .with(DB2, display_on)
            .with(DB1, cursor_on)
            .with(DB0, blink_on)
    }

    /// Moves the cursor, or shifts the whole display, by one position without touching DDRAM.
    pub const fn cursor_display_shift(shift_display: bool, direction: CursorDirection) -> Self {
        Self(CURSOR_DISPLAY_SHIFT)
            .with(DB3, shift_display)
            .with(DB2, matches!(direction, CursorDirection::Right))
    }

    /// Sets the interface width, the number of display lines and the font.
    pub const fn function_set(bit_width: BitWidth, lines: LineCount, font: Font) -> Self {
        Self(FUNCTION_SET)
            .with(DB4, matches!(bit_width, BitWidth::Eight))
            .with(DB3, matches!(lines, LineCount::Two))
            .with(DB2, matches!(font, Font::Dots5x10))
    }

    /// Sets the CGRAM address. Only the low 6 bits of `address` are used.
    pub const fn set_cgram_address(address: u8) -> Self {
        Self(SET_CGRAM_ADDRESS | (address & CGRAM_ADDRESS_MASK) as u16)
    }

    /// Sets the DDRAM address. Only the low 7 bits of `address` are used.
    pub const fn set_ddram_address(address: u8) -> Self {
        Self(SET_DDRAM_ADDRESS | (address & DDRAM_ADDRESS_MASK) as u16)
    }

    /// Requests the busy flag and address counter. The data bits are left at 0, they're
    /// driven by the chip, not by us.
    pub const fn read_busy_flag_and_address() -> Self {
        Self(READ_BUSY_FLAG_AND_ADDRESS)
    }

    /// Writes a byte into DDRAM or CGRAM, wherever the address counter points.
    pub const fn write_data(data: u8) -> Self {
        Self(WRITE_DATA | data as u16)
    }

    /// Requests a byte from DDRAM or CGRAM. The data bits are left at 0.
    pub const fn read_data() -> Self {
        Self(READ_DATA)
    }

    /// Gets the raw word, RS in bit 9 down to DB0 in bit 0.
    pub const fn word(self) -> u16 {
        self.0
    }

    /// Gets the register select bit (`true` for data, `false` for instructions).
    pub const fn rs(self) -> bool {
        self.0 & RS != 0
    }

    /// Gets the read/write bit (`true` for read).
    pub const fn rw(self) -> bool {
        self.0 & RW != 0
    }

    /// Gets the eight data bits.
    pub const fn data(self) -> u8 {
        self.0 as u8
    }

    /// Gets the line levels in bus order: RS, R/W, DB7, DB6, ..., DB0.
    pub fn bits(self) -> [bool; Self::LEN] {
        let mut bits = [false; Self::LEN];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = self.0 & (1 << (Self::LEN - 1 - i)) != 0;
        }
        bits
    }

    /// Gets the line levels as a bit vector in bus order.
    pub fn to_bitvec(self) -> BitVec<u8, Msb0> {
        self.bits().into_iter().collect()
    }

    /// Builds an instruction from line levels in bus order.
    ///
    /// Returns `None` unless exactly [Self::LEN] bits are given.
    pub fn from_bits(bits: &BitSlice<u8, Msb0>) -> Option<Self> {
        if bits.len() != Self::LEN {
            return None;
        }
        let word = bits
            .iter()
            .by_vals()
            .fold(0u16, |word, bit| (word << 1) | bit as u16);
        Some(Self(word))
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:010b}", self.0)
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instruction(RS: {}, RW: {}, DB: {:08b})",
            self.rs() as u8,
            self.rw() as u8,
            self.data()
        )
    }
}
