mod gpio;

use crate::GpioError;
use crate::lcd::hd44780::instruction::Instruction;
pub use crate::lcd::hd44780::instruction::{BitWidth, CursorDirection, Font, LineCount};
pub use gpio::*;
use log::warn;
use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("failed to bind {role} to GPIO pin {pin}: {source}")]
    Bind {
        role: PinRole,
        pin: usize,
        #[source]
        source: GpioError,
    },
    #[error("the display is already initialized")]
    AlreadyConfigured,
    #[error("4-bit transfer mode is not supported")]
    Unsupported4BitMode,
    #[error(transparent)]
    Gpio(#[from] GpioError),
}

pub type LcdResult<T> = Result<T, LcdError>;

/// Logical role of a line on the HD44780 parallel bus.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PinRole {
    /// Register select.
    Rs,
    /// Read/write select.
    Rw,
    /// Enable strobe.
    Enable,
    /// Data line, 0 to 7.
    Data(u8),
}

impl Display for PinRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PinRole::Rs => write!(f, "RS"),
            PinRole::Rw => write!(f, "R/W"),
            PinRole::Enable => write!(f, "E"),
            PinRole::Data(n) => write!(f, "D{}", n),
        }
    }
}

/// GPIO pin numbers for every line of the 8-bit parallel bus.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HD44780PinMapping {
    pub rs: usize,
    pub rw: usize,
    pub enable: usize,
    /// Data pins, D0 first.
    pub data: [usize; 8],
}

/// Display settings sent to the chip through function set and display control.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayConfig {
    pub display_on: bool,
    pub cursor_on: bool,
    pub cursor_blink: bool,
    pub bit_width: BitWidth,
    pub lines: LineCount,
    pub font: Font,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            display_on: true,
            cursor_on: true,
            cursor_blink: false,
            bit_width: BitWidth::Eight,
            lines: LineCount::Two,
            font: Font::Dots5x8,
        }
    }
}

impl DisplayConfig {
    pub fn function_set(&self) -> Instruction {
        Instruction::function_set(self.bit_width, self.lines, self.font)
    }

    pub fn display_control(&self) -> Instruction {
        Instruction::display_control(self.display_on, self.cursor_on, self.cursor_blink)
    }
}

pub trait HD44780Driver: Debug {
    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.send_instruction(Instruction::clear_display())
    }

    /// Sets the cursor to the home position.
    fn return_home(&mut self) -> LcdResult<()> {
        self.send_instruction(Instruction::return_home())
    }

    /// Sets the display to the specified entry mode.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> LcdResult<()> {
        self.send_instruction(Instruction::entry_mode_set(cursor_direction, shift))
    }

    /// Moves the cursor or shifts the display.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> LcdResult<()> {
        self.send_instruction(Instruction::cursor_display_shift(display_shift, direction))
    }

    /// Sets the CGRAM address. Only the low 6 bits are used.
    fn set_cgram_address(&mut self, address: u8) -> LcdResult<()> {
        self.send_instruction(Instruction::set_cgram_address(address))
    }

    /// Sets the DDRAM address. Only the low 7 bits are used.
    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        self.send_instruction(Instruction::set_ddram_address(address))
    }

    /// Writes one byte to DDRAM or CGRAM.
    fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.send_instruction(Instruction::write_data(data))
    }

    /// Writes text at the cursor.
    ///
    /// Each character is sent as its 8-bit code, so U+0080 to U+00FF go out as their Latin-1 byte
    /// and show whatever the character ROM has there. Characters past U+00FF have no code and are
    /// replaced with `?`. There is no wrapping, text past the end of a line goes wherever the
    /// chip puts it.
    fn write(&mut self, text: &str) -> LcdResult<()> {
        for c in text.chars() {
            match u8::try_from(c) {
                Ok(code) => self.send_data(code)?,
                Err(_) => {
                    warn!("Character without an 8-bit code: {}", c);
                    self.send_data(b'?')?;
                }
            }
        }
        Ok(())
    }

    /// Writes raw character codes at the cursor.
    fn write_bytes(&mut self, bytes: &[u8]) -> LcdResult<()> {
        for &byte in bytes {
            self.send_data(byte)?;
        }
        Ok(())
    }

    /// Transmits one instruction word over the bus.
    fn send_instruction(&mut self, instruction: Instruction) -> LcdResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects instructions instead of sending them.
    #[derive(Debug, Default)]
    struct SpyDriver {
        sent: Vec<Instruction>,
    }

    impl HD44780Driver for SpyDriver {
        fn send_instruction(&mut self, instruction: Instruction) -> LcdResult<()> {
            self.sent.push(instruction);
            Ok(())
        }
    }

    #[test]
    fn write_sends_one_data_word_per_character() {
        let mut spy = SpyDriver::default();
        spy.write("Hi").unwrap();
        assert_eq!(
            spy.sent,
            vec![Instruction::write_data(0x48), Instruction::write_data(0x69)]
        );
    }

    #[test]
    fn write_sends_latin1_codes() {
        let mut spy = SpyDriver::default();
        spy.write("°é").unwrap();
        assert_eq!(
            spy.sent,
            vec![Instruction::write_data(0xB0), Instruction::write_data(0xE9)]
        );
    }

    #[test]
    fn write_replaces_characters_past_latin1() {
        let mut spy = SpyDriver::default();
        spy.write("5€").unwrap();
        assert_eq!(
            spy.sent,
            vec![Instruction::write_data(b'5'), Instruction::write_data(b'?')]
        );
    }

    #[test]
    fn write_bytes_passes_codes_through() {
        let mut spy = SpyDriver::default();
        spy.write_bytes(&[0x00, 0xDF]).unwrap();
        assert_eq!(
            spy.sent,
            vec![Instruction::write_data(0x00), Instruction::write_data(0xDF)]
        );
    }

    #[test]
    fn default_config() {
        let config = DisplayConfig::default();
        assert_eq!(config.display_control().to_string(), "0000001110");
        assert_eq!(config.function_set().to_string(), "0000111000");
    }

    #[test]
    fn bind_error_names_the_role() {
        let err = LcdError::Bind {
            role: PinRole::Data(5),
            pin: 12,
            source: GpioError::AlreadyInUse,
        };
        assert_eq!(err.to_string(), "failed to bind D5 to GPIO pin 12: pin already in use");
    }
}
