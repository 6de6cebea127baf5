use crate::delay::{Delay, ThreadDelay};
use crate::lcd::hd44780::driver::{
    BitWidth, CursorDirection, DisplayConfig, Font, HD44780Driver, HD44780PinMapping, LcdError,
    LcdResult, LineCount, PinRole,
};
use crate::lcd::hd44780::instruction::Instruction;
use crate::{GpioDriver, GpioPin, GpioResult};
use bitvec::prelude::{BitSlice, Msb0};
use log::{debug, trace};
use std::time::Duration;

/// DDRAM holds two lines of 40 characters whatever the visible width of the module is.
const DDRAM_LINE_STRIDE: usize = 40;
const MAX_ROW: usize = 1;
const MAX_COLUMN: usize = 40;

/// How long each Enable level is held unless [GpioHD44780Driver::with_hold_time] says otherwise.
pub const DEFAULT_HOLD_TIME: Duration = Duration::from_millis(1);

/// Execution time of clear display and return home. Everything else finishes in 37 us.
const SLOW_COMMAND_TIME: Duration = Duration::from_micros(1520);

/// The bound bus lines. Their existence is what makes the driver configured.
#[derive(Debug)]
struct HD44780Pins<'a> {
    rs: Box<dyn GpioPin + 'a>,
    rw: Box<dyn GpioPin + 'a>,
    enable: Box<dyn GpioPin + 'a>,
    /// D0 first.
    data: Vec<Box<dyn GpioPin + 'a>>,
}

impl<'a> HD44780Pins<'a> {
    fn bind(gpio: &'a dyn GpioDriver, mapping: &HD44780PinMapping) -> LcdResult<Self> {
        let open = move |role: PinRole, pin: usize| {
            gpio.get_output(pin)
                .map_err(|source| LcdError::Bind { role, pin, source })
        };

        let rs = open(PinRole::Rs, mapping.rs)?;
        let rw = open(PinRole::Rw, mapping.rw)?;
        let enable = open(PinRole::Enable, mapping.enable)?;
        let data = mapping
            .data
            .iter()
            .enumerate()
            .map(|(n, &pin)| open(PinRole::Data(n as u8), pin))
            .collect::<LcdResult<Vec<_>>>()?;

        Ok(HD44780Pins {
            rs,
            rw,
            enable,
            data,
        })
    }
}

/// HD44780 display controller on an 8-bit parallel bus made of individual GPIO pins.
///
/// Created unconfigured by [Self::new]; every bus operation is a silent no-op until [Self::init]
/// succeeds. Each instruction is latched with an Enable strobe of low, high, low, with the line
/// held for the hold time (1 ms by default) after every edge. Two latches are at least two hold
/// times apart, which covers every command's execution time as long as the hold time is 20 us or
/// more. Clear display and return home need 1.52 ms; when two hold times fall short of that, the
/// driver waits out the rest after latching them. The busy flag is never polled.
///
/// Configuration changes (display, cursor, blink, lines, font) are sent to the chip as soon as
/// they're made.
#[derive(Debug)]
pub struct GpioHD44780Driver<'a, D: Delay = ThreadDelay> {
    gpio: &'a dyn GpioDriver,
    delay: D,
    hold_time: Duration,
    pins: Option<HD44780Pins<'a>>,
    config: DisplayConfig,
}

impl<'a> GpioHD44780Driver<'a> {
    /// Creates an unconfigured driver that will open its pins from `gpio`.
    pub fn new(gpio: &'a dyn GpioDriver) -> Self {
        GpioHD44780Driver {
            gpio,
            delay: ThreadDelay,
            hold_time: DEFAULT_HOLD_TIME,
            pins: None,
            config: DisplayConfig::default(),
        }
    }
}

impl<'a, D: Delay> GpioHD44780Driver<'a, D> {
    /// Replaces the delay used to pace the Enable strobe.
    pub fn with_delay<E: Delay>(self, delay: E) -> GpioHD44780Driver<'a, E> {
        GpioHD44780Driver {
            gpio: self.gpio,
            delay,
            hold_time: self.hold_time,
            pins: self.pins,
            config: self.config,
        }
    }

    /// Sets how long each Enable level is held.
    ///
    /// Below 20 us the gap between two latches no longer covers the 37 us most commands take
    /// to execute, and the chip may drop instructions.
    pub fn with_hold_time(mut self, hold_time: Duration) -> Self {
        self.hold_time = hold_time;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.pins.is_some()
    }

    /// Binds the bus lines to GPIO pins and brings the display up.
    ///
    /// Bring-up is clear display, function set, display control, entry mode (cursor moving
    /// right, no shift) and cursor to (0, 0), in that order. The chip ignores entry mode and
    /// display control until it has seen a function set.
    ///
    /// # Errors
    /// - [LcdError::Bind] if any pin can't be opened as an output. Pins opened so far are
    ///   released and the driver stays unconfigured.
    /// - [LcdError::AlreadyConfigured] if the driver was already initialized.
    pub fn init(&mut self, mapping: HD44780PinMapping) -> LcdResult<()> {
        if self.pins.is_some() {
            return Err(LcdError::AlreadyConfigured);
        }

        debug!("Binding HD44780 pins: {:?}", mapping);
        let mut pins = HD44780Pins::bind(self.gpio, &mapping)?;
        pins.enable.write(false)?;
        self.pins = Some(pins);

        debug!("Bringing up display with {:?}", self.config);
        self.clear_display()?;
        self.apply_function_set()?;
        self.apply_display_control()?;
        self.set_entry_mode(CursorDirection::Right, false)?;
        self.set_cursor_position(0, 0)?;
        Ok(())
    }

    /// Sends raw line levels in bus order (RS, R/W, DB7..DB0).
    ///
    /// Anything other than exactly 10 bits is ignored without touching the bus.
    pub fn send_bits(&mut self, bits: &BitSlice<u8, Msb0>) -> LcdResult<()> {
        match Instruction::from_bits(bits) {
            Some(instruction) => self.send_instruction(instruction),
            None => Ok(()),
        }
    }

    /// Moves the cursor to the given position.
    ///
    /// Out-of-range positions are clamped: in single-line mode the row is always 0, otherwise
    /// it's at most 1, and the column is at most 40.
    pub fn set_cursor_position(&mut self, row: usize, column: usize) -> LcdResult<()> {
        let row = match self.config.lines {
            LineCount::One => 0,
            LineCount::Two => row.min(MAX_ROW),
        };
        let column = column.min(MAX_COLUMN);
        let address = DDRAM_LINE_STRIDE * row + column;
        self.set_ddram_address(address as u8)
    }

    /// Writes text, then moves the cursor to the start of the second row.
    pub fn write_line(&mut self, text: &str) -> LcdResult<()> {
        self.write(text)?;
        self.set_cursor_position(1, 0)
    }

    /// Moves the cursor one position without changing DDRAM.
    pub fn shift_cursor(&mut self, direction: CursorDirection) -> LcdResult<()> {
        self.cursor_shift(false, direction)
    }

    /// Shifts the whole display one position. The cursor follows the shift.
    pub fn shift_display(&mut self, direction: CursorDirection) -> LcdResult<()> {
        self.cursor_shift(true, direction)
    }

    /// Stores a custom 5x8 glyph in one of the 8 CGRAM slots, to be shown by writing its
    /// character code (0-7).
    ///
    /// Each byte of `pattern` is one row, top first, using the low 5 bits. Afterwards the address
    /// counter points into CGRAM, so set the cursor position before writing text again.
    pub fn create_char(&mut self, location: u8, pattern: [u8; 8]) -> LcdResult<()> {
        self.set_cgram_address((location & 0b111) << 3)?;
        for row in pattern {
            self.send_data(row & 0b11111)?;
        }
        Ok(())
    }

    pub fn turn_display_on(&mut self) -> LcdResult<()> {
        self.config.display_on = true;
        self.apply_display_control()
    }

    pub fn turn_display_off(&mut self) -> LcdResult<()> {
        self.config.display_on = false;
        self.apply_display_control()
    }

    pub fn turn_cursor_on(&mut self) -> LcdResult<()> {
        self.config.cursor_on = true;
        self.apply_display_control()
    }

    pub fn turn_cursor_off(&mut self) -> LcdResult<()> {
        self.config.cursor_on = false;
        self.apply_display_control()
    }

    pub fn start_cursor_blinking(&mut self) -> LcdResult<()> {
        self.config.cursor_blink = true;
        self.apply_display_control()
    }

    pub fn stop_cursor_blinking(&mut self) -> LcdResult<()> {
        self.config.cursor_blink = false;
        self.apply_display_control()
    }

    pub fn switch_to_8bit_mode(&mut self) -> LcdResult<()> {
        self.config.bit_width = BitWidth::Eight;
        self.apply_function_set()
    }

    /// Fails on a configured driver, since only the 8-bit bus is implemented. Like every other
    /// operation it's a no-op before [Self::init]. The configuration is never changed.
    pub fn switch_to_4bit_mode(&mut self) -> LcdResult<()> {
        if !self.is_configured() {
            return Ok(());
        }
        Err(LcdError::Unsupported4BitMode)
    }

    pub fn switch_to_double_lines(&mut self) -> LcdResult<()> {
        self.config.lines = LineCount::Two;
        self.apply_function_set()
    }

    pub fn switch_to_single_lines(&mut self) -> LcdResult<()> {
        self.config.lines = LineCount::One;
        self.apply_function_set()
    }

    pub fn switch_to_5x8_font(&mut self) -> LcdResult<()> {
        self.config.font = Font::Dots5x8;
        self.apply_function_set()
    }

    pub fn switch_to_5x10_font(&mut self) -> LcdResult<()> {
        self.config.font = Font::Dots5x10;
        self.apply_function_set()
    }

    fn apply_function_set(&mut self) -> LcdResult<()> {
        self.send_instruction(self.config.function_set())
    }

    fn apply_display_control(&mut self) -> LcdResult<()> {
        self.send_instruction(self.config.display_control())
    }

    fn pulse_e(enable: &mut (dyn GpioPin + '_), delay: &mut D, hold_time: Duration) -> GpioResult<()> {
        enable.write(false)?;
        delay.delay(hold_time);
        enable.write(true)?;
        delay.delay(hold_time);
        enable.write(false)?;
        delay.delay(hold_time);
        Ok(())
    }
}

impl<D: Delay> HD44780Driver for GpioHD44780Driver<'_, D> {
    fn send_instruction(&mut self, instruction: Instruction) -> LcdResult<()> {
        let Some(pins) = self.pins.as_mut() else {
            return Ok(());
        };

        trace!("Sending instruction: {}", instruction);

        // Levels only need to be stable by the Enable edges, so the order here doesn't matter
        let [rs, rw, data @ ..] = instruction.bits();
        pins.rs.write(rs)?;
        pins.rw.write(rw)?;
        for (pin, level) in pins.data.iter_mut().rev().zip(data) {
            pin.write(level)?;
        }

        Self::pulse_e(pins.enable.as_mut(), &mut self.delay, self.hold_time)?;

        if instruction == Instruction::clear_display() || instruction == Instruction::return_home() {
            let remaining = SLOW_COMMAND_TIME.saturating_sub(2 * self.hold_time);
            if !remaining.is_zero() {
                self.delay.delay(remaining);
            }
        }
        Ok(())
    }
}

impl<D: Delay> std::fmt::Write for GpioHD44780Driver<'_, D> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        HD44780Driver::write(self, s).map_err(|_| std::fmt::Error)
    }
}
