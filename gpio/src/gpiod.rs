//! GpiodDriver implementation for managing GPIO pins using the gpiod library.
//!
//! Works on any Linux board exposing a GPIO character device (`/dev/gpiochipN`).
use crate::{GpioDirection, GpioDriver, GpioError, GpioPin, GpioResult};
use bitvec::vec::BitVec;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO pins.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: BitVec<AtomicU8>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        let bits = BitVec::repeat(false, n);
        Self {
            chip,
            used_pins: bits,
        }
    }

    /// Opens the GPIO chip at the given path, e.g. `/dev/gpiochip0`.
    pub fn open(path: &str) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path)?))
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        let line = self.request_input(index)?;
        self.used_pins.set_aliased(index, true);

        Ok(Box::new(GpiodPin {
            driver: self,
            pin_index: index,
            direction: GpioDirection::Input,
            line: Some(GpiodLine::Input(line)),
        }))
    }
}

impl GpiodDriver {
    fn request_input(&self, index: usize) -> GpioResult<gpiod::Lines<gpiod::Input>> {
        let line = self.chip.request_lines(
            gpiod::Options::input([index as u32]).consumer(env!("CARGO_PKG_NAME")),
        )?;
        Ok(line)
    }

    fn request_output(&self, index: usize) -> GpioResult<gpiod::Lines<gpiod::Output>> {
        let line = self.chip.request_lines(
            gpiod::Options::output([index as u32]).consumer(env!("CARGO_PKG_NAME")),
        )?;
        Ok(line)
    }
}

/// The line request held for a pin. The kernel refuses a second request on the same line,
/// so changing direction drops the old request before making a new one.
enum GpiodLine {
    // Only held so the request stays alive, dropping it releases the line
    #[allow(dead_code)]
    Input(gpiod::Lines<gpiod::Input>),
    Output(gpiod::Lines<gpiod::Output>),
}

struct GpiodPin<'a> {
    driver: &'a GpiodDriver,
    pin_index: usize,
    direction: GpioDirection,
    line: Option<GpiodLine>,
}

impl Debug for GpiodPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][{:?}]", self.driver, self.pin_index, self.direction)
    }
}

impl GpioPin for GpiodPin<'_> {
    fn index(&self) -> usize {
        self.pin_index
    }

    fn direction(&self) -> GpioDirection {
        self.direction
    }

    fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()> {
        if self.direction == direction && self.line.is_some() {
            return Ok(());
        }

        self.line = None;
        self.line = Some(match direction {
            GpioDirection::Input => GpiodLine::Input(self.driver.request_input(self.pin_index)?),
            GpioDirection::Output => GpiodLine::Output(self.driver.request_output(self.pin_index)?),
        });
        self.direction = direction;
        Ok(())
    }

    fn write(&mut self, value: bool) -> GpioResult<()> {
        match &self.line {
            Some(GpiodLine::Output(line)) => {
                line.set_values([value])?;
                Ok(())
            }
            _ => Err(GpioError::NotAnOutput),
        }
    }
}

impl Drop for GpiodPin<'_> {
    fn drop(&mut self) {
        self.driver.used_pins.set_aliased(self.pin_index, false);
    }
}
