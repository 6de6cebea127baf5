pub mod delay;
pub mod gpiod;
pub mod lcd;
pub mod mock;
pub mod raw;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("pin is not configured as an output")]
    NotAnOutput,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO pins available.
    fn count(&self) -> GpioResult<usize>;

    /// Opens the GPIO pin at the given index.
    ///
    /// The pin is held until the returned handle is dropped.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the index is out of range.
    /// - `GpioError::AlreadyInUse` if another handle holds the pin.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>>;

    /// Opens the GPIO pin at the given index and switches it to output.
    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        let mut pin = self.get_pin(index)?;
        pin.set_direction(GpioDirection::Output)?;
        Ok(pin)
    }
}

/// Direction of a GPIO pin.
///
/// Freshly opened pins are inputs, so they don't drive anything until explicitly asked to.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioDirection {
    #[default] Input,
    Output,
}

pub trait GpioPin: Debug {
    /// Gets the index this pin was opened with.
    fn index(&self) -> usize;

    /// Gets the current direction of the pin.
    fn direction(&self) -> GpioDirection;

    /// Sets the direction of the pin.
    fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()>;

    /// Writes the logic level of the pin.
    ///
    /// # Errors
    /// - `GpioError::NotAnOutput` if the pin is not set to output.
    fn write(&mut self, value: bool) -> GpioResult<()>;
}
