//! HD44780 character LCD module.
//!
//! [instruction] turns every HD44780 command into its 10-bit bus word, without any I/O.
//! [driver] sends those words over an 8-bit parallel bus of GPIO pins, and keeps track of the
//! display settings. 4-bit transfer mode is not supported.
//!
//! ```no_run
//! use charlcd_gpio::gpiod::GpiodDriver;
//! use charlcd_gpio::lcd::hd44780::driver::{GpioHD44780Driver, HD44780Driver, HD44780PinMapping};
//!
//! let gpio = GpiodDriver::open("/dev/gpiochip0")?;
//! let mut lcd = GpioHD44780Driver::new(&gpio);
//! lcd.init(HD44780PinMapping {
//!     rs: 7,
//!     rw: 8,
//!     enable: 25,
//!     data: [24, 23, 18, 15, 14, 4, 3, 2],
//! })?;
//! lcd.write_line("Hello")?;
//! lcd.write("world")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod driver;
pub mod instruction;
