mod config;

use crate::config::{Backend, Config};
use charlcd_gpio::GpioDriver;
use charlcd_gpio::gpiod::GpiodDriver;
use charlcd_gpio::lcd::hd44780::driver::{Font, GpioHD44780Driver, HD44780Driver, LineCount};
use charlcd_gpio::mock::MockGpioDriver;
use charlcd_gpio::raw::RawGpioDriver;
use dotenv::dotenv;
use log::{debug, info};
use std::env::args;
use sysinfo::System;

const UNKNOWN_STR: &str = "???";

/// Enough pins for any header the other backends drive.
const MOCK_PIN_COUNT: usize = 64;

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    let config = Config::from_env()?;

    info!(
        "LCD @ RS: {}, RW: {}, E: {}, Data: {:?}",
        config.pins.rs, config.pins.rw, config.pins.enable, config.pins.data
    );

    let mut text: Vec<String> = args().skip(1).collect();
    if text.is_empty() {
        text = system_info();
    }

    debug!("Initializing {:?} GPIO driver...", config.backend);
    match config.backend {
        Backend::Gpiod => {
            let gpio = GpiodDriver::open(&config.gpiochip)?;
            show(&gpio, &config, &text)
        }
        Backend::Raw => {
            let gpio = RawGpioDriver::new_gpiomem()?;
            show(&gpio, &config, &text)
        }
        Backend::Mock => {
            let gpio = MockGpioDriver::new(MOCK_PIN_COUNT);
            show(&gpio, &config, &text)?;
            info!("Dry run finished, {} pin writes recorded.", gpio.writes().len());
            Ok(())
        }
    }
}

/// Host name on the first line, OS version on the second.
fn system_info() -> Vec<String> {
    vec![
        System::host_name().unwrap_or_else(|| UNKNOWN_STR.to_string()),
        System::long_os_version().unwrap_or_else(|| UNKNOWN_STR.to_string()),
    ]
}

fn show(gpio: &dyn GpioDriver, config: &Config, text: &[String]) -> eyre::Result<()> {
    debug!("{:?} initialized.", gpio);

    debug!("Initializing LCD driver...");
    let mut lcd = GpioHD44780Driver::new(gpio).with_hold_time(config.hold_time);

    // Set before init, so bring-up already sends them
    if config.lines == LineCount::One {
        lcd.switch_to_single_lines()?;
    }
    if config.font == Font::Dots5x10 {
        lcd.switch_to_5x10_font()?;
    }
    lcd.init(config.pins)?;
    lcd.turn_cursor_off()?;

    debug!("{:?} initialized.", lcd);

    match text {
        [] => {}
        [line] => lcd.write(line)?,
        [first, rest @ ..] => {
            lcd.write_line(first)?;
            lcd.write(&rest.join(" "))?;
        }
    }

    info!("Text written: {:?}", text);
    Ok(())
}
