use charlcd_gpio::lcd::hd44780::driver::{DEFAULT_HOLD_TIME, Font, HD44780PinMapping, LineCount};
use std::env::var;
use std::str::FromStr;
use std::time::Duration;

/// Which GPIO driver talks to the pins.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Backend {
    /// Linux GPIO character device.
    #[default]
    Gpiod,
    /// Raspberry Pi GPIO registers through `/dev/gpiomem`.
    Raw,
    /// No hardware, the bus activity is only logged.
    Mock,
}

impl FromStr for Backend {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpiod" => Ok(Backend::Gpiod),
            "raw" => Ok(Backend::Raw),
            "mock" => Ok(Backend::Mock),
            other => Err(eyre::eyre!("Unknown backend {:?}", other)),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub backend: Backend,
    pub gpiochip: String,
    pub pins: HD44780PinMapping,
    pub lines: LineCount,
    pub font: Font,
    pub hold_time: Duration,
}

impl Config {
    /// Reads the configuration from `CHARLCD_*` environment variables.
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| eyre::eyre!("Missing environment variable {}", key))
        };

        let backend = match lookup("CHARLCD_BACKEND") {
            Some(backend) => backend.parse()?,
            None => Backend::default(),
        };
        let gpiochip = lookup("CHARLCD_GPIOCHIP").unwrap_or_else(|| "/dev/gpiochip0".to_string());

        let pins = HD44780PinMapping {
            rs: required("CHARLCD_PIN_RS")?.trim().parse()?,
            rw: required("CHARLCD_PIN_RW")?.trim().parse()?,
            enable: required("CHARLCD_PIN_E")?.trim().parse()?,
            data: parse_pin_bus(&required("CHARLCD_PINS_DATA")?)?,
        };

        let lines = match lookup("CHARLCD_LINES") {
            Some(lines) => parse_lines(&lines)?,
            None => LineCount::Two,
        };
        let font = match lookup("CHARLCD_FONT") {
            Some(font) => parse_font(&font)?,
            None => Font::Dots5x8,
        };
        let hold_time = match lookup("CHARLCD_HOLD_US") {
            Some(micros) => Duration::from_micros(micros.trim().parse()?),
            None => DEFAULT_HOLD_TIME,
        };

        Ok(Config {
            backend,
            gpiochip,
            pins,
            lines,
            font,
            hold_time,
        })
    }
}

pub fn parse_pin_bus<const N: usize>(pin_str: &str) -> eyre::Result<[usize; N]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| eyre::eyre!("Invalid number of data pins, expected {}", N))
}

fn parse_lines(s: &str) -> eyre::Result<LineCount> {
    match s.trim() {
        "1" => Ok(LineCount::One),
        "2" => Ok(LineCount::Two),
        other => Err(eyre::eyre!("Unsupported line count {:?}, use 1 or 2", other)),
    }
}

fn parse_font(s: &str) -> eyre::Result<Font> {
    match s.trim().to_ascii_lowercase().as_str() {
        "5x8" => Ok(Font::Dots5x8),
        "5x10" => Ok(Font::Dots5x10),
        other => Err(eyre::eyre!("Unsupported font {:?}, use 5x8 or 5x10", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const PINS: [(&str, &str); 4] = [
        ("CHARLCD_PIN_RS", "7"),
        ("CHARLCD_PIN_RW", "8"),
        ("CHARLCD_PIN_E", "25"),
        ("CHARLCD_PINS_DATA", "24, 23,18;15 14,4,3,2"),
    ];

    #[test]
    fn defaults_with_only_pins() {
        let config = Config::from_lookup(lookup(&PINS)).unwrap();
        assert_eq!(config.backend, Backend::Gpiod);
        assert_eq!(config.gpiochip, "/dev/gpiochip0");
        assert_eq!(
            config.pins,
            HD44780PinMapping {
                rs: 7,
                rw: 8,
                enable: 25,
                data: [24, 23, 18, 15, 14, 4, 3, 2],
            }
        );
        assert_eq!(config.lines, LineCount::Two);
        assert_eq!(config.font, Font::Dots5x8);
        assert_eq!(config.hold_time, DEFAULT_HOLD_TIME);
    }

    #[test]
    fn every_setting_is_read() {
        let mut pairs = PINS.to_vec();
        pairs.extend([
            ("CHARLCD_BACKEND", "Mock"),
            ("CHARLCD_GPIOCHIP", "/dev/gpiochip4"),
            ("CHARLCD_LINES", "1"),
            ("CHARLCD_FONT", "5X10"),
            ("CHARLCD_HOLD_US", "50"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.backend, Backend::Mock);
        assert_eq!(config.gpiochip, "/dev/gpiochip4");
        assert_eq!(config.lines, LineCount::One);
        assert_eq!(config.font, Font::Dots5x10);
        assert_eq!(config.hold_time, Duration::from_micros(50));
    }

    #[test]
    fn missing_pin_is_an_error() {
        let err = Config::from_lookup(lookup(&PINS[1..])).unwrap_err();
        assert!(err.to_string().contains("CHARLCD_PIN_RS"));
    }

    #[test]
    fn pin_bus_needs_exact_count() {
        assert_eq!(parse_pin_bus::<4>("1,2,3,4").unwrap(), [1, 2, 3, 4]);
        assert!(parse_pin_bus::<8>("1,2,3,4").is_err());
        assert!(parse_pin_bus::<2>("1,x").is_err());
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!("spi".parse::<Backend>().is_err());
        assert!(parse_lines("4").is_err());
        assert!(parse_font("8x8").is_err());
    }
}
