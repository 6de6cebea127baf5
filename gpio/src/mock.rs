//! In-memory GPIO backend that records what is done to it.
//!
//! Every pin open, direction change, write, release and delay ends up in one ordered event log,
//! which makes the exact bus waveform of a driver observable without hardware. The log is shared
//! with the [MockDelay] handles created by [MockGpioDriver::delay], so delays interleave with pin
//! writes in the order they happened.
use crate::delay::Delay;
use crate::{GpioDirection, GpioDriver, GpioError, GpioPin, GpioResult};
use bitvec::vec::BitVec;
use log::trace;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::sync::atomic::AtomicU8;
use std::time::Duration;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MockEvent {
    /// A pin was opened.
    Open(usize),
    /// A pin changed direction.
    Direction(usize, GpioDirection),
    /// A logic level was written to a pin.
    Write(usize, bool),
    /// A pin handle was dropped.
    Release(usize),
    /// A delay was requested.
    Delay(Duration),
}

type EventLog = Rc<RefCell<Vec<MockEvent>>>;

fn record(log: &EventLog, event: MockEvent) {
    trace!("{:?}", event);
    log.borrow_mut().push(event);
}

pub struct MockGpioDriver {
    count: usize,
    used_pins: BitVec<AtomicU8>,
    unavailable_pins: BitVec<AtomicU8>,
    events: EventLog,
}

impl MockGpioDriver {
    /// Creates a mock driver with `count` pins, all of them free.
    pub fn new(count: usize) -> Self {
        Self {
            count,
            used_pins: BitVec::repeat(false, count),
            unavailable_pins: BitVec::repeat(false, count),
            events: EventLog::default(),
        }
    }

    /// Marks a pin as held elsewhere, so opening it fails with [GpioError::AlreadyInUse].
    pub fn with_unavailable_pin(mut self, index: usize) -> Self {
        if index < self.count {
            self.unavailable_pins.set(index, true);
        }
        self
    }

    /// Creates a delay that records into this driver's event log instead of sleeping.
    pub fn delay(&self) -> MockDelay {
        MockDelay {
            events: Rc::clone(&self.events),
        }
    }

    /// Gets a copy of all the events recorded so far.
    pub fn events(&self) -> Vec<MockEvent> {
        self.events.borrow().clone()
    }

    /// Forgets all the events recorded so far.
    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    /// Gets all the recorded writes as `(pin, level)` pairs.
    pub fn writes(&self) -> Vec<(usize, bool)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match *event {
                MockEvent::Write(pin, level) => Some((pin, level)),
                _ => None,
            })
            .collect()
    }

    /// Gets the last level written to the pin, if it was ever written.
    pub fn level(&self, index: usize) -> Option<bool> {
        self.events.borrow().iter().rev().find_map(|event| match *event {
            MockEvent::Write(pin, level) if pin == index => Some(level),
            _ => None,
        })
    }

    /// Checks whether a pin is currently held by a handle.
    pub fn is_in_use(&self, index: usize) -> bool {
        index < self.count && self.used_pins[index]
    }
}

impl Debug for MockGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockGpioDriver({})", self.count)
    }
}

impl GpioDriver for MockGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.count)
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        if index >= self.count {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] || self.unavailable_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set_aliased(index, true);
        record(&self.events, MockEvent::Open(index));

        Ok(Box::new(MockPin {
            driver: self,
            pin_index: index,
            direction: GpioDirection::Input,
        }))
    }
}

struct MockPin<'a> {
    driver: &'a MockGpioDriver,
    pin_index: usize,
    direction: GpioDirection,
}

impl Debug for MockPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.pin_index)
    }
}

impl GpioPin for MockPin<'_> {
    fn index(&self) -> usize {
        self.pin_index
    }

    fn direction(&self) -> GpioDirection {
        self.direction
    }

    fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()> {
        self.direction = direction;
        record(&self.driver.events, MockEvent::Direction(self.pin_index, direction));
        Ok(())
    }

    fn write(&mut self, value: bool) -> GpioResult<()> {
        if self.direction != GpioDirection::Output {
            return Err(GpioError::NotAnOutput);
        }
        record(&self.driver.events, MockEvent::Write(self.pin_index, value));
        Ok(())
    }
}

impl Drop for MockPin<'_> {
    fn drop(&mut self) {
        self.driver.used_pins.set_aliased(self.pin_index, false);
        record(&self.driver.events, MockEvent::Release(self.pin_index));
    }
}

/// Delay that records into a [MockGpioDriver]'s event log and returns immediately.
#[derive(Clone)]
pub struct MockDelay {
    events: EventLog,
}

impl Debug for MockDelay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockDelay")
    }
}

impl Delay for MockDelay {
    fn delay(&mut self, duration: Duration) {
        record(&self.events, MockEvent::Delay(duration));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_are_exclusive_until_dropped() {
        let gpio = MockGpioDriver::new(4);
        let pin = gpio.get_pin(1).unwrap();
        assert!(gpio.is_in_use(1));
        assert_eq!(gpio.get_pin(1).unwrap_err(), GpioError::AlreadyInUse);

        drop(pin);
        assert!(!gpio.is_in_use(1));
        assert!(gpio.get_pin(1).is_ok());
    }

    #[test]
    fn out_of_range_pin_is_rejected() {
        let gpio = MockGpioDriver::new(4);
        assert_eq!(gpio.get_pin(4).unwrap_err(), GpioError::InvalidArgument);
        assert!(gpio.events().is_empty());
    }

    #[test]
    fn unavailable_pin_cannot_be_opened() {
        let gpio = MockGpioDriver::new(4).with_unavailable_pin(2);
        assert_eq!(gpio.get_pin(2).unwrap_err(), GpioError::AlreadyInUse);
        assert!(gpio.get_pin(3).is_ok());
    }

    #[test]
    fn writing_an_input_fails() {
        let gpio = MockGpioDriver::new(4);
        let mut pin = gpio.get_pin(0).unwrap();
        assert_eq!(pin.write(true).unwrap_err(), GpioError::NotAnOutput);
        assert!(gpio.writes().is_empty());
    }

    #[test]
    fn writes_and_delays_share_one_log() {
        let gpio = MockGpioDriver::new(4);
        let mut delay = gpio.delay();
        let mut pin = gpio.get_output(0).unwrap();
        pin.write(true).unwrap();
        delay.delay(Duration::from_millis(1));
        pin.write(false).unwrap();

        assert_eq!(
            gpio.events(),
            vec![
                MockEvent::Open(0),
                MockEvent::Direction(0, GpioDirection::Output),
                MockEvent::Write(0, true),
                MockEvent::Delay(Duration::from_millis(1)),
                MockEvent::Write(0, false),
            ]
        );
        assert_eq!(gpio.level(0), Some(false));
        assert_eq!(gpio.level(1), None);
    }
}
