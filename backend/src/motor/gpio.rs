use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Error;

/// A single digital output line.
pub trait OutputLine {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

/// Process-wide GPIO access. Owned by whoever drives the motors and
/// released exactly once when they are done with it.
pub trait GpioChip {
    /// Claims `pin` (BCM numbering) as an output.
    fn output(&mut self, pin: u8) -> crate::Result<Box<dyn OutputLine>>;

    /// Gives the GPIO subsystem back. Lines claimed earlier must not be
    /// driven afterwards.
    fn release(&mut self);
}

/// GPIO access as resolved once at startup.
pub enum GpioCapability {
    Available(Box<dyn GpioChip>),
    Unavailable(String),
}

impl GpioCapability {
    /// Probes the platform GPIO subsystem.
    #[cfg(feature = "rpi-gpio")]
    pub fn resolve() -> Self {
        match rpi::RpiGpio::new() {
            Ok(chip) => GpioCapability::Available(Box::new(chip)),
            Err(err) => GpioCapability::Unavailable(err.to_string()),
        }
    }

    #[cfg(not(feature = "rpi-gpio"))]
    pub fn resolve() -> Self {
        GpioCapability::Unavailable("built without the rpi-gpio feature".to_string())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, GpioCapability::Available(_))
    }
}

impl fmt::Debug for GpioCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpioCapability::Available(_) => f.write_str("Available"),
            GpioCapability::Unavailable(reason) => write!(f, "Unavailable({reason})"),
        }
    }
}

#[cfg(feature = "rpi-gpio")]
mod rpi {
    use rppal::gpio::{Gpio, OutputPin};

    use super::{GpioChip, OutputLine};
    use crate::error::Error;

    pub struct RpiGpio {
        gpio: Option<Gpio>,
    }

    impl RpiGpio {
        pub fn new() -> crate::Result<Self> {
            let gpio = Gpio::new().map_err(|e| Error::HardwareUnavailable(e.to_string()))?;
            Ok(Self { gpio: Some(gpio) })
        }
    }

    impl GpioChip for RpiGpio {
        fn output(&mut self, pin: u8) -> crate::Result<Box<dyn OutputLine>> {
            let gpio = self
                .gpio
                .as_ref()
                .ok_or_else(|| Error::HardwareUnavailable("gpio already released".to_string()))?;
            let line = gpio
                .get(pin)
                .map_err(|e| Error::HardwareUnavailable(format!("pin {pin}: {e}")))?
                .into_output();

            Ok(Box::new(line))
        }

        fn release(&mut self) {
            // Pins reset their mode when dropped; dropping the handle closes /dev/gpiomem.
            self.gpio = None;
        }
    }

    impl OutputLine for OutputPin {
        fn set_high(&mut self) {
            OutputPin::set_high(self)
        }

        fn set_low(&mut self) {
            OutputPin::set_low(self)
        }
    }
}

/// A line transition seen by [`RecordingChip`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinEvent {
    High(u8),
    Low(u8),
    Released,
}

/// Shared view of everything a [`RecordingChip`] was asked to do.
#[derive(Clone, Debug, Default)]
pub struct PinLog {
    events: Rc<RefCell<Vec<PinEvent>>>,
}

impl PinLog {
    pub fn events(&self) -> Vec<PinEvent> {
        self.events.borrow().clone()
    }

    /// Number of rising edges on `pin`.
    pub fn pulses(&self, pin: u8) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| **e == PinEvent::High(pin))
            .count()
    }

    /// Last level driven on `pin`, `None` if it was never driven.
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.events.borrow().iter().rev().find_map(|e| match *e {
            PinEvent::High(p) if p == pin => Some(true),
            PinEvent::Low(p) if p == pin => Some(false),
            _ => None,
        })
    }

    pub fn releases(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| **e == PinEvent::Released)
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: PinEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// Stub chip for testing. Drives nothing and records every transition.
#[derive(Debug, Default)]
pub struct RecordingChip {
    log: PinLog,
    fail_on: Option<u8>,
}

impl RecordingChip {
    pub fn new() -> (Self, PinLog) {
        let chip = Self::default();
        let log = chip.log.clone();
        (chip, log)
    }

    /// Refuses to hand out `pin`, as a board without that line would.
    pub fn failing_on(mut self, pin: u8) -> Self {
        self.fail_on = Some(pin);
        self
    }
}

impl GpioChip for RecordingChip {
    fn output(&mut self, pin: u8) -> crate::Result<Box<dyn OutputLine>> {
        if self.fail_on == Some(pin) {
            return Err(Error::HardwareUnavailable(format!("pin {pin} not present")));
        }

        Ok(Box::new(RecordedLine {
            pin,
            log: self.log.clone(),
        }))
    }

    fn release(&mut self) {
        self.log.push(PinEvent::Released);
    }
}

struct RecordedLine {
    pin: u8,
    log: PinLog,
}

impl OutputLine for RecordedLine {
    fn set_high(&mut self) {
        self.log.push(PinEvent::High(self.pin));
    }

    fn set_low(&mut self) {
        self.log.push(PinEvent::Low(self.pin));
    }
}
