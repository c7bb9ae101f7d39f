use std::thread;
use std::time::Duration;

use crate::error::Error;
use crate::motor::gpio::{GpioChip, OutputLine};

/// BCM pin numbers wiring one STEP/DIR driver (A4988, DRV8825, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepperPins {
    pub step: u8,
    pub direction: u8,
    pub enable: Option<u8>,
}

impl StepperPins {
    pub fn new(step: u8, direction: u8, enable: Option<u8>) -> Self {
        Self {
            step,
            direction,
            enable,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = u8> {
        [Some(self.step), Some(self.direction), self.enable]
            .into_iter()
            .flatten()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.step == self.direction || Some(self.step) == self.enable {
            return Err(Error::InvalidConfig(format!(
                "step pin {} is shared with another line",
                self.step
            )));
        }
        if Some(self.direction) == self.enable {
            return Err(Error::InvalidConfig(format!(
                "direction pin {} is shared with the enable line",
                self.direction
            )));
        }

        Ok(())
    }
}

/// One stepper axis. Open loop: there is no position feedback.
pub struct Stepper {
    pins: StepperPins,
    step_delay: Duration,
    step_line: Box<dyn OutputLine>,
    direction_line: Box<dyn OutputLine>,
    enable_line: Option<Box<dyn OutputLine>>,
    shut_down: bool,
}

impl Stepper {
    /// Claims the axis lines and powers the driver.
    ///
    /// Fails with [`Error::HardwareUnavailable`] when a line cannot be claimed.
    pub fn new(
        chip: &mut dyn GpioChip,
        pins: StepperPins,
        step_delay: Duration,
    ) -> crate::Result<Self> {
        pins.validate()?;

        let step_line = chip.output(pins.step)?;
        let direction_line = chip.output(pins.direction)?;
        let enable_line = match pins.enable {
            Some(pin) => {
                let mut line = chip.output(pin)?;
                // Enable is active-low on the common driver boards.
                line.set_low();
                Some(line)
            }
            None => None,
        };

        Ok(Self {
            pins,
            step_delay,
            step_line,
            direction_line,
            enable_line,
            shut_down: false,
        })
    }

    pub fn pins(&self) -> StepperPins {
        self.pins
    }

    /// Moves `|steps|` increments; positive drives DIR high.
    ///
    /// Blocks for `|steps| * step_delay`.
    pub fn step(&mut self, steps: i32) {
        if steps > 0 {
            self.direction_line.set_high();
        } else {
            self.direction_line.set_low();
        }

        for _ in 0..steps.unsigned_abs() {
            self.step_line.set_high();
            self.step_line.set_low();
            thread::sleep(self.step_delay);
        }
    }

    /// De-powers the coils. Only the first call drives the enable line.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Some(line) = &mut self.enable_line {
            line.set_high();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}
