pub mod gpio;
pub mod stepper;

pub use gpio::{GpioCapability, GpioChip, OutputLine, PinEvent, PinLog, RecordingChip};
pub use stepper::{Stepper, StepperPins};
