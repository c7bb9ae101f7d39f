pub mod config;
#[cfg(feature = "camera")]
pub mod cv;
pub mod detection;
pub mod error;
pub mod fps;
pub mod motor;
pub mod pan_tilt;
pub mod tracking;

pub use config::{CameraSettings, DetectorSettings, TrackerConfig, TurretSettings};
pub use detection::{BoundingBox, Category, Detection, DetectionResult, FrameGeometry};
pub use motor::{GpioCapability, Stepper, StepperPins};
pub use pan_tilt::{ControllerMode, PanTiltCommand, PanTiltController};
pub use tracking::{Detector, Display, Frame, FrameSource, Renderer, StopReason, TrackingLoop};

pub type Result<T> = std::result::Result<T, crate::error::Error>;
