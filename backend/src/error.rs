use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[cfg(feature = "camera")]
    #[error(transparent)]
    OpenCV(#[from] opencv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("hardware unavailable: {0}")]
    HardwareUnavailable(String),
    #[error("failed to read frame from camera")]
    FrameRead,
    #[error("could not open camera {0}, try a different camera id")]
    CameraUnavailable(i32),
    #[error("detection failed: {0}")]
    Detection(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
