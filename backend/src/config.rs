use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::motor::StepperPins;

pub const CONFIG_ENV: &str = "TURRET_CONFIG";

const DEFAULT_CAMERA_INDEX: i32 = 0;
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_SCORE_THRESHOLD: f32 = 0.30;
const DEFAULT_MAX_RESULTS: usize = 3;
// Small on purpose, the Pi does not like large thread counts.
const DEFAULT_THREADS: i32 = 2;
const DEFAULT_INPUT_SIZE: i32 = 320;
pub const DEFAULT_GAIN: f64 = 8.0;
pub const DEFAULT_DEADZONE: f64 = 0.10;
const DEFAULT_STEP_DELAY_US: u64 = 1_000;
const DEFAULT_PAN_PINS: StepperPins = StepperPins {
    step: 17,
    direction: 27,
    enable: Some(22),
};
const DEFAULT_TILT_PINS: StepperPins = StepperPins {
    step: 23,
    direction: 24,
    enable: Some(25),
};

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TrackerConfigFile {
    camera: Option<CameraConfigFile>,
    detector: Option<DetectorConfigFile>,
    turret: Option<TurretConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CameraConfigFile {
    index: Option<i32>,
    width: Option<u32>,
    height: Option<u32>,
    mirror: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    model: Option<PathBuf>,
    labels: Option<PathBuf>,
    score_threshold: Option<f32>,
    max_results: Option<usize>,
    threads: Option<i32>,
    input_size: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TurretConfigFile {
    enabled: Option<bool>,
    gain: Option<f64>,
    deadzone: Option<f64>,
    pan: Option<AxisConfigFile>,
    tilt: Option<AxisConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AxisConfigFile {
    step: Option<u8>,
    direction: Option<u8>,
    enable: Option<u8>,
    step_delay_us: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    pub camera: CameraSettings,
    pub detector: DetectorSettings,
    pub turret: TurretSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub index: i32,
    pub width: u32,
    pub height: u32,
    /// Flip frames horizontally before detection.
    pub mirror: bool,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub model: Option<PathBuf>,
    pub labels: Option<PathBuf>,
    pub score_threshold: f32,
    pub max_results: usize,
    pub threads: i32,
    /// Square model input edge in pixels.
    pub input_size: i32,
}

#[derive(Debug, Clone)]
pub struct TurretSettings {
    /// Drive real motors. Falls back to logging when GPIO is missing.
    pub enabled: bool,
    pub gain: f64,
    pub deadzone: f64,
    pub pan: AxisSettings,
    pub tilt: AxisSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct AxisSettings {
    pub pins: StepperPins,
    pub step_delay: Duration,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            index: DEFAULT_CAMERA_INDEX,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            mirror: false,
        }
    }
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            model: None,
            labels: None,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            threads: DEFAULT_THREADS,
            input_size: DEFAULT_INPUT_SIZE,
        }
    }
}

impl Default for TurretSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            gain: DEFAULT_GAIN,
            deadzone: DEFAULT_DEADZONE,
            pan: AxisSettings::with_pins(DEFAULT_PAN_PINS),
            tilt: AxisSettings::with_pins(DEFAULT_TILT_PINS),
        }
    }
}

impl AxisSettings {
    pub fn with_pins(pins: StepperPins) -> Self {
        Self {
            pins,
            step_delay: Duration::from_micros(DEFAULT_STEP_DELAY_US),
        }
    }

    /// An axis that names its own step or direction pin is rewired: a
    /// missing `enable` then means the driver has no enable line.
    fn from_file(file: Option<AxisConfigFile>, defaults: StepperPins) -> Self {
        let file = file.unwrap_or_default();
        let rewired = file.step.is_some() || file.direction.is_some();
        let enable = if rewired {
            file.enable
        } else {
            file.enable.or(defaults.enable)
        };

        Self {
            pins: StepperPins {
                step: file.step.unwrap_or(defaults.step),
                direction: file.direction.unwrap_or(defaults.direction),
                enable,
            },
            step_delay: Duration::from_micros(
                file.step_delay_us.unwrap_or(DEFAULT_STEP_DELAY_US),
            ),
        }
    }
}

impl TrackerConfig {
    /// Reads `path`, or the file named by `TURRET_CONFIG`, or falls back to defaults.
    ///
    /// The result is not validated; apply overrides first, then call [`TrackerConfig::validate`].
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => {
                log::debug!("loading config from {}", path.display());
                let raw = std::fs::read_to_string(&path)?;
                Self::from_toml_str(&raw)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(raw: &str) -> crate::Result<Self> {
        let file: TrackerConfigFile = toml::from_str(raw)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: TrackerConfigFile) -> Self {
        let camera = file.camera.unwrap_or_default();
        let detector = file.detector.unwrap_or_default();
        let turret = file.turret.unwrap_or_default();

        Self {
            camera: CameraSettings {
                index: camera.index.unwrap_or(DEFAULT_CAMERA_INDEX),
                width: camera.width.unwrap_or(DEFAULT_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_HEIGHT),
                mirror: camera.mirror.unwrap_or(false),
            },
            detector: DetectorSettings {
                model: detector.model,
                labels: detector.labels,
                score_threshold: detector.score_threshold.unwrap_or(DEFAULT_SCORE_THRESHOLD),
                max_results: detector.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
                threads: detector.threads.unwrap_or(DEFAULT_THREADS),
                input_size: detector.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            },
            turret: TurretSettings {
                enabled: turret.enabled.unwrap_or(false),
                gain: turret.gain.unwrap_or(DEFAULT_GAIN),
                deadzone: turret.deadzone.unwrap_or(DEFAULT_DEADZONE),
                pan: AxisSettings::from_file(turret.pan, DEFAULT_PAN_PINS),
                tilt: AxisSettings::from_file(turret.tilt, DEFAULT_TILT_PINS),
            },
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(invalid("frame width and height must be greater than zero"));
        }

        let detector = &self.detector;
        if detector.model.is_none() {
            return Err(invalid("a detection model path is required"));
        }
        if !(0.0..=1.0).contains(&detector.score_threshold) {
            return Err(invalid("score threshold must be within 0..=1"));
        }
        if detector.max_results == 0 {
            return Err(invalid("max results must be at least 1"));
        }
        if detector.threads < 1 || detector.input_size < 1 {
            return Err(invalid("detector threads and input size must be positive"));
        }

        self.turret.validate()
    }
}

impl TurretSettings {
    pub fn validate(&self) -> crate::Result<()> {
        if !self.gain.is_finite() {
            return Err(invalid("gain must be a finite number"));
        }
        if !self.deadzone.is_finite() || self.deadzone < 0.0 {
            return Err(invalid("deadzone must be a finite number >= 0"));
        }

        self.pan.pins.validate()?;
        self.tilt.pins.validate()?;
        if let Some(pin) = self.pan.pins.all().find(|p| self.tilt.pins.all().any(|t| t == *p)) {
            return Err(Error::InvalidConfig(format!(
                "pin {pin} is wired to both pan and tilt"
            )));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> Error {
    Error::InvalidConfig(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = TrackerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.camera.height, 480);
        assert_eq!(cfg.detector.max_results, 3);
        assert!(!cfg.turret.enabled);
        assert_eq!(cfg.turret.gain, 8.0);
        assert_eq!(cfg.turret.deadzone, 0.10);
        assert_eq!(cfg.turret.pan.pins, StepperPins::new(17, 27, Some(22)));
        assert_eq!(cfg.turret.tilt.pins, StepperPins::new(23, 24, Some(25)));
        assert_eq!(cfg.turret.pan.step_delay, Duration::from_millis(1));
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg = TrackerConfig::from_toml_str(
            r#"
            [camera]
            index = 2
            mirror = true

            [detector]
            model = "models/efficientdet_lite0.tflite"
            score_threshold = 0.5

            [turret]
            enabled = true
            gain = 4.0

            [turret.tilt]
            step = 5
            direction = 6
            step_delay_us = 500
            "#,
        )
        .unwrap();

        assert_eq!(cfg.camera.index, 2);
        assert!(cfg.camera.mirror);
        assert_eq!(cfg.detector.score_threshold, 0.5);
        assert!(cfg.turret.enabled);
        assert_eq!(cfg.turret.gain, 4.0);
        assert_eq!(cfg.turret.tilt.pins, StepperPins::new(5, 6, None));
        assert_eq!(cfg.turret.tilt.step_delay, Duration::from_micros(500));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rewired_axis_without_enable_has_no_enable_line() {
        let cfg = TrackerConfig::from_toml_str("[turret.pan]\nstep = 5\ndirection = 6\n").unwrap();
        assert_eq!(cfg.turret.pan.pins, StepperPins::new(5, 6, None));
        assert_eq!(cfg.turret.pan.pins.all().collect::<Vec<_>>(), vec![5, 6]);
        assert_eq!(cfg.turret.tilt.pins, StepperPins::new(23, 24, Some(25)));
    }

    #[test]
    fn axis_keeps_default_enable_unless_rewired() {
        let cfg = TrackerConfig::from_toml_str(
            r#"
            [turret.pan]
            step_delay_us = 200

            [turret.tilt]
            step = 5
            direction = 6
            enable = 13
            "#,
        )
        .unwrap();
        assert_eq!(cfg.turret.pan.pins, StepperPins::new(17, 27, Some(22)));
        assert_eq!(cfg.turret.tilt.pins, StepperPins::new(5, 6, Some(13)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(TrackerConfig::from_toml_str("[camera]\nfps = 30\n").is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[camera]\nwidth = 320\nheight = 240").unwrap();

        let cfg = TrackerConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.camera.width, 320);
        assert_eq!(cfg.camera.height, 240);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = TrackerConfig::default();
        assert!(cfg.validate().is_err(), "model is required");

        cfg.detector.model = Some(PathBuf::from("model.tflite"));
        assert!(cfg.validate().is_ok());

        cfg.detector.score_threshold = 1.5;
        assert!(cfg.validate().is_err());
        cfg.detector.score_threshold = 0.3;

        cfg.turret.deadzone = -0.1;
        assert!(cfg.validate().is_err());
        cfg.turret.deadzone = 0.1;

        cfg.turret.tilt.pins = StepperPins::new(17, 24, None);
        assert!(cfg.validate().is_err(), "pin shared across axes");
    }
}
