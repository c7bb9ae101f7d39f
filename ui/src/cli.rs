use clap::Parser;
use std::path::PathBuf;
use turret_backend::TrackerConfig;

/// Camera object detection driving a pan/tilt stepper turret.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Args {
    /// Detection model file (.tflite, .onnx, ...).
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Class labels, one per line.
    #[arg(long)]
    pub labels: Option<PathBuf>,
    /// TOML config file. Flags given here win over the file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub camera_id: Option<i32>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long)]
    pub score_threshold: Option<f32>,
    #[arg(long)]
    pub max_results: Option<usize>,
    /// Drive the turret steppers through Raspberry Pi GPIO.
    #[arg(long)]
    pub use_gpio: bool,
    /// Flip the camera horizontally.
    #[arg(long)]
    pub mirror: bool,
    /// Run without a window; stop with Ctrl-C.
    #[arg(long)]
    pub headless: bool,
}

impl Args {
    pub(crate) fn tracker_config(&self) -> crate::Result<TrackerConfig> {
        let mut config = TrackerConfig::load(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate()?;

        Ok(config)
    }

    fn apply(&self, config: &mut TrackerConfig) {
        if let Some(model) = &self.model {
            config.detector.model = Some(model.clone());
        }
        if let Some(labels) = &self.labels {
            config.detector.labels = Some(labels.clone());
        }
        if let Some(index) = self.camera_id {
            config.camera.index = index;
        }
        if let Some(width) = self.width {
            config.camera.width = width;
        }
        if let Some(height) = self.height {
            config.camera.height = height;
        }
        if let Some(threshold) = self.score_threshold {
            config.detector.score_threshold = threshold;
        }
        if let Some(max_results) = self.max_results {
            config.detector.max_results = max_results;
        }
        config.turret.enabled |= self.use_gpio;
        config.camera.mirror |= self.mirror;
    }
}
