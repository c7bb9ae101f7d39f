use crate::app::App;
use crate::cli::Args;

use clap::Parser;
use eframe::egui::ViewportBuilder;
use turret_backend::cv::detector::DnnDetector;
use turret_backend::cv::vision::Overlay;
use turret_backend::cv::Camera;
use turret_backend::{GpioCapability, PanTiltController, TrackerConfig, TrackingLoop};

mod app;
mod cli;
mod error;
mod headless;

const MIN_SIZE: [f32; 2] = [650.0, 650.0];

pub(crate) type Result<T> = std::result::Result<T, crate::error::Error>;
pub(crate) type CameraLoop = TrackingLoop<Camera, DnnDetector, Overlay>;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.tracker_config()?;
    let tracking = build_tracking_loop(&config)?;

    if args.headless {
        return headless::run(tracking);
    }

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default().with_min_inner_size(MIN_SIZE),
        ..Default::default()
    };

    eframe::run_native(
        "Mini-Turret",
        options,
        Box::new(move |_cc| Box::new(App::new(tracking))),
    )?;

    Ok(())
}

fn build_tracking_loop(config: &TrackerConfig) -> Result<CameraLoop> {
    let camera = Camera::connect(&config.camera)?;
    let detector = DnnDetector::load(&config.detector)?;

    let capability = if config.turret.enabled {
        GpioCapability::resolve()
    } else {
        GpioCapability::Unavailable("gpio output not requested".to_string())
    };
    let controller = PanTiltController::new(&config.turret, capability);

    Ok(TrackingLoop::new(
        camera,
        detector,
        Overlay::default(),
        controller,
    ))
}
