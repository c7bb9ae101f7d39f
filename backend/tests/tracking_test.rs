use std::time::{Duration, Instant};

use turret_backend::config::TurretSettings;
use turret_backend::error::Error;
use turret_backend::fps::FpsMeter;
use turret_backend::motor::{PinEvent, PinLog, RecordingChip};
use turret_backend::{
    BoundingBox, Category, ControllerMode, Detection, DetectionResult, Detector, Display, Frame,
    FrameGeometry, FrameSource, GpioCapability, PanTiltController, Renderer, StopReason,
    TrackingLoop,
};

struct Still;

impl Frame for Still {
    fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(640, 480)
    }
}

/// Serves a fixed number of frames, then fails like an unplugged camera.
struct Replay {
    frames: usize,
}

impl FrameSource for Replay {
    type Frame = Still;

    fn read(&mut self) -> turret_backend::Result<Still> {
        if self.frames == 0 {
            return Err(Error::FrameRead);
        }
        self.frames -= 1;
        Ok(Still)
    }
}

struct Fixed(DetectionResult);

impl Detector<Still> for Fixed {
    fn detect(&mut self, _frame: &Still) -> turret_backend::Result<DetectionResult> {
        Ok(self.0.clone())
    }
}

struct NoOverlay;

impl Renderer<Still> for NoOverlay {
    fn draw_detections(
        &mut self,
        _frame: &mut Still,
        _result: &DetectionResult,
    ) -> turret_backend::Result<()> {
        Ok(())
    }

    fn draw_fps(&mut self, _frame: &mut Still, _fps: f64) -> turret_backend::Result<()> {
        Ok(())
    }
}

struct NeverStop;

impl Display<Still> for NeverStop {
    fn show(&mut self, _frame: &Still) -> turret_backend::Result<()> {
        Ok(())
    }

    fn stop_requested(&mut self) -> bool {
        false
    }
}

fn settings() -> TurretSettings {
    let mut settings = TurretSettings {
        enabled: true,
        ..TurretSettings::default()
    };
    settings.pan.step_delay = Duration::ZERO;
    settings.tilt.step_delay = Duration::ZERO;
    settings
}

fn driving() -> (PanTiltController, PinLog) {
    let (chip, log) = RecordingChip::new();
    let controller = PanTiltController::new(&settings(), GpioCapability::Available(Box::new(chip)));
    assert_eq!(controller.mode(), ControllerMode::Driving);
    log.clear();
    (controller, log)
}

fn single(x: i32, y: i32) -> DetectionResult {
    DetectionResult::new(vec![Detection::new(
        BoundingBox::new(x, y, 40, 40),
        vec![Category::new(0, Some("person".into()), 0.9)],
    )])
}

fn run(frames: usize, result: DetectionResult, controller: PanTiltController) -> StopReason {
    let mut tracking = TrackingLoop::new(Replay { frames }, Fixed(result), NoOverlay, controller);
    tracking.run(&mut NeverStop)
}

#[test]
fn centred_target_issues_no_motion() {
    let (controller, log) = driving();

    assert_eq!(run(1, single(300, 200), controller), StopReason::SourceFailed);
    // only the shutdown: both enables deasserted, then the release
    assert_eq!(
        log.events(),
        vec![PinEvent::High(22), PinEvent::High(25), PinEvent::Released]
    );
}

#[test]
fn target_right_of_centre_pans_five_steps_per_frame() {
    let (controller, log) = driving();

    run(3, single(500, 200), controller);
    assert_eq!(log.pulses(17), 15);
    assert_eq!(log.pulses(23), 0);
}

#[test]
fn target_below_centre_tilts_with_inverted_sign() {
    let (controller, log) = driving();

    // centre (320, 420): dy = 0.75 -> +6 raw, tilt driven with -6
    run(1, single(300, 400), controller);
    assert_eq!(log.pulses(23), 6);
    assert_eq!(log.level(24), Some(false));
    assert_eq!(log.pulses(17), 0);
}

#[test]
fn no_categories_means_no_actuator_calls() {
    let (controller, log) = driving();
    let result = DetectionResult::new(vec![
        Detection::new(BoundingBox::new(0, 0, 10, 10), vec![]),
        Detection::new(BoundingBox::new(600, 400, 30, 30), vec![]),
    ]);

    run(5, result, controller);
    assert_eq!(log.pulses(17), 0);
    assert_eq!(log.pulses(23), 0);
    assert_eq!(log.releases(), 1);
}

#[test]
fn simulated_controller_never_touches_hardware() {
    let (chip, log) = RecordingChip::new();
    let mut disabled = settings();
    disabled.enabled = false;
    let controller = PanTiltController::new(&disabled, GpioCapability::Available(Box::new(chip)));
    assert_eq!(controller.mode(), ControllerMode::Simulated);

    run(3, single(600, 10), controller);
    assert!(log.events().is_empty());
}

#[test]
fn fps_meter_reports_twenty_for_ten_frames_in_half_a_second() {
    let start = Instant::now();
    let mut meter = FpsMeter::starting_at(10, start);
    let mut reported = None;
    for i in 1..=10u64 {
        reported = meter.record(start + Duration::from_millis(50 * i));
    }

    let fps = reported.unwrap();
    assert!((fps - 20.0).abs() < 1e-9);
}

#[test]
fn custom_fps_window_is_used_by_the_loop() {
    let controller = PanTiltController::simulated(&TurretSettings::default());
    let mut tracking = TrackingLoop::new(
        Replay { frames: 5 },
        Fixed(DetectionResult::default()),
        NoOverlay,
        controller,
    )
    .with_fps_meter(FpsMeter::new(2));

    tracking.step().unwrap();
    assert_eq!(tracking.fps(), 0.0);
    tracking.step().unwrap();
    assert!(tracking.fps() > 0.0);
}
