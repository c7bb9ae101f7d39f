use log::{debug, error, info, warn};
use std::time::Instant;

use crate::detection::{DetectionResult, FrameGeometry};
use crate::fps::FpsMeter;
use crate::pan_tilt::PanTiltController;

/// An image as produced by a [`FrameSource`].
pub trait Frame {
    fn geometry(&self) -> FrameGeometry;
}

pub trait FrameSource {
    type Frame: Frame;

    /// Next frame. Any error ends tracking.
    fn read(&mut self) -> crate::Result<Self::Frame>;

    fn release(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

pub trait Detector<F> {
    /// Must not modify the frame.
    fn detect(&mut self, frame: &F) -> crate::Result<DetectionResult>;
}

pub trait Renderer<F> {
    fn draw_detections(&mut self, frame: &mut F, result: &DetectionResult) -> crate::Result<()>;

    fn draw_fps(&mut self, frame: &mut F, fps: f64) -> crate::Result<()>;
}

/// Where annotated frames go, and where a stop request comes from.
pub trait Display<F> {
    fn show(&mut self, frame: &F) -> crate::Result<()>;

    /// Polled once per iteration, after [`Display::show`].
    fn stop_requested(&mut self) -> bool;

    fn close(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    SourceFailed,
}

/// Capture, detect, render, track, repeat. Everything runs on the calling
/// thread; an iteration finishes, stepper moves included, before the next
/// frame is read.
pub struct TrackingLoop<S, D, R> {
    source: S,
    detector: D,
    renderer: R,
    controller: PanTiltController,
    fps: FpsMeter,
    shut_down: bool,
}

impl<S, D, R> TrackingLoop<S, D, R>
where
    S: FrameSource,
    D: Detector<S::Frame>,
    R: Renderer<S::Frame>,
{
    pub fn new(source: S, detector: D, renderer: R, controller: PanTiltController) -> Self {
        Self {
            source,
            detector,
            renderer,
            controller,
            fps: FpsMeter::default(),
            shut_down: false,
        }
    }

    pub fn with_fps_meter(mut self, fps: FpsMeter) -> Self {
        self.fps = fps;
        self
    }

    pub fn controller(&self) -> &PanTiltController {
        &self.controller
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn fps(&self) -> f64 {
        self.fps.fps()
    }

    /// One iteration. Returns the annotated frame; fails only when the
    /// source cannot produce a frame. Detector and renderer failures skip
    /// the rest of the frame's work.
    pub fn step(&mut self) -> crate::Result<S::Frame> {
        let mut frame = self.source.read()?;
        let geometry = frame.geometry();

        match self.detector.detect(&frame) {
            Ok(result) => {
                if let Err(err) = self.renderer.draw_detections(&mut frame, &result) {
                    debug!("failed to draw detections: {err}");
                }
                self.controller.track(&result, geometry);
            }
            Err(err) => debug!("skipping frame: {err}"),
        }

        if let Some(fps) = self.fps.record(Instant::now()) {
            debug!("{fps:.1} fps");
        }
        if let Err(err) = self.renderer.draw_fps(&mut frame, self.fps.fps()) {
            debug!("failed to draw fps: {err}");
        }

        Ok(frame)
    }

    /// Iterates until `display` asks to stop or the source fails, then
    /// shuts down: turret, source, display, in that order.
    pub fn run<V>(&mut self, display: &mut V) -> StopReason
    where
        V: Display<S::Frame>,
    {
        let reason = loop {
            let frame = match self.step() {
                Ok(frame) => frame,
                Err(err) => {
                    error!("{err}");
                    break StopReason::SourceFailed;
                }
            };

            if let Err(err) = display.show(&frame) {
                warn!("failed to show frame: {err}");
            }
            if display.stop_requested() {
                info!("stop requested");
                break StopReason::Requested;
            }
        };

        self.shutdown();
        display.close();
        reason
    }

    /// Releases the turret, then the frame source. Later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.controller.shutdown();
        if let Err(err) = self.source.release() {
            warn!("failed to release frame source: {err}");
        }
    }
}
