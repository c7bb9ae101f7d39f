//! Pan/tilt tracking: turns one frame's detections into stepper motion.
//!
//! Control is purely reactive. Each frame the highest scoring detection is
//! located, its offset from the frame centre is normalised to roughly
//! `-1..1` per axis, scaled by a proportional gain and truncated to whole
//! steps. Offsets inside the deadzone produce no motion on that axis.

use log::{debug, info, warn};

use crate::config::TurretSettings;
use crate::detection::{Detection, DetectionResult, FrameGeometry};
use crate::motor::{GpioCapability, GpioChip, Stepper};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerMode {
    /// Steppers are driven.
    Driving,
    /// Movement is computed and logged only.
    Simulated,
}

/// Signed step counts decided for one frame, before the tilt inversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanTiltCommand {
    pub pan: i32,
    pub tilt: i32,
}

impl PanTiltCommand {
    pub fn is_idle(&self) -> bool {
        self.pan == 0 && self.tilt == 0
    }
}

struct Hardware {
    pan: Stepper,
    tilt: Stepper,
    chip: Box<dyn GpioChip>,
}

pub struct PanTiltController {
    mode: ControllerMode,
    gain: f64,
    deadzone: f64,
    hardware: Option<Hardware>,
}

impl PanTiltController {
    /// Picks the mode once. Requested hardware that cannot be brought up
    /// degrades to [`ControllerMode::Simulated`].
    pub fn new(settings: &TurretSettings, capability: GpioCapability) -> Self {
        let mut controller = Self::simulated(settings);
        if !settings.enabled {
            return controller;
        }

        let mut chip = match capability {
            GpioCapability::Available(chip) => chip,
            GpioCapability::Unavailable(reason) => {
                warn!("turret gpio unavailable ({reason}), running in simulated mode");
                return controller;
            }
        };

        let steppers = Stepper::new(chip.as_mut(), settings.pan.pins, settings.pan.step_delay)
            .and_then(|mut pan| {
                match Stepper::new(chip.as_mut(), settings.tilt.pins, settings.tilt.step_delay) {
                    Ok(tilt) => Ok((pan, tilt)),
                    Err(err) => {
                        pan.shutdown();
                        Err(err)
                    }
                }
            });

        match steppers {
            Ok((pan, tilt)) => {
                info!(
                    "turret driving steppers (pan {:?}, tilt {:?})",
                    pan.pins(),
                    tilt.pins()
                );
                controller.mode = ControllerMode::Driving;
                controller.hardware = Some(Hardware { pan, tilt, chip });
            }
            Err(err) => {
                warn!("turret setup failed ({err}), running in simulated mode");
                chip.release();
            }
        }

        controller
    }

    pub fn simulated(settings: &TurretSettings) -> Self {
        Self {
            mode: ControllerMode::Simulated,
            gain: settings.gain,
            deadzone: settings.deadzone,
            hardware: None,
        }
    }

    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    /// Movement for this frame, `None` when nothing trackable was detected.
    pub fn command_for(
        &self,
        result: &DetectionResult,
        geometry: FrameGeometry,
    ) -> Option<PanTiltCommand> {
        if geometry.is_degenerate() {
            return None;
        }

        let best = select_best(result)?;
        let (cx, cy) = best.bounding_box.center();
        let dx = normalized_offset(cx, geometry.width);
        let dy = normalized_offset(cy, geometry.height);

        Some(PanTiltCommand {
            pan: axis_steps(dx, self.gain, self.deadzone),
            tilt: axis_steps(dy, self.gain, self.deadzone),
        })
    }

    pub fn track(&mut self, result: &DetectionResult, geometry: FrameGeometry) {
        let Some(command) = self.command_for(result, geometry) else {
            return;
        };

        match (&mut self.hardware, self.mode) {
            (_, ControllerMode::Simulated) => {
                if !command.is_idle() {
                    info!(
                        "[sim turret] pan_steps={:+}, tilt_steps={:+}",
                        command.pan, command.tilt
                    );
                }
            }
            (Some(hw), ControllerMode::Driving) => {
                if command.pan != 0 {
                    hw.pan.step(command.pan);
                }
                // Tilt is mounted upside down relative to the image y axis.
                if command.tilt != 0 {
                    hw.tilt.step(-command.tilt);
                }
            }
            (None, ControllerMode::Driving) => {
                debug!("turret already shut down, ignoring {command:?}");
            }
        }
    }

    /// Powers down both axes and hands GPIO back. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if let Some(mut hw) = self.hardware.take() {
            hw.pan.shutdown();
            hw.tilt.shutdown();
            drop(hw.pan);
            drop(hw.tilt);
            hw.chip.release();
            info!("turret released");
        }
    }
}

impl Drop for PanTiltController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// First detection with the strictly greatest first-category score.
pub fn select_best(result: &DetectionResult) -> Option<&Detection> {
    let mut best = None;
    let mut best_score = -1.0_f32;

    for det in &result.detections {
        let Some(score) = det.top_score() else {
            continue;
        };
        if score > best_score {
            best_score = score;
            best = Some(det);
        }
    }

    best
}

/// Offset of `center` from the middle of `extent`, in half-extents. Not clamped.
pub fn normalized_offset(center: f64, extent: u32) -> f64 {
    let half = extent as f64 / 2.0;
    (center - half) / half
}

/// Truncates `offset * gain` toward zero; offsets strictly inside `deadzone` give 0.
pub fn axis_steps(offset: f64, gain: f64, deadzone: f64) -> i32 {
    if offset.abs() < deadzone {
        return 0;
    }
    (offset * gain) as i32
}
