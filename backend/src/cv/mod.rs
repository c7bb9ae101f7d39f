use log::info;
use opencv::core::flip;
use opencv::prelude::{MatTraitConst, VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{self, VideoCapture};

use crate::config::CameraSettings;
use crate::detection::FrameGeometry;
use crate::error::Error;
use crate::tracking::{Frame, FrameSource};

pub mod detector;
pub mod vision;

pub use opencv::core::Mat;

impl Frame for Mat {
    fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.cols().max(0) as u32, self.rows().max(0) as u32)
    }
}

/// Camera frames in BGR, optionally mirrored.
pub struct Camera {
    source: VideoCapture,
    camera_id: i32,
    mirror: bool,
}

impl Camera {
    pub fn connect(settings: &CameraSettings) -> crate::Result<Self> {
        let mut source = VideoCapture::new(settings.index, videoio::CAP_ANY)?;
        source.set(videoio::CAP_PROP_FRAME_WIDTH, settings.width as f64)?;
        source.set(videoio::CAP_PROP_FRAME_HEIGHT, settings.height as f64)?;

        if !source.is_opened()? {
            return Err(Error::CameraUnavailable(settings.index));
        }
        info!(
            "camera {} opened at {}x{}",
            settings.index,
            source.get(videoio::CAP_PROP_FRAME_WIDTH)?,
            source.get(videoio::CAP_PROP_FRAME_HEIGHT)?
        );

        Ok(Self {
            source,
            camera_id: settings.index,
            mirror: settings.mirror,
        })
    }

    pub fn camera_id(&self) -> i32 {
        self.camera_id
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    pub fn set_mirror(&mut self, mirror: bool) {
        self.mirror = mirror;
    }
}

impl FrameSource for Camera {
    type Frame = Mat;

    fn read(&mut self) -> crate::Result<Mat> {
        let mut frame = Mat::default();
        if !self.source.read(&mut frame)? || frame.rows() == 0 || frame.cols() == 0 {
            return Err(Error::FrameRead);
        }

        if !self.mirror {
            return Ok(frame);
        }

        let mut flipped = Mat::default();
        flip(&frame, &mut flipped, 1)?;
        Ok(flipped)
    }

    fn release(&mut self) -> crate::Result<()> {
        self.source.release()?;
        Ok(())
    }
}
