use opencv::core::{Point, Rect, Scalar};
use opencv::imgproc::{cvt_color, put_text, rectangle, FONT_HERSHEY_SIMPLEX, LINE_8};
use opencv::prelude::{Mat, MatTraitConst, MatTraitConstManual};

use crate::detection::DetectionResult;
use crate::tracking::Renderer;

pub use opencv::imgproc::COLOR_BGR2RGBA;

const FALLBACK_LABEL: &str = "object";
const LABEL_OFFSET: i32 = 8;
const LABEL_MIN_Y: i32 = 10;
const LABEL_BELOW_OFFSET: i32 = 20;
const FPS_ORIGIN: Point = Point::new(10, 25);

pub fn to_rgba(frame: &Mat, code: i32) -> crate::Result<Mat> {
    let mut rgba_frame = Mat::default();
    cvt_color(frame, &mut rgba_frame, code, 0)?;

    Ok(rgba_frame)
}

/// Size and packed pixel bytes. Non-continuous frames (ROIs) are copied first.
pub fn mat_size_and_vec(mat: &Mat) -> crate::Result<([usize; 2], Vec<u8>)> {
    let packed;
    let mat = if mat.is_continuous() {
        mat
    } else {
        packed = mat.try_clone()?;
        &packed
    };

    Ok((
        [mat.cols() as usize, mat.rows() as usize],
        mat.data_bytes()?.into(),
    ))
}

/// Keeps a label above its box unless that would leave the frame.
pub fn label_y(box_top: i32) -> i32 {
    if box_top - LABEL_OFFSET > LABEL_MIN_Y {
        box_top - LABEL_OFFSET
    } else {
        box_top + LABEL_BELOW_OFFSET
    }
}

/// Draws boxes, labels and the frame rate onto BGR frames.
pub struct Overlay {
    color: Scalar,
    thickness: i32,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            // BGR red
            color: Scalar::new(0., 0., 255., 0.),
            thickness: 2,
        }
    }
}

impl Renderer<Mat> for Overlay {
    fn draw_detections(&mut self, frame: &mut Mat, result: &DetectionResult) -> crate::Result<()> {
        for det in &result.detections {
            let bbox = det.bounding_box;
            rectangle(
                frame,
                Rect::new(bbox.origin_x, bbox.origin_y, bbox.width, bbox.height),
                self.color,
                self.thickness,
                LINE_8,
                0,
            )?;

            // categories are usually there, but not always
            let Some(category) = det.categories.first() else {
                continue;
            };
            let name = category.label.as_deref().unwrap_or(FALLBACK_LABEL);
            put_text(
                frame,
                &format!("{} {:.2}", name, category.score()),
                Point::new(bbox.origin_x, label_y(bbox.origin_y)),
                FONT_HERSHEY_SIMPLEX,
                0.6,
                self.color,
                self.thickness,
                LINE_8,
                false,
            )?;
        }

        Ok(())
    }

    fn draw_fps(&mut self, frame: &mut Mat, fps: f64) -> crate::Result<()> {
        put_text(
            frame,
            &format!("FPS: {fps:.1}"),
            FPS_ORIGIN,
            FONT_HERSHEY_SIMPLEX,
            0.7,
            self.color,
            self.thickness,
            LINE_8,
            false,
        )?;

        Ok(())
    }
}
