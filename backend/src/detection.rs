//! Per-frame detector output as consumed by the turret.
//!
//! Everything here is transient: produced for one frame and dropped once
//! the controller has made its decision for that frame.

/// Pixel rectangle relative to the frame it was detected on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub origin_x: i32,
    pub origin_y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(origin_x: i32, origin_y: i32, width: i32, height: i32) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.origin_x as f64 + self.width as f64 / 2.0,
            self.origin_y as f64 + self.height as f64 / 2.0,
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Category {
    pub index: i32,
    pub label: Option<String>,
    /// Confidence in [0, 1]. Detectors may leave it unset.
    pub score: Option<f32>,
}

impl Category {
    pub fn new(index: i32, label: Option<String>, score: f32) -> Self {
        Self {
            index,
            label,
            score: Some(score),
        }
    }

    /// Score used for ranking; missing or non-finite scores count as 0.0.
    pub fn score(&self) -> f32 {
        match self.score {
            Some(score) if score.is_finite() => score,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub categories: Vec<Category>,
}

impl Detection {
    pub fn new(bounding_box: BoundingBox, categories: Vec<Category>) -> Self {
        Self {
            bounding_box,
            categories,
        }
    }

    /// Score of the first category, `None` when there are no categories.
    pub fn top_score(&self) -> Option<f32> {
        self.categories.first().map(Category::score)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Size of the frame a [`DetectionResult`] was computed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
