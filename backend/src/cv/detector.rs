use log::info;
use opencv::core::{self, Rect, Scalar, Size, Vector};
use opencv::dnn::DetectionModel;
use opencv::prelude::*;
use std::path::Path;

use crate::config::DetectorSettings;
use crate::detection::{BoundingBox, Category, Detection, DetectionResult};
use crate::error::Error;
use crate::tracking::Detector;

/// Object detector backed by OpenCV's DNN module (`.tflite`, `.onnx`, ...).
pub struct DnnDetector {
    model: DetectionModel,
    labels: Vec<String>,
    score_threshold: f32,
    max_results: usize,
}

impl DnnDetector {
    pub fn load(settings: &DetectorSettings) -> crate::Result<Self> {
        let model_path = settings
            .model
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("a detection model path is required".into()))?;
        let model_str = model_path
            .to_str()
            .ok_or_else(|| Error::InvalidConfig("model path is not valid UTF-8".into()))?;

        core::set_num_threads(settings.threads)?;
        let mut model = DetectionModel::new(model_str, "")?;
        // The camera yields BGR, the model wants RGB.
        model.set_input_params(
            1.0,
            Size::new(settings.input_size, settings.input_size),
            Scalar::default(),
            true,
            false,
        )?;

        let labels = match &settings.labels {
            Some(path) => read_labels(path)?,
            None => Vec::new(),
        };
        info!(
            "loaded detection model {} ({} labels)",
            model_path.display(),
            labels.len()
        );

        Ok(Self {
            model,
            labels,
            score_threshold: settings.score_threshold,
            max_results: settings.max_results,
        })
    }
}

impl Detector<Mat> for DnnDetector {
    fn detect(&mut self, frame: &Mat) -> crate::Result<DetectionResult> {
        let mut class_ids = Vector::<i32>::new();
        let mut confidences = Vector::<f32>::new();
        let mut boxes = Vector::<Rect>::new();
        self.model.detect(
            frame,
            &mut class_ids,
            &mut confidences,
            &mut boxes,
            self.score_threshold,
            0.0,
        )?;

        let raw = class_ids
            .iter()
            .zip(confidences.iter())
            .zip(boxes.iter())
            .map(|((class_id, score), rect)| RawDetection {
                class_id,
                score,
                rect: BoundingBox::new(rect.x, rect.y, rect.width, rect.height),
            });

        Ok(rank(
            raw,
            self.score_threshold,
            self.max_results,
            &self.labels,
        ))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RawDetection {
    pub class_id: i32,
    pub score: f32,
    pub rect: BoundingBox,
}

/// Keeps detections at or above `score_threshold`, best first, at most `max_results`.
pub fn rank(
    raw: impl IntoIterator<Item = RawDetection>,
    score_threshold: f32,
    max_results: usize,
    labels: &[String],
) -> DetectionResult {
    let mut ranked: Vec<_> = raw
        .into_iter()
        .filter(|d| d.score >= score_threshold)
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(max_results);

    let detections = ranked
        .into_iter()
        .map(|d| {
            let label = usize::try_from(d.class_id)
                .ok()
                .and_then(|idx| labels.get(idx))
                .filter(|label| !label.is_empty())
                .cloned();
            Detection::new(d.rect, vec![Category::new(d.class_id, label, d.score)])
        })
        .collect();

    DetectionResult::new(detections)
}

/// One label per line, line number is the class index.
pub fn read_labels(path: &Path) -> crate::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(parse_labels(&raw))
}

pub fn parse_labels(raw: &str) -> Vec<String> {
    raw.lines().map(|line| line.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(class_id: i32, score: f32) -> RawDetection {
        RawDetection {
            class_id,
            score,
            rect: BoundingBox::new(class_id * 10, 0, 10, 10),
        }
    }

    #[test]
    fn rank_orders_filters_and_truncates() {
        let labels = parse_labels("person\nbicycle\ncar");
        let result = rank(
            vec![raw(0, 0.4), raw(1, 0.2), raw(2, 0.9), raw(0, 0.6), raw(1, 0.5)],
            0.3,
            3,
            &labels,
        );

        let scores: Vec<f32> = result.detections.iter().filter_map(|d| d.top_score()).collect();
        assert_eq!(scores, vec![0.9, 0.6, 0.5]);
        let first = &result.detections[0].categories[0];
        assert_eq!(first.label.as_deref(), Some("car"));
        assert_eq!(result.detections[0].bounding_box.origin_x, 20);
    }

    #[test]
    fn unknown_or_blank_labels_are_absent() {
        let labels = parse_labels("person\n\n");
        let result = rank(vec![raw(1, 0.9), raw(7, 0.8), raw(-1, 0.7)], 0.0, 10, &labels);
        assert!(result
            .detections
            .iter()
            .all(|d| d.categories[0].label.is_none()));
    }

    #[test]
    fn labels_follow_line_numbers() {
        let labels = parse_labels("person\nbicycle \n\ncar\n");
        assert_eq!(labels, vec!["person", "bicycle", "", "car"]);
    }
}
