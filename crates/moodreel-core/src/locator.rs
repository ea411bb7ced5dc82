//! Cascade face locator.
//!
//! Runs a pretrained SeetaFace funnel-structured cascade over the grayscale
//! frame and selects the dominant (largest) face box.

use crate::types::{BoundingBox, ImageFrame};
use std::path::Path;
use thiserror::Error;

// --- Named constants (no magic numbers) ---
const DEFAULT_SCALE_FACTOR: f32 = 1.3;
const DEFAULT_MIN_NEIGHBORS: u32 = 5;
const DEFAULT_MIN_FACE_SIZE: u32 = 40;
const SLIDE_WINDOW_STEP: u32 = 4;
// rustface rejects min_face_size below 20 and pyramid steps outside (0, 1).
const CASCADE_MIN_FACE_FLOOR: u32 = 20;
const PYRAMID_STEP_MIN: f32 = 0.1;
const PYRAMID_STEP_MAX: f32 = 0.99;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("cascade model file not found: {0}")]
    ModelNotFound(String),
    #[error("cascade model unreadable: {0}")]
    ModelLoad(String),
}

/// Detector tuning constants, trading recall for precision.
#[derive(Debug, Clone, Copy)]
pub struct LocatorConfig {
    /// Image-pyramid step between detection scales.
    pub scale_factor: f32,
    /// Acceptance threshold for a candidate window. The funnel cascade has
    /// no neighbor-count knob; its aggregated score threshold is the
    /// equivalent recall/precision dial, so this value maps onto it.
    pub min_neighbors: u32,
    /// Smallest face edge considered, in pixels.
    pub min_face_size: u32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
        }
    }
}

/// SeetaFace-based face locator.
pub struct FaceLocator {
    model: rustface::Model,
    config: LocatorConfig,
}

impl FaceLocator {
    /// Load the cascade model from the given path.
    ///
    /// Unlike the classifiers, the locator has no degraded mode: a missing
    /// or corrupt model fails startup.
    pub fn load(model_path: &str, config: LocatorConfig) -> Result<Self, LocatorError> {
        if !Path::new(model_path).exists() {
            return Err(LocatorError::ModelNotFound(model_path.to_string()));
        }

        let bytes = std::fs::read(model_path)
            .map_err(|e| LocatorError::ModelLoad(e.to_string()))?;
        let model = rustface::read_model(std::io::Cursor::new(bytes))
            .map_err(|e| LocatorError::ModelLoad(e.to_string()))?;

        tracing::info!(
            path = model_path,
            scale_factor = config.scale_factor,
            min_neighbors = config.min_neighbors,
            min_face_size = config.min_face_size,
            "loaded cascade face model"
        );

        Ok(Self { model, config })
    }

    /// Locate the dominant face in a frame.
    ///
    /// Returns `None` when the cascade finds nothing. With multiple
    /// detections, the maximal-area box wins; equal areas resolve to the
    /// leftmost, then topmost box.
    pub fn locate(&self, frame: &ImageFrame) -> Option<BoundingBox> {
        let gray = frame.to_luma();

        // rustface detectors are stateful (detect takes &mut); one is built
        // per call from the shared model.
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.config.min_face_size.max(CASCADE_MIN_FACE_FLOOR));
        detector.set_score_thresh(self.config.min_neighbors.max(1) as f64);
        detector.set_pyramid_scale_factor(
            (1.0 / self.config.scale_factor).clamp(PYRAMID_STEP_MIN, PYRAMID_STEP_MAX),
        );
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let faces = detector.detect(&rustface::ImageData::new(&gray, frame.width, frame.height));

        let candidates: Vec<BoundingBox> = faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                clamp_to_frame(
                    bbox.x(),
                    bbox.y(),
                    bbox.width(),
                    bbox.height(),
                    frame.width,
                    frame.height,
                )
            })
            .collect();

        tracing::debug!(raw = faces.len(), kept = candidates.len(), "cascade pass done");

        dominant_box(&candidates)
    }
}

/// Clamp a raw detection to frame bounds; `None` if nothing remains.
fn clamp_to_frame(
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    frame_width: u32,
    frame_height: u32,
) -> Option<BoundingBox> {
    let left = x.max(0) as u32;
    let top = y.max(0) as u32;
    if left >= frame_width || top >= frame_height {
        return None;
    }

    let right = (x.saturating_add(width as i32)).min(frame_width as i32);
    let bottom = (y.saturating_add(height as i32)).min(frame_height as i32);
    if right <= left as i32 || bottom <= top as i32 {
        return None;
    }

    Some(BoundingBox {
        x: left,
        y: top,
        width: right as u32 - left,
        height: bottom as u32 - top,
    })
}

/// Largest-area box; equal areas resolved leftmost, then topmost.
fn dominant_box(boxes: &[BoundingBox]) -> Option<BoundingBox> {
    boxes.iter().copied().max_by(|a, b| {
        a.area()
            .cmp(&b.area())
            .then_with(|| b.x.cmp(&a.x))
            .then_with(|| b.y.cmp(&a.y))
    })
}
