//! moodreel-core — face attribute inference and genre selection.
//!
//! Locates the dominant face in a photograph with a SeetaFace funnel
//! cascade, infers emotion and age/gender with two ONNX classifiers, and
//! maps the inferred attributes onto catalog genre ids. A missing or
//! failing classifier degrades its fields to documented defaults; only an
//! undecodable image fails a request.

pub mod age_gender;
pub mod emotion;
pub mod locator;
pub mod pipeline;
pub mod recommend;
pub mod region;
pub mod types;

pub use pipeline::{aggregate, Analyzer, AnalyzerConfig, ClassifierOutcome};
pub use recommend::{select_genres, GenreId};
pub use types::{AttributeResult, BoundingBox, Emotion, Gender, ImageFrame};

use std::path::PathBuf;

/// Model file names expected inside the model directory.
pub const CASCADE_MODEL_FILE: &str = "seeta_fd_frontal_v1.0.bin";
pub const EMOTION_MODEL_FILE: &str = "emotion_fer7.onnx";
pub const AGE_GENDER_MODEL_FILE: &str = "age_gender.onnx";

/// Default directory for the cascade and classifier model files.
pub fn default_model_dir() -> PathBuf {
    PathBuf::from("/usr/share/moodreel/models")
}
