//! Attribute inference pipeline — orchestration and aggregation.
//!
//! A single [`Analyzer`] owns the face locator and the two optional
//! classifier adapters. It is built once at process start and stays
//! read-only afterwards (the `&mut` receivers exist only because ONNX
//! session invocation takes `&mut`). A classifier that is absent or fails
//! mid-inference degrades that adapter's fields to the documented
//! defaults; only an undecodable image fails a request.

use crate::age_gender::{AgeGenderClassifier, AgeGenderError};
use crate::emotion::{EmotionClassifier, EmotionError};
use crate::locator::{FaceLocator, LocatorConfig, LocatorError};
use crate::region::{FaceRegion, RegionError, AGE_GENDER_INPUT_SIZE, EMOTION_INPUT_SIZE};
use crate::types::{AttributeResult, BoundingBox, DecodeError, Emotion, Gender, ImageFrame};
use thiserror::Error;

/// Startup failure while constructing the [`Analyzer`].
///
/// A missing classifier file is NOT a build error (the adapter is disabled
/// instead); a present-but-malformed model is, so schema problems surface
/// at startup rather than at first inference.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("locator: {0}")]
    Locator(#[from] LocatorError),
    #[error("emotion classifier: {0}")]
    Emotion(#[from] EmotionError),
    #[error("age/gender classifier: {0}")]
    AgeGender(#[from] AgeGenderError),
}

/// Request-time pipeline failure. Classifier errors never appear here —
/// they degrade instead of propagating.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Region(#[from] RegionError),
}

/// Typed outcome of one classifier adapter for a single request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassifierOutcome<T> {
    /// Adapter ran and produced a value.
    Ok(T),
    /// Model never loaded; adapter skipped.
    Unavailable,
    /// Model raised during inference; logged at the call site.
    Failed,
}

/// Merge the per-adapter outcomes into one attribute record.
///
/// No face short-circuits to the all-unknown record. Otherwise the default
/// record is the starting point and each `Ok` outcome overwrites only the
/// fields that adapter owns. Deterministic in its inputs.
pub fn aggregate(
    face: Option<&BoundingBox>,
    emotion: ClassifierOutcome<(Emotion, f32)>,
    age_gender: ClassifierOutcome<(u32, Gender)>,
) -> AttributeResult {
    if face.is_none() {
        return AttributeResult::no_face();
    }

    let mut result = AttributeResult::defaults();
    if let ClassifierOutcome::Ok((emotion, confidence)) = emotion {
        result.emotion = emotion;
        result.confidence = confidence;
    }
    if let ClassifierOutcome::Ok((age, gender)) = age_gender {
        result.age = age;
        result.gender = gender;
    }
    result
}

/// Model file paths and locator tuning for an [`Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub cascade_model_path: String,
    pub emotion_model_path: String,
    pub age_gender_model_path: String,
    pub locator: LocatorConfig,
}

impl AnalyzerConfig {
    /// Config for a model directory using the standard file names.
    pub fn from_model_dir(model_dir: &std::path::Path, locator: LocatorConfig) -> Self {
        let path = |file: &str| model_dir.join(file).to_string_lossy().into_owned();
        Self {
            cascade_model_path: path(crate::CASCADE_MODEL_FILE),
            emotion_model_path: path(crate::EMOTION_MODEL_FILE),
            age_gender_model_path: path(crate::AGE_GENDER_MODEL_FILE),
            locator,
        }
    }
}

/// The face-attribute inference service.
pub struct Analyzer {
    locator: FaceLocator,
    emotion: Option<EmotionClassifier>,
    age_gender: Option<AgeGenderClassifier>,
}

impl Analyzer {
    /// Build the service: cascade model required, classifiers optional.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, BuildError> {
        let locator = FaceLocator::load(&config.cascade_model_path, config.locator)?;

        let emotion = match EmotionClassifier::load(&config.emotion_model_path) {
            Ok(classifier) => Some(classifier),
            Err(EmotionError::ModelNotFound(path)) => {
                tracing::warn!(path, "emotion model missing; adapter disabled");
                None
            }
            Err(err) => return Err(err.into()),
        };

        let age_gender = match AgeGenderClassifier::load(&config.age_gender_model_path) {
            Ok(classifier) => Some(classifier),
            Err(AgeGenderError::ModelNotFound(path)) => {
                tracing::warn!(path, "age/gender model missing; adapter disabled");
                None
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            locator,
            emotion,
            age_gender,
        })
    }

    pub fn emotion_available(&self) -> bool {
        self.emotion.is_some()
    }

    pub fn age_gender_available(&self) -> bool {
        self.age_gender.is_some()
    }

    /// Decode raw image bytes and run the pipeline.
    pub fn analyze_bytes(&mut self, bytes: &[u8]) -> Result<AttributeResult, AnalysisError> {
        let frame = ImageFrame::decode(bytes)?;
        self.analyze(&frame)
    }

    /// Run the pipeline on a decoded frame: locate the dominant face, crop,
    /// invoke both adapters, aggregate.
    pub fn analyze(&mut self, frame: &ImageFrame) -> Result<AttributeResult, AnalysisError> {
        let Some(face) = self.locator.locate(frame) else {
            tracing::debug!(width = frame.width, height = frame.height, "no face located");
            return Ok(AttributeResult::no_face());
        };

        let region = FaceRegion::crop(frame, &face)?;

        let emotion = match self.emotion.as_mut() {
            None => ClassifierOutcome::Unavailable,
            Some(classifier) => match classifier.classify(&region.to_tensor(EMOTION_INPUT_SIZE)) {
                Ok(value) => ClassifierOutcome::Ok(value),
                Err(err) => {
                    tracing::warn!(error = %err, "emotion inference failed; keeping defaults");
                    ClassifierOutcome::Failed
                }
            },
        };

        let age_gender = match self.age_gender.as_mut() {
            None => ClassifierOutcome::Unavailable,
            Some(classifier) => {
                match classifier.classify(&region.to_tensor(AGE_GENDER_INPUT_SIZE)) {
                    Ok(value) => ClassifierOutcome::Ok(value),
                    Err(err) => {
                        tracing::warn!(error = %err, "age/gender inference failed; keeping defaults");
                        ClassifierOutcome::Failed
                    }
                }
            }
        };

        let result = aggregate(Some(&face), emotion, age_gender);
        tracing::info!(
            emotion = %result.emotion,
            age = result.age,
            gender = %result.gender,
            confidence = result.confidence,
            "attributes inferred"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACE: BoundingBox = BoundingBox { x: 10, y: 10, width: 50, height: 50 };

    #[test]
    fn test_no_face_short_circuits() {
        // Adapter outcomes are irrelevant when no box was produced.
        let result = aggregate(
            None,
            ClassifierOutcome::Ok((Emotion::Happy, 0.99)),
            ClassifierOutcome::Ok((40, Gender::Female)),
        );
        assert_eq!(result, AttributeResult::no_face());
    }

    #[test]
    fn test_both_adapters_contribute() {
        let result = aggregate(
            Some(&FACE),
            ClassifierOutcome::Ok((Emotion::Sad, 0.72)),
            ClassifierOutcome::Ok((31, Gender::Male)),
        );
        assert_eq!(result.emotion, Emotion::Sad);
        assert!((result.confidence - 0.72).abs() < 1e-6);
        assert_eq!(result.age, 31);
        assert_eq!(result.gender, Gender::Male);
    }

    #[test]
    fn test_unavailable_emotion_keeps_defaults() {
        let result = aggregate(
            Some(&FACE),
            ClassifierOutcome::Unavailable,
            ClassifierOutcome::Ok((19, Gender::Female)),
        );
        assert_eq!(result.emotion, Emotion::Neutral);
        assert!((result.confidence - 0.85).abs() < 1e-6);
        assert_eq!(result.age, 19);
        assert_eq!(result.gender, Gender::Female);
    }

    #[test]
    fn test_failed_age_gender_keeps_defaults() {
        let result = aggregate(
            Some(&FACE),
            ClassifierOutcome::Ok((Emotion::Angry, 0.6)),
            ClassifierOutcome::Failed,
        );
        assert_eq!(result.emotion, Emotion::Angry);
        assert_eq!(result.age, 25);
        assert_eq!(result.gender, Gender::Unknown);
    }

    #[test]
    fn test_both_missing_yields_full_defaults() {
        let result = aggregate(
            Some(&FACE),
            ClassifierOutcome::Unavailable,
            ClassifierOutcome::Unavailable,
        );
        assert_eq!(result, AttributeResult::defaults());
    }

    #[test]
    fn test_aggregate_deterministic() {
        let a = aggregate(
            Some(&FACE),
            ClassifierOutcome::Ok((Emotion::Fear, 0.44)),
            ClassifierOutcome::Failed,
        );
        let b = aggregate(
            Some(&FACE),
            ClassifierOutcome::Ok((Emotion::Fear, 0.44)),
            ClassifierOutcome::Failed,
        );
        assert_eq!(a, b);
    }
}
