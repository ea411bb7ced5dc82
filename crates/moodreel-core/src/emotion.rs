//! Emotion classifier adapter via ONNX Runtime.
//!
//! Wraps a pretrained 7-class facial-expression model (48×48 grayscale
//! input) and maps its probability vector to a label and confidence.

use crate::region::EMOTION_INPUT_SIZE;
use crate::types::Emotion;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

/// Fixed class order of the categorical output.
const EMOTION_CLASSES: [Emotion; 7] = [
    Emotion::Angry,
    Emotion::Disgust,
    Emotion::Fear,
    Emotion::Happy,
    Emotion::Neutral,
    Emotion::Sad,
    Emotion::Surprise,
];

const INTRA_THREADS: usize = 2;

#[derive(Error, Debug)]
pub enum EmotionError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("model output schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Categorical emotion classifier.
pub struct EmotionClassifier {
    session: Session,
}

impl EmotionClassifier {
    /// Load the emotion ONNX model from the given path.
    ///
    /// The output schema is probed with a zero tensor so a wrong class
    /// count fails at startup rather than on the first request.
    pub fn load(model_path: &str) -> Result<Self, EmotionError> {
        if !Path::new(model_path).exists() {
            return Err(EmotionError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(INTRA_THREADS)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded emotion model"
        );

        let num_outputs = session.outputs().len();
        if num_outputs != 1 {
            return Err(EmotionError::SchemaMismatch(format!(
                "emotion model requires 1 output, got {num_outputs}"
            )));
        }

        let mut classifier = Self { session };

        let size = EMOTION_INPUT_SIZE as usize;
        let probe = Array4::<f32>::zeros((1, size, size, 1));
        let probs = classifier.forward(&probe)?;
        if probs.len() != EMOTION_CLASSES.len() {
            return Err(EmotionError::SchemaMismatch(format!(
                "expected {} class probabilities, got {}",
                EMOTION_CLASSES.len(),
                probs.len()
            )));
        }

        Ok(classifier)
    }

    /// Classify the prepared 48×48 tensor into an emotion label and the
    /// probability of that label.
    pub fn classify(&mut self, tensor: &Array4<f32>) -> Result<(Emotion, f32), EmotionError> {
        let probs = self.forward(tensor)?;
        if probs.len() != EMOTION_CLASSES.len() {
            return Err(EmotionError::SchemaMismatch(format!(
                "expected {} class probabilities, got {}",
                EMOTION_CLASSES.len(),
                probs.len()
            )));
        }

        let (idx, confidence) = argmax(&probs).ok_or_else(|| {
            EmotionError::SchemaMismatch("empty probability vector".to_string())
        })?;

        Ok((EMOTION_CLASSES[idx], confidence))
    }

    fn forward(&mut self, tensor: &Array4<f32>) -> Result<Vec<f32>, EmotionError> {
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(tensor.view())?])?;

        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmotionError::InferenceFailed(format!("probability vector: {e}")))?;

        Ok(data.to_vec())
    }
}

/// Index and value of the maximum entry.
fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_maximum() {
        let probs = [0.1, 0.05, 0.6, 0.1, 0.05, 0.05, 0.05];
        assert_eq!(argmax(&probs), Some((2, 0.6)));
    }

    #[test]
    fn test_argmax_empty() {
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_class_order_matches_training_labels() {
        // The model was trained with this exact class order; index 3 must
        // stay "happy" and index 6 "surprise".
        assert_eq!(EMOTION_CLASSES[0], Emotion::Angry);
        assert_eq!(EMOTION_CLASSES[3], Emotion::Happy);
        assert_eq!(EMOTION_CLASSES[4], Emotion::Neutral);
        assert_eq!(EMOTION_CLASSES[6], Emotion::Surprise);
    }

    #[test]
    fn test_argmax_maps_to_label() {
        let mut probs = [0.0f32; 7];
        probs[5] = 0.9;
        let (idx, confidence) = argmax(&probs).unwrap();
        assert_eq!(EMOTION_CLASSES[idx], Emotion::Sad);
        assert!((confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_model() {
        let result = EmotionClassifier::load("/nonexistent/emotion.onnx");
        assert!(matches!(result, Err(EmotionError::ModelNotFound(_))));
    }
}
