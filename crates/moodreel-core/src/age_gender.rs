//! Age/gender classifier adapter via ONNX Runtime.
//!
//! Wraps a pretrained dual-output model (128×128 grayscale input). The
//! output tensor schema is an explicit contract, validated when the model
//! is loaded:
//!
//!   output 0 — gender probability, shape `[[p]]`; round(p) == 1 → female
//!   output 1 — age estimate in years, shape `[[v]]`; rounded to an integer

use crate::region::AGE_GENDER_INPUT_SIZE;
use crate::types::Gender;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const GENDER_OUTPUT: usize = 0;
const AGE_OUTPUT: usize = 1;
const EXPECTED_OUTPUTS: usize = 2;
const INTRA_THREADS: usize = 2;

#[derive(Error, Debug)]
pub enum AgeGenderError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("model output schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Dual-output age/gender classifier.
pub struct AgeGenderClassifier {
    session: Session,
}

impl AgeGenderClassifier {
    /// Load the age/gender ONNX model from the given path.
    ///
    /// Validates the two-output schema at startup: output count from the
    /// session metadata, scalar shape by probing with a zero tensor.
    pub fn load(model_path: &str) -> Result<Self, AgeGenderError> {
        if !Path::new(model_path).exists() {
            return Err(AgeGenderError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(INTRA_THREADS)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded age/gender model"
        );

        let num_outputs = session.outputs().len();
        if num_outputs != EXPECTED_OUTPUTS {
            return Err(AgeGenderError::SchemaMismatch(format!(
                "age/gender model requires {EXPECTED_OUTPUTS} outputs (gender, age), got {num_outputs}"
            )));
        }

        let mut classifier = Self { session };

        let size = AGE_GENDER_INPUT_SIZE as usize;
        let probe = Array4::<f32>::zeros((1, size, size, 1));
        classifier.forward(&probe)?;

        Ok(classifier)
    }

    /// Classify the prepared 128×128 tensor into an age and gender.
    pub fn classify(&mut self, tensor: &Array4<f32>) -> Result<(u32, Gender), AgeGenderError> {
        let (gender_prob, age_value) = self.forward(tensor)?;
        Ok(interpret_outputs(gender_prob, age_value))
    }

    /// Run inference and pull the two scalars out per the output schema.
    fn forward(&mut self, tensor: &Array4<f32>) -> Result<(f32, f32), AgeGenderError> {
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(tensor.view())?])?;

        let (_, gender) = outputs[GENDER_OUTPUT]
            .try_extract_tensor::<f32>()
            .map_err(|e| AgeGenderError::InferenceFailed(format!("gender output: {e}")))?;
        let (_, age) = outputs[AGE_OUTPUT]
            .try_extract_tensor::<f32>()
            .map_err(|e| AgeGenderError::InferenceFailed(format!("age output: {e}")))?;

        let gender_prob = *gender.first().ok_or_else(|| {
            AgeGenderError::SchemaMismatch("gender output is empty".to_string())
        })?;
        let age_value = *age.first().ok_or_else(|| {
            AgeGenderError::SchemaMismatch("age output is empty".to_string())
        })?;

        Ok((gender_prob, age_value))
    }
}

/// Map the raw output scalars to an age and gender.
fn interpret_outputs(gender_prob: f32, age_value: f32) -> (u32, Gender) {
    let gender = if gender_prob.round() as i32 == 1 {
        Gender::Female
    } else {
        Gender::Male
    };
    let age = age_value.round().max(0.0) as u32;
    (age, gender)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_rounds_to_female() {
        assert_eq!(interpret_outputs(0.6, 30.0).1, Gender::Female);
        assert_eq!(interpret_outputs(1.0, 30.0).1, Gender::Female);
        // Rust rounds half away from zero.
        assert_eq!(interpret_outputs(0.5, 30.0).1, Gender::Female);
    }

    #[test]
    fn test_gender_rounds_to_male() {
        assert_eq!(interpret_outputs(0.4, 30.0).1, Gender::Male);
        assert_eq!(interpret_outputs(0.0, 30.0).1, Gender::Male);
    }

    #[test]
    fn test_age_rounds_to_nearest() {
        assert_eq!(interpret_outputs(0.0, 24.6).0, 25);
        assert_eq!(interpret_outputs(0.0, 24.4).0, 24);
    }

    #[test]
    fn test_negative_age_clamps_to_zero() {
        assert_eq!(interpret_outputs(0.0, -3.2).0, 0);
    }

    #[test]
    fn test_load_missing_model() {
        let result = AgeGenderClassifier::load("/nonexistent/age_gender.onnx");
        assert!(matches!(result, Err(AgeGenderError::ModelNotFound(_))));
    }
}
