use thiserror::Error;

/// Outcome of a rejected analysis request.
///
/// `EmptyInput` is an expected user error; the other variants are failures.
/// None of them are fatal for the session.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Model not loaded. Please check the model directory.")]
    ModelNotLoaded,

    #[error("Please enter a tweet to analyze.")]
    EmptyInput,

    /// The classifier raised, or returned an unusable score.
    #[error("Error during prediction: {0}")]
    Prediction(String),
}

impl AnalysisError {
    /// Whether the condition is an expected user error rather than a failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, AnalysisError::EmptyInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_message_carries_cause() {
        let err = AnalysisError::Prediction("shape mismatch".to_string());
        assert_eq!(err.to_string(), "Error during prediction: shape mismatch");
        assert!(!err.is_warning());
        assert!(AnalysisError::EmptyInput.is_warning());
        assert!(!AnalysisError::ModelNotLoaded.is_warning());
    }
}
