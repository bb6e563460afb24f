use crate::core::AnalysisError;
use crate::pipelines::sentiment_analysis::SentimentResult;

use super::history::{AnalysisRecord, History};
use super::labels::LabelMap;

/// Anything that turns text into a raw label and a probability.
pub trait Classifier {
    fn classify(&self, text: &str) -> anyhow::Result<SentimentResult>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&self, text: &str) -> anyhow::Result<SentimentResult> {
        (**self).classify(text)
    }
}

/// One interactive session: an optional classifier, label remapping and the
/// history of successful analyses.
///
/// The classifier is optional because a failed model load is reported once
/// and the session keeps running; every analysis then fails with
/// [`AnalysisError::ModelNotLoaded`].
pub struct AnalysisSession<C> {
    classifier: Option<C>,
    labels: LabelMap,
    history: History,
}

impl<C: Classifier> AnalysisSession<C> {
    pub fn new(classifier: Option<C>, labels: LabelMap) -> Self {
        Self {
            classifier,
            labels,
            history: History::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.classifier.is_some()
    }

    /// Classify `text` and append the result to the history.
    ///
    /// On any error the history is left unchanged.
    pub fn analyze(&mut self, text: &str) -> Result<&AnalysisRecord, AnalysisError> {
        let classifier = self.classifier.as_ref().ok_or(AnalysisError::ModelNotLoaded)?;

        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let result = classifier.classify(text).map_err(|e| {
            tracing::debug!(error = %e, "prediction failed");
            AnalysisError::Prediction(format!("{e:#}"))
        })?;

        if !result.score.is_finite() {
            return Err(AnalysisError::Prediction(format!(
                "classifier returned a non-finite score for {}",
                result.label
            )));
        }

        let record = AnalysisRecord {
            tweet: text.to_string(),
            sentiment: self.labels.resolve(&result.label),
            confidence: result.score.clamp(0.0, 1.0),
        };
        tracing::debug!(raw = %result.label, sentiment = %record.sentiment, "analysis recorded");

        Ok(self.history.append(record))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::app::Sentiment;

    struct Fixed(&'static str, f32);

    impl Classifier for Fixed {
        fn classify(&self, _text: &str) -> anyhow::Result<SentimentResult> {
            Ok(SentimentResult {
                label: self.0.to_string(),
                score: self.1,
            })
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn classify(&self, _text: &str) -> anyhow::Result<SentimentResult> {
            Err(anyhow::anyhow!("shape mismatch"))
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn session(label: &'static str, score: f32) -> AnalysisSession<Fixed> {
        AnalysisSession::new(Some(Fixed(label, score)), LabelMap::default())
    }

    #[test]
    fn keeps_the_tweet_as_entered() {
        let mut session = session("LABEL_2", 0.91);
        let record = session.analyze("  Great crew!  ").unwrap();
        assert_eq!(record.tweet, "  Great crew!  ");
        assert_eq!(record.sentiment, Sentiment::Positive);
    }

    #[test]
    fn clamps_rounding_noise() {
        let mut session = session("LABEL_0", 1.000_000_1);
        assert_eq!(session.analyze("late again").unwrap().confidence, 1.0);
    }

    #[test]
    fn rejects_nan_scores() {
        let mut session = session("LABEL_0", f32::NAN);
        assert!(matches!(session.analyze("late again"), Err(AnalysisError::Prediction(_))));
        assert!(session.history().is_empty());
    }

    #[test]
    fn missing_model_is_checked_before_input() {
        let mut session: AnalysisSession<Fixed> = AnalysisSession::new(None, LabelMap::default());
        assert!(!session.is_ready());
        assert!(matches!(session.analyze(""), Err(AnalysisError::ModelNotLoaded)));
    }

    #[test]
    fn prediction_failure_is_reported_once() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
            .with_writer(move || writer.clone())
            .finish();

        let mut session = AnalysisSession::new(Some(Broken), LabelMap::default());
        let outcome = tracing::subscriber::with_default(subscriber, || {
            session.analyze("late again").map(|_| ())
        });

        let err = outcome.unwrap_err();
        assert_eq!(err.to_string(), "Error during prediction: shape mismatch");
        assert!(captured.0.lock().unwrap().is_empty());
        assert!(session.history().is_empty());
    }
}
