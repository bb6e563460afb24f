use serde::Serialize;
use tokenizers::Tokenizer;

use super::model::SentimentAnalysisModel;
use crate::app::Classifier;

/// Raw classifier output, before label remapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    /// The model's `id2label` entry, e.g. `LABEL_2`.
    pub label: String,
    pub score: f32,
}

pub struct SentimentAnalysisPipeline<M: SentimentAnalysisModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipeline<M> {
    pub fn predict(&self, text: &str) -> anyhow::Result<SentimentResult> {
        self.model.predict(&self.tokenizer, text)
    }

    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}

impl<M: SentimentAnalysisModel> Classifier for SentimentAnalysisPipeline<M> {
    fn classify(&self, text: &str) -> anyhow::Result<SentimentResult> {
        self.predict(text)
    }
}
