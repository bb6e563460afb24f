//! RoBERTa and XLM-RoBERTa sequence classifiers.
//!
//! `candle-transformers` already ships the Hugging Face
//! `RobertaForSequenceClassification` layout (`roberta` encoder, then
//! `classifier.dense` with tanh and `classifier.out_proj`), so this only
//! adapts it to the shared `forward(input_ids, attention_mask)` shape.

use candle_core::{Result, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config, XLMRobertaForSequenceClassification};

pub struct RobertaForSequenceClassification {
    model: XLMRobertaForSequenceClassification,
}

impl RobertaForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        let model = XLMRobertaForSequenceClassification::new(num_labels, config, vb)?;
        Ok(Self { model })
    }

    /// Logits with shape `(batch_size, num_labels)`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        self.model.forward(input_ids, attention_mask, &token_type_ids)
    }
}
