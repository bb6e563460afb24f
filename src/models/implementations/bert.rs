//! BERT with a sequence classification head.
//!
//! The encoder comes from `candle-transformers`; the head mirrors the
//! Hugging Face `BertForSequenceClassification` layout: a tanh pooler over the
//! first token followed by a linear classifier.

use candle_core::{IndexOp, Result, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};

pub struct BertForSequenceClassification {
    encoder: BertModel,
    pooler: Linear,
    classifier: Linear,
}

impl BertForSequenceClassification {
    pub fn load(
        vb: VarBuilder,
        config: &Config,
        hidden_size: usize,
        num_labels: usize,
    ) -> Result<Self> {
        let encoder = BertModel::load(vb.clone(), config)?;
        let pooler = linear(hidden_size, hidden_size, vb.pp("bert.pooler.dense"))?;
        let classifier = linear(hidden_size, num_labels, vb.pp("classifier"))?;
        Ok(Self {
            encoder,
            pooler,
            classifier,
        })
    }

    /// Logits with shape `(batch_size, num_labels)`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        let hidden_states = self
            .encoder
            .forward(input_ids, &token_type_ids, Some(attention_mask))?;

        let first_token = hidden_states.i((.., 0, ..))?;
        let pooled = self.pooler.forward(&first_token)?.tanh()?;
        self.classifier.forward(&pooled)
    }
}
