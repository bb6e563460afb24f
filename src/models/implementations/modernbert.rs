//! ModernBERT with a sequence classification head.
//!
//! The encoder comes from `candle-transformers`. The head follows the Hugging
//! Face `ModernBertForSequenceClassification` layout:
//! - pooling over the CLS token, or a masked mean over all tokens
//! - a bias-free dense layer with GELU and a bias-free LayerNorm
//! - a linear classifier

use candle_core::{IndexOp, Result, Tensor, D};
use candle_nn::{layer_norm_no_bias, linear, linear_no_bias, LayerNorm, Linear, VarBuilder};
use candle_transformers::models::modernbert::{Config, ModernBert};

use crate::models::config::ClassifierPooling;

#[derive(Clone)]
struct ClassificationHead {
    dense: Linear,
    norm: LayerNorm,
    classifier: Linear,
    pooling: ClassifierPooling,
}

impl ClassificationHead {
    fn load(
        vb: VarBuilder,
        config: &Config,
        num_labels: usize,
        pooling: ClassifierPooling,
    ) -> Result<Self> {
        let dense = linear_no_bias(config.hidden_size, config.hidden_size, vb.pp("head.dense"))?;
        let norm =
            layer_norm_no_bias(config.hidden_size, config.layer_norm_eps, vb.pp("head.norm"))?;
        let classifier = linear(config.hidden_size, num_labels, vb.pp("classifier"))?;

        Ok(Self {
            dense,
            norm,
            classifier,
            pooling,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let pooled = match self.pooling {
            ClassifierPooling::Cls => hidden_states.i((.., 0, ..))?,
            ClassifierPooling::Mean => {
                let mask = attention_mask
                    .unsqueeze(D::Minus1)?
                    .to_dtype(hidden_states.dtype())?;
                let summed = hidden_states.broadcast_mul(&mask)?.sum(1)?;
                let counts = attention_mask
                    .sum_keepdim(1)?
                    .to_dtype(hidden_states.dtype())?;
                summed.broadcast_div(&counts)?
            }
        };

        pooled
            .apply(&self.dense)?
            .gelu_erf()?
            .apply(&self.norm)?
            .apply(&self.classifier)
    }
}

pub struct ModernBertForSequenceClassification {
    encoder: ModernBert,
    head: ClassificationHead,
}

impl ModernBertForSequenceClassification {
    pub fn load(
        vb: VarBuilder,
        config: &Config,
        num_labels: usize,
        pooling: ClassifierPooling,
    ) -> Result<Self> {
        let encoder = ModernBert::load(vb.clone(), config)?;
        let head = ClassificationHead::load(vb, config, num_labels, pooling)?;
        Ok(Self { encoder, head })
    }

    /// Logits with shape `(batch_size, num_labels)`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.encoder.forward(input_ids, attention_mask)?;
        self.head.forward(&hidden_states, attention_mask)
    }
}
