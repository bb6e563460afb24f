//! DistilBERT with a sequence classification head.
//!
//! Weight names follow Hugging Face `DistilBertForSequenceClassification`:
//! the encoder under `distilbert`, then `pre_classifier` with ReLU and
//! `classifier` over the first token.

use candle_core::{IndexOp, Result, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};
use candle_transformers::models::distilbert::{Config, DistilBertModel};

pub struct DistilBertForSequenceClassification {
    encoder: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
}

impl DistilBertForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        let encoder = DistilBertModel::load(vb.pp("distilbert"), config)?;
        let pre_classifier = linear(config.dim, config.dim, vb.pp("pre_classifier"))?;
        let classifier = linear(config.dim, num_labels, vb.pp("classifier"))?;
        Ok(Self {
            encoder,
            pre_classifier,
            classifier,
        })
    }

    /// Logits with shape `(batch_size, num_labels)`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.encoder.forward(input_ids, &padding_mask(attention_mask)?)?;

        let first_token = hidden_states.i((.., 0, ..))?;
        let pooled = self.pre_classifier.forward(&first_token)?.relu()?;
        self.classifier.forward(&pooled)
    }
}

/// The candle encoder masks positions where the mask is set, the inverse of a
/// tokenizer attention mask. Shape `(batch, 1, 1, seq)` to broadcast over heads.
fn padding_mask(attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, seq_len) = attention_mask.dims2()?;
    attention_mask.eq(0u32)?.reshape((batch, 1, 1, seq_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn padding_mask_flags_padded_positions() {
        let mask = Tensor::new(&[[1u32, 1, 0]], &Device::Cpu).unwrap();
        let padding = padding_mask(&mask).unwrap();
        assert_eq!(padding.dims(), &[1, 1, 1, 3]);
        let flat = padding.flatten_all().unwrap().to_vec1::<u8>().unwrap();
        assert_eq!(flat, vec![0, 0, 1]);
    }
}
