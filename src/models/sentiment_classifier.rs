//! Fine-tuned encoder classifiers behind the sentiment pipeline.

use std::sync::Arc;

use anyhow::Context;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{ops::softmax, VarBuilder};
use tokenizers::Tokenizer;

use super::config::{Architecture, ClassifierConfig};
use super::implementations::{
    BertForSequenceClassification, DistilBertForSequenceClassification,
    ModernBertForSequenceClassification, RobertaForSequenceClassification,
};
use crate::core::ModelOptions;
use crate::loaders::{load_tokenizer, ModelFiles, ModelSource};
use crate::pipelines::sentiment_analysis::{SentimentAnalysisModel, SentimentResult};

/// Weights are loaded in f32 whatever dtype the checkpoint stores.
const DTYPE: DType = DType::F32;

pub enum SequenceClassifier {
    Bert(BertForSequenceClassification),
    DistilBert(DistilBertForSequenceClassification),
    ModernBert(ModernBertForSequenceClassification),
    Roberta(RobertaForSequenceClassification),
}

impl SequenceClassifier {
    pub fn load(
        config_json: &str,
        config: &ClassifierConfig,
        vb: VarBuilder,
    ) -> anyhow::Result<Self> {
        let num_labels = config.num_labels();
        let classifier = match config.architecture {
            Architecture::Bert => {
                let encoder_config: candle_transformers::models::bert::Config =
                    serde_json::from_str(config_json).context("Failed to parse BERT config")?;
                SequenceClassifier::Bert(BertForSequenceClassification::load(
                    vb,
                    &encoder_config,
                    config.hidden_size,
                    num_labels,
                )?)
            }
            Architecture::DistilBert => {
                let encoder_config: candle_transformers::models::distilbert::Config =
                    serde_json::from_str(config_json).context("Failed to parse DistilBERT config")?;
                SequenceClassifier::DistilBert(DistilBertForSequenceClassification::load(
                    vb,
                    &encoder_config,
                    num_labels,
                )?)
            }
            Architecture::ModernBert => {
                let encoder_config: candle_transformers::models::modernbert::Config =
                    serde_json::from_str(config_json).context("Failed to parse ModernBERT config")?;
                SequenceClassifier::ModernBert(ModernBertForSequenceClassification::load(
                    vb,
                    &encoder_config,
                    num_labels,
                    config.pooling,
                )?)
            }
            Architecture::Roberta => {
                let encoder_config: candle_transformers::models::xlm_roberta::Config =
                    serde_json::from_str(config_json).context("Failed to parse RoBERTa config")?;
                SequenceClassifier::Roberta(RobertaForSequenceClassification::load(
                    vb,
                    &encoder_config,
                    num_labels,
                )?)
            }
        };
        Ok(classifier)
    }

    /// Logits with shape `(batch_size, num_labels)`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor> {
        match self {
            SequenceClassifier::Bert(model) => model.forward(input_ids, attention_mask),
            SequenceClassifier::DistilBert(model) => model.forward(input_ids, attention_mask),
            SequenceClassifier::ModernBert(model) => model.forward(input_ids, attention_mask),
            SequenceClassifier::Roberta(model) => model.forward(input_ids, attention_mask),
        }
    }
}

/// What to load: a model source plus the tokenizer truncation length.
#[derive(Debug, Clone)]
pub struct ClassifierOptions {
    pub source: ModelSource,
    pub max_length: usize,
}

impl ClassifierOptions {
    pub fn new(source: ModelSource, max_length: usize) -> Self {
        Self { source, max_length }
    }
}

impl ModelOptions for ClassifierOptions {
    // Truncation only affects the tokenizer, so the weights are shared.
    fn cache_key(&self) -> String {
        self.source.cache_key()
    }
}

/// A loaded sentiment classifier. Clones share the weights.
#[derive(Clone)]
pub struct SentimentClassifierModel {
    classifier: Arc<SequenceClassifier>,
    labels: Arc<[String]>,
    device: Device,
}

impl SentimentClassifierModel {
    pub fn load(files: &ModelFiles, device: Device) -> anyhow::Result<Self> {
        let config_json = std::fs::read_to_string(&files.config)
            .with_context(|| format!("Failed to read config file {}", files.config.display()))?;
        let config = ClassifierConfig::from_json(&config_json)
            .with_context(|| format!("Invalid model config {}", files.config.display()))?;

        let vb = var_builder(&files.weights, &device)?;
        let classifier = SequenceClassifier::load(&config_json, &config, vb)?;

        tracing::info!(
            architecture = ?config.architecture,
            labels = ?config.labels,
            device = ?device.location(),
            "classifier loaded"
        );

        Ok(Self {
            classifier: Arc::new(classifier),
            labels: config.labels.into(),
            device,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn predict(&self, tokenizer: &Tokenizer, text: &str) -> anyhow::Result<SentimentResult> {
        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization error: {e}"))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let logits = self.classifier.forward(&input_ids, &attention_mask)?;
        let probabilities = softmax(&logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;

        let result = pick_label(&probabilities, &self.labels)?;
        tracing::debug!(
            label = %result.label,
            score = result.score,
            tokens = encoding.len(),
            "classified"
        );
        Ok(result)
    }
}

fn var_builder(weights: &std::path::Path, device: &Device) -> anyhow::Result<VarBuilder<'static>> {
    let vb = match weights.extension().and_then(|ext| ext.to_str()) {
        // SAFETY: the weights file is not modified while mapped.
        Some("safetensors") => unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], DTYPE, device)?
        },
        Some("bin") => VarBuilder::from_pth(weights, DTYPE, device)?,
        _ => anyhow::bail!("Unsupported weight file format: {}", weights.display()),
    };
    Ok(vb)
}

/// Arg-max over class probabilities.
pub fn pick_label(probabilities: &[f32], labels: &[String]) -> anyhow::Result<SentimentResult> {
    if probabilities.len() != labels.len() {
        anyhow::bail!(
            "Model returned {} scores for {} labels",
            probabilities.len(),
            labels.len()
        );
    }

    let (index, score) = probabilities
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .ok_or_else(|| anyhow::anyhow!("Model returned no scores"))?;

    Ok(SentimentResult {
        label: labels[index].clone(),
        score,
    })
}

impl SentimentAnalysisModel for SentimentClassifierModel {
    type Options = ClassifierOptions;

    async fn new(options: Self::Options, device: Device) -> anyhow::Result<Self> {
        let files = ModelFiles::resolve(&options.source).await?;
        Self::load(&files, device)
    }

    fn predict(&self, tokenizer: &Tokenizer, text: &str) -> anyhow::Result<SentimentResult> {
        self.predict(tokenizer, text)
    }

    async fn get_tokenizer(options: Self::Options) -> anyhow::Result<Tokenizer> {
        let files = ModelFiles::resolve(&options.source).await?;
        load_tokenizer(&files.tokenizer, options.max_length)
    }

    fn device(&self) -> &Device {
        self.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        ["LABEL_0", "LABEL_1", "LABEL_2"].map(String::from).to_vec()
    }

    #[test]
    fn picks_highest_probability() {
        let result = pick_label(&[0.1, 0.2, 0.7], &labels()).unwrap();
        assert_eq!(result.label, "LABEL_2");
        assert!((result.score - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn mismatched_label_count_is_an_error() {
        assert!(pick_label(&[0.5, 0.5], &labels()).is_err());
        assert!(pick_label(&[], &[]).is_err());
    }

    #[test]
    fn cache_key_ignores_truncation() {
        let source: ModelSource = "hf:org/airline".parse().unwrap();
        let short = ClassifierOptions::new(source.clone(), 64);
        let long = ClassifierOptions::new(source, 512);
        assert_eq!(short.cache_key(), long.cache_key());
    }
}
