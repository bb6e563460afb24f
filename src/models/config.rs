//! The parts of a Hugging Face `config.json` the classification heads need.
//!
//! The encoder configs themselves are parsed by `candle-transformers`; this
//! only pulls out the architecture name and the label table.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierPooling {
    #[default]
    Cls,
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Bert,
    DistilBert,
    ModernBert,
    /// RoBERTa and XLM-RoBERTa share one layout.
    Roberta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub architecture: Architecture,
    pub hidden_size: usize,
    /// Raw label names indexed by class id.
    pub labels: Vec<String>,
    pub pooling: ClassifierPooling,
}

#[derive(Deserialize)]
struct RawConfig {
    model_type: Option<String>,
    #[serde(alias = "dim")]
    hidden_size: usize,
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    classifier_pooling: Option<ClassifierPooling>,
}

impl ClassifierConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid model config {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let raw: RawConfig = serde_json::from_str(content)?;

        let architecture = match raw.model_type.as_deref() {
            Some("bert") => Architecture::Bert,
            Some("distilbert") => Architecture::DistilBert,
            Some("modernbert") => Architecture::ModernBert,
            Some("roberta" | "xlm-roberta") => Architecture::Roberta,
            Some(other) => anyhow::bail!(
                "Unsupported model_type `{other}` (expected bert, distilbert, modernbert, roberta or xlm-roberta)"
            ),
            None => anyhow::bail!("config.json has no model_type"),
        };

        Ok(Self {
            architecture,
            hidden_size: raw.hidden_size,
            labels: ordered_labels(raw.id2label)?,
            pooling: raw.classifier_pooling.unwrap_or_default(),
        })
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }
}

/// `id2label` keys must be exactly `0..n`.
fn ordered_labels(id2label: HashMap<String, String>) -> anyhow::Result<Vec<String>> {
    if id2label.is_empty() {
        anyhow::bail!("config.json has no id2label, not a classification model");
    }

    let mut indexed = id2label
        .into_iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|id| (id, label))
                .with_context(|| format!("Non-numeric label id `{id}`"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    indexed.sort_by_key(|(id, _)| *id);

    for (expected, (id, _)) in indexed.iter().enumerate() {
        if *id != expected {
            anyhow::bail!("Label ids are not contiguous: missing id {expected}");
        }
    }

    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_labels_by_numeric_id() {
        let config = ClassifierConfig::from_json(
            r#"{
                "model_type": "bert",
                "hidden_size": 768,
                "id2label": {"10": "K", "2": "LABEL_2", "0": "LABEL_0", "1": "LABEL_1",
                             "3": "D", "4": "E", "5": "F", "6": "G", "7": "H", "8": "I", "9": "J"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.architecture, Architecture::Bert);
        assert_eq!(config.num_labels(), 11);
        assert_eq!(config.labels[0], "LABEL_0");
        assert_eq!(config.labels[2], "LABEL_2");
        assert_eq!(config.labels[10], "K");
        assert_eq!(config.pooling, ClassifierPooling::Cls);
    }

    #[test]
    fn reads_modernbert_pooling() {
        let config = ClassifierConfig::from_json(
            r#"{"model_type": "modernbert", "hidden_size": 768, "classifier_pooling": "mean",
                "id2label": {"0": "negative", "1": "positive"}}"#,
        )
        .unwrap();
        assert_eq!(config.architecture, Architecture::ModernBert);
        assert_eq!(config.pooling, ClassifierPooling::Mean);
    }

    #[test]
    fn accepts_distilbert_and_roberta_fine_tunes() {
        let distilbert = ClassifierConfig::from_json(
            r#"{"model_type": "distilbert", "dim": 768, "n_layers": 6,
                "id2label": {"0": "LABEL_0", "1": "LABEL_1", "2": "LABEL_2"}}"#,
        )
        .unwrap();
        assert_eq!(distilbert.architecture, Architecture::DistilBert);
        assert_eq!(distilbert.hidden_size, 768);
        assert_eq!(distilbert.num_labels(), 3);

        for model_type in ["roberta", "xlm-roberta"] {
            let roberta = ClassifierConfig::from_json(&format!(
                r#"{{"model_type": "{model_type}", "hidden_size": 768,
                    "id2label": {{"0": "negative", "1": "neutral", "2": "positive"}}}}"#
            ))
            .unwrap();
            assert_eq!(roberta.architecture, Architecture::Roberta);
            assert_eq!(roberta.labels, vec!["negative", "neutral", "positive"]);
        }
    }

    #[test]
    fn rejects_unsupported_or_unlabelled_models() {
        let err = ClassifierConfig::from_json(
            r#"{"model_type": "gpt2", "hidden_size": 768, "id2label": {"0": "a"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("gpt2"));

        assert!(
            ClassifierConfig::from_json(r#"{"model_type": "bert", "hidden_size": 768}"#).is_err()
        );
        assert!(ClassifierConfig::from_json(
            r#"{"model_type": "bert", "hidden_size": 768, "id2label": {"0": "a", "2": "c"}}"#
        )
        .is_err());
    }
}
