//! Encoder classifiers and the config they are built from.
//!
//! Only the classification heads live here; the BERT, DistilBERT, ModernBERT
//! and RoBERTa encoders are the `candle-transformers` implementations.

pub mod config;
pub mod implementations;
pub mod sentiment_classifier;

pub use config::{Architecture, ClassifierConfig, ClassifierPooling};
pub use sentiment_classifier::{ClassifierOptions, SentimentClassifierModel, SequenceClassifier};
