pub mod app;
pub mod core;
mod loaders;
pub mod models;
pub mod pipelines;

// Re-export core types
pub use self::core::{AnalysisError, Settings};

pub use app::{
    format_confidence, AnalysisRecord, AnalysisSession, Classifier, History, LabelMap, Sentiment,
};
pub use loaders::{ModelFiles, ModelSource};
