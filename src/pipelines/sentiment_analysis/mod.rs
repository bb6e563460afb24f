//! Sentiment analysis pipeline: text in, raw model label and confidence out.
//!
//! - [`SentimentAnalysisPipeline`] - a loaded model plus its tokenizer
//! - [`SentimentAnalysisPipelineBuilder`] - model source and device selection
//! - [`SentimentAnalysisModel`] - what a model backend must provide
//!
//! ```rust,no_run
//! use airline_sentiment::pipelines::sentiment_analysis::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pipeline = SentimentAnalysisPipelineBuilder::fine_tuned("fine-tuned-airline-model".parse()?)
//!     .cpu()
//!     .build()
//!     .await?;
//!
//! let result = pipeline.predict("Crew was amazing!")?;
//! println!("{} ({:.2})", result.label, result.score);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod model;
pub mod pipeline;

pub use builder::SentimentAnalysisPipelineBuilder;
pub use model::SentimentAnalysisModel;
pub use pipeline::{SentimentAnalysisPipeline, SentimentResult};

pub use crate::models::{ClassifierOptions, SentimentClassifierModel};
pub use crate::pipelines::utils::DeviceSelectable;
