//! The analysis session: classify a tweet, remap its label, keep a history.
//!
//! Nothing here touches candle directly; the session only sees a
//! [`Classifier`], so it can run against any backend (or a stub in tests).

pub mod history;
pub mod labels;
pub mod session;

pub use history::{format_confidence, AnalysisRecord, History};
pub use labels::{LabelMap, Sentiment};
pub use session::{AnalysisSession, Classifier};
