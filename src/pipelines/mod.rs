pub mod sentiment_analysis;
pub mod utils;

pub use sentiment_analysis::*;
