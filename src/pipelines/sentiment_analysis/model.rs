use tokenizers::Tokenizer;

use super::pipeline::SentimentResult;

#[allow(async_fn_in_trait)]
pub trait SentimentAnalysisModel {
    type Options: std::fmt::Debug + Clone;

    async fn new(options: Self::Options, device: candle_core::Device) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Arg-max raw label and its probability.
    fn predict(&self, tokenizer: &Tokenizer, text: &str) -> anyhow::Result<SentimentResult>;

    async fn get_tokenizer(options: Self::Options) -> anyhow::Result<Tokenizer>;

    fn device(&self) -> &candle_core::Device;
}
