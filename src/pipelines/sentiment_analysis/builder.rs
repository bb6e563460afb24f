use super::model::SentimentAnalysisModel;
use super::pipeline::SentimentAnalysisPipeline;
use crate::core::{global_cache, DeviceSetting, ModelOptions};
use crate::loaders::ModelSource;
use crate::models::{ClassifierOptions, SentimentClassifierModel};
use crate::pipelines::utils::{build_cache_key, DeviceRequest, DeviceSelectable};

pub struct SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel> {
    options: M::Options,
    device_request: DeviceRequest,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
        }
    }

    /// Apply a configured device setting.
    pub fn device_setting(mut self, setting: DeviceSetting) -> Self {
        self.device_request = DeviceRequest::from(setting);
        self
    }

    /// Load the model (once per process and device) and its tokenizer.
    pub async fn build(self) -> anyhow::Result<SentimentAnalysisPipeline<M>>
    where
        M: Clone + Send + Sync + 'static,
        M::Options: ModelOptions,
    {
        let device = self.device_request.resolve()?;
        let key = build_cache_key(&self.options, &device);
        tracing::info!(
            model = ?self.options,
            device = ?device.location(),
            "building sentiment pipeline"
        );

        let model = global_cache()
            .get_or_load(&key, || M::new(self.options.clone(), device.clone()))
            .await?;
        let tokenizer = M::get_tokenizer(self.options).await?;
        Ok(SentimentAnalysisPipeline { model, tokenizer })
    }
}

impl<M: SentimentAnalysisModel> DeviceSelectable for SentimentAnalysisPipelineBuilder<M> {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}

impl SentimentAnalysisPipelineBuilder<SentimentClassifierModel> {
    /// A fine-tuned BERT or ModernBERT classifier, truncating at 512 tokens.
    pub fn fine_tuned(source: ModelSource) -> Self {
        Self::new(ClassifierOptions::new(
            source,
            crate::core::config::DEFAULT_MAX_LENGTH,
        ))
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.options.max_length = max_length;
        self
    }
}
