//! Response-generation trait

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::ProviderError;

/// Options for a single generation call
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub cancel: CancellationToken,
}

/// Response-generation provider
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produce a reply for the caller's transcript
    async fn generate(&self, prompt: &str, options: &GenerateOptions)
        -> Result<String, ProviderError>;

    fn name(&self) -> &'static str;
}
