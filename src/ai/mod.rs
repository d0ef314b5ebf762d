mod gateway;
mod openai;

use async_trait::async_trait;

use crate::error::Result;

pub use gateway::LlmGateway;
pub use openai::OpenAiBackend;

#[cfg(test)]
pub(crate) use gateway::tests::StubBackend;

/// A chat model that answers with JSON text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete_json(&self, system: &str, prompt: &str) -> Result<String>;

    fn model(&self) -> &str;
}
