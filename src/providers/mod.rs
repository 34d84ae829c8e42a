//! Completion service implementations

pub mod openai;

// Re-export for convenience
pub use openai::OpenAiClient;

use async_trait::async_trait;

/// One text completion: persona + prompt in, reply text out.
///
/// Implementations report every failure as an `Err`; deciding what to do
/// about it is the adapter's job.
#[async_trait]
pub trait CompletionService: Send + Sync
{   async fn send(
      &self
    , system: &str
    , prompt: &str
    , options: &crate::CompletionOptions
    ) -> Result<String, crate::error::Error>;
}
