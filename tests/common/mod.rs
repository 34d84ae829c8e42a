use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use dearai::error::Error;
use dearai::{CompletionOptions, CompletionService};

/// Completion service that answers from a script and counts calls
pub struct Scripted
{   reply: Result<String, Error>
  , delay: Option<Duration>
  , calls: AtomicUsize
  , prompts: Mutex<Vec<(String, String)>>
}

impl Scripted
{   pub fn replying(text: &str) -> Self
    {   Self::with(Ok(text.to_string()))
    }

    pub fn failing(e: Error) -> Self
    {   Self::with(Err(e))
    }

    pub fn with(reply: Result<String, Error>) -> Self
    {   Scripted
        {   reply
          , delay: None
          , calls: AtomicUsize::new(0)
          , prompts: Mutex::new(Vec::new())
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self
    {   self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize
    {   self.calls.load(Ordering::SeqCst)
    }

    /// (system, prompt) pairs seen so far
    pub fn prompts(&self) -> Vec<(String, String)>
    {   self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for Scripted
{   async fn send(
      &self
    , system: &str
    , prompt: &str
    , _options: &CompletionOptions
    ) -> Result<String, Error>
    {   self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
          .lock()
          .unwrap()
          .push((system.to_string(), prompt.to_string()));
        if let Some(delay) = self.delay
        {   tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}
