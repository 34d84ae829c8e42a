//! Request-side types for a single completion

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::template::TemplateId;

/// A template identifier plus the text fragments bound into it.
///
/// Blank fragments never enter the map, so a template that needs one
/// fails binding instead of sending an empty section to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest
{   template: TemplateId
  , values: BTreeMap<String, String>
}

impl PromptRequest
{   pub fn new(template: TemplateId) -> Self
    {   PromptRequest
        {   template
          , values: BTreeMap::new()
        }
    }

    /// Bind a placeholder. The value is trimmed; blank values are dropped.
    pub fn with(
      mut self
    , name: &str
    , value: impl AsRef<str>
    ) -> Self
    {   let trimmed = value.as_ref().trim();
        if !trimmed.is_empty()
        {   self.values.insert(name.to_string(), trimmed.to_string());
        }
        self
    }

    pub fn template(&self) -> TemplateId
    {   self.template
    }

    pub fn value(&self, name: &str) -> Option<&str>
    {   self.values.get(name).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<String, String>
    {   &self.values
    }
}

/// Per-call knobs for the completion service
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions
{   /// Remote model identifier
    pub model: String
  , /// Max tokens to generate
    pub max_tokens: usize
  , /// Temperature for sampling
    pub temperature: f32
  , /// Total time the caller is willing to wait
    pub time_budget: Duration
}

impl CompletionOptions
{   pub fn new(
      model: &str
    , max_tokens: usize
    , temperature: f32
    ) -> Self
    {   CompletionOptions
        {   model: model.to_string()
          , max_tokens
          , temperature
          , time_budget: Duration::from_secs(
              crate::config::DEFAULT_TIMEOUT_SECS
            )
        }
    }

    pub fn with_budget(mut self, time_budget: Duration) -> Self
    {   self.time_budget = time_budget;
        self
    }
}

/// Join the non-blank fragments, trimmed, with `sep`.
pub fn join_fragments<I, S>(fragments: I, sep: &str) -> String
where I: IntoIterator<Item = S>
    , S: AsRef<str>
{   fragments
      .into_iter()
      .filter_map(|f| {
        let t = f.as_ref().trim();
        if t.is_empty() { None } else { Some(t.to_string()) }
      })
      .collect::<Vec<_>>()
      .join(sep)
}
