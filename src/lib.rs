pub mod error;
pub mod config;
pub mod template;
pub mod request;
pub mod extract;
pub mod fallback;
pub mod providers;
pub mod client;
pub mod endpoints;

use serde::{Deserialize, Serialize};

pub use client::CompletionAdapter;
pub use extract::{ExtractionSchema, Field, FieldKind, Shape};
pub use providers::{CompletionService, OpenAiClient};
pub use request::{CompletionOptions, PromptRequest};
pub use template::TemplateId;

/*

dearai: the AI side of a reflective letter-writing app.

Every AI-backed endpoint talks to the model the same way: bind a prompt
template, make one call, read a typed value out of whatever text comes
back, and hand the caller a usable value even when the call or the
reading fails.

dearai/
├── src/
│   ├── lib.rs          # Result types, re-exports
│   ├── error.rs        # Error enum
│   ├── config.rs       # Environment configuration
│   ├── template.rs     # Named prompt templates, binding
│   ├── request.rs      # PromptRequest, CompletionOptions
│   ├── extract.rs      # ExtractionSchema, fence stripping, validation
│   ├── fallback.rs     # Failure classification, time budget
│   ├── client.rs       # CompletionAdapter::complete
│   ├── providers/      # CompletionService trait + OpenAI client
│   ├── endpoints/      # HTTP handlers, one file per endpoint
│   └── main.rs         # Server binary
└── tests/

*/

/// DEARAI STRUCTURES:

/// Why a completion fell back to its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason
{   /// Transport failure before any HTTP response
    NetworkError
  , /// Service answered with a non-success status
    ServiceError(u16)
  , /// Service answered with no usable text
    EmptyResponse
  , /// Reply was not parseable in the expected shape
    ParseError
  , /// Reply parsed but lacked required fields or had wrong types
    SchemaMismatch
  , /// Time budget elapsed before the service answered
    Timeout
}

impl std::fmt::Display for FailureReason
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   match self
        {   FailureReason::NetworkError => write!(f, "network error")
          , FailureReason::ServiceError(status) => {
              write!(f, "service error ({})", status)
            }
          , FailureReason::EmptyResponse => write!(f, "empty response")
          , FailureReason::ParseError => write!(f, "parse error")
          , FailureReason::SchemaMismatch => write!(f, "schema mismatch")
          , FailureReason::Timeout => write!(f, "timeout")
        }
    }
}

/// Outcome of one completion. Both variants carry a schema-valid value.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionResult<T>
{   Ok(T)
  , Fallback(T, FailureReason)
}

impl<T> CompletionResult<T>
{   pub fn value(&self) -> &T
    {   match self
        {   CompletionResult::Ok(v) => v
          , CompletionResult::Fallback(v, _) => v
        }
    }

    pub fn into_value(self) -> T
    {   match self
        {   CompletionResult::Ok(v) => v
          , CompletionResult::Fallback(v, _) => v
        }
    }

    pub fn reason(&self) -> Option<FailureReason>
    {   match self
        {   CompletionResult::Ok(_) => None
          , CompletionResult::Fallback(_, reason) => Some(*reason)
        }
    }

    pub fn is_fallback(&self) -> bool
    {   matches!(self, CompletionResult::Fallback(..))
    }

    pub fn map<U, F>(self, f: F) -> CompletionResult<U>
    where F: FnOnce(T) -> U
    {   match self
        {   CompletionResult::Ok(v) => CompletionResult::Ok(f(v))
          , CompletionResult::Fallback(v, reason) => {
              CompletionResult::Fallback(f(v), reason)
            }
        }
    }
}
