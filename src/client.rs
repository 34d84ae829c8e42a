use serde::de::DeserializeOwned;
use log::{debug, trace};

use crate::error::Error;
use crate::extract::ExtractionSchema;
use crate::fallback::{note_fallback, within_budget};
use crate::providers::CompletionService;
use crate::request::{CompletionOptions, PromptRequest};
use crate::{CompletionResult, FailureReason};

/// Binds templates, calls the completion service once, and always
/// returns a schema-valid value.
///
/// Holds no per-call state; share it behind an `Arc`.
pub struct CompletionAdapter<S>
{   service: S
}

impl<S: CompletionService> CompletionAdapter<S>
{   pub fn new(service: S) -> Self
    {   CompletionAdapter { service }
    }

    pub fn service(&self) -> &S
    {   &self.service
    }

    /// Run one completion.
    ///
    /// Building → Invoking → Extracting → Ok | Fallback. The only `Err` is
    /// a template error, raised before any call is made. Transport
    /// failures, bad statuses, empty or malformed replies and an exhausted
    /// time budget all come back as `CompletionResult::Fallback` carrying
    /// `schema`'s default.
    pub async fn complete<T>(
      &self
    , request: PromptRequest
    , schema: ExtractionSchema<T>
    , options: &CompletionOptions
    ) -> Result<CompletionResult<T>, Error>
    where T: DeserializeOwned
    {   let template = request.template().template();
        let name = template.id.name();

        // Building
        let prompt = template.bind(&request)?;
        debug!("Invoking {} on {}", name, options.model);

        // Invoking
        let reply = within_budget(
          options.time_budget,
          self.service.send(template.system, &prompt, options)
        ).await;

        let text = match reply
        {   Ok(text) => text
          , Err(e) => {
              return Ok(fall_back(name, schema, FailureReason::from(&e)));
            }
        };
        trace!("{} raw reply: {}", name, text);

        // Extracting
        match schema.extract(&text)
        {   Ok(value) => {
              debug!("{} extracted", name);
              Ok(CompletionResult::Ok(value))
            }
          , Err(reason) => Ok(fall_back(name, schema, reason))
        }
    }
}

fn fall_back<T>(
  name: &str
, schema: ExtractionSchema<T>
, reason: FailureReason
) -> CompletionResult<T>
{   note_fallback(name, reason);
    CompletionResult::Fallback(schema.into_default(), reason)
}
