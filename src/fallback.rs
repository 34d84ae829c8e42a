//! Failure classification and the per-call time budget

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::error::Error;
use crate::FailureReason;

impl From<&Error> for FailureReason
{   fn from(e: &Error) -> Self
    {   match e
        {   Error::ApiError { status, .. } => {
              FailureReason::ServiceError(*status)
            }
          , Error::MissingApiKey(_) => FailureReason::ServiceError(401)
          , Error::EmptyResponse => FailureReason::EmptyResponse
          , Error::ParseError(_) => FailureReason::ParseError
          , Error::SchemaMismatch(_) => FailureReason::SchemaMismatch
          , Error::Timeout => FailureReason::Timeout
            // everything else failed before a response arrived
          , Error::HttpError(_)
          | Error::InvalidConfiguration(_)
          | Error::MissingPlaceholder { .. }
          | Error::Other(_) => FailureReason::NetworkError
        }
    }
}

/// Race `call` against `budget`. On expiry the call is dropped and
/// `Error::Timeout` returned; the remote side is not told.
pub async fn within_budget<F, T>(budget: Duration, call: F)
  -> Result<T, Error>
where F: Future<Output = Result<T, Error>>
{   match tokio::time::timeout(budget, call).await
    {   Ok(result) => result
      , Err(_) => {
          warn!("Completion exceeded budget of {:?}", budget);
          Err(Error::Timeout)
        }
    }
}

/// Log a fallback with its reason
pub fn note_fallback(template: &str, reason: FailureReason)
{   warn!("{} fell back to default: {}", template, reason);
    debug!("{} fallback reason detail: {:?}", template, reason);
}
