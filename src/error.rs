use std::fmt;

/// Custom error type for dearai operations
/// Implements Clone so results can be handed between tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Template references a placeholder the request did not bind
    MissingPlaceholder
    {   template: String
      , placeholder: String
    }
  , /// API key is missing for the completion service
    MissingApiKey(String)
  , /// HTTP transport error (connect, reset, DNS...)
    HttpError(String)
  , /// Completion service answered with a non-success status
    ApiError
    {   status: u16
      , body: String
    }
  , /// Failed to parse a reply
    ParseError(String)
  , /// Reply carried no usable text
    EmptyResponse
  , /// Reply parsed but did not have the expected shape
    SchemaMismatch(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Per-call time budget exhausted
    Timeout
  , /// Generic error
    Other(String)
}

impl Error
{   /// Template errors are programming errors and are never absorbed
    /// into a fallback.
    pub fn is_template_error(&self) -> bool
    {   matches!(self, Error::MissingPlaceholder { .. })
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingPlaceholder { template, placeholder } => {
              write!(f,
                "Template {} requires placeholder: {}",
                template, placeholder
              )
            }
          , Error::MissingApiKey(service) => {
              write!(f, "Missing API key for: {}", service)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError { status, body } => {
              write!(f, "API error ({}): {}", status, body)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::EmptyResponse => {
              write!(f, "Completion reply was empty")
            }
          , Error::SchemaMismatch(msg) => {
              write!(f, "Schema mismatch: {}", msg)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::ParseError(e.to_string())
    }
}
