//! HTTP surface: one module per AI-backed endpoint.
//!
//! Every endpoint accepts only POST with a camelCase JSON body. What a
//! failed generation turns into is the endpoint's [`FallbackPolicy`].

pub mod keywords;
pub mod questions;
pub mod response_letter;
pub mod solutions;
pub mod summary;
pub mod emotion;
pub mod blame;
pub mod strength_keywords;
pub mod reflection_hints;
pub mod ai_solutions;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::client::CompletionAdapter;
use crate::error::Error;
use crate::extract::ExtractionSchema;
use crate::providers::CompletionService;
use crate::request::{CompletionOptions, PromptRequest};
use crate::template::TemplateId;
use crate::{CompletionResult, FailureReason};

/// What a fallback result becomes at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy
{   /// Answer 200 with the default payload
    Serve
  , /// Answer 500; the default is never shown
    Surface
  , /// Answer 200 with the default when the reply was unusable, 500 when
    /// no reply arrived at all
    ServeUnusable
}

impl FallbackPolicy
{   /// Whether a fallback for `reason` is answered with the default
    pub fn serves(self, reason: FailureReason) -> bool
    {   match self
        {   FallbackPolicy::Serve => true
          , FallbackPolicy::Surface => false
          , FallbackPolicy::ServeUnusable => matches!(
              reason,
              FailureReason::EmptyResponse
              | FailureReason::ParseError
              | FailureReason::SchemaMismatch
            )
        }
    }
}

/// What an endpoint made of its request body
pub enum Prepared<T>
{   /// Bound request, ready to send
    Call(PromptRequest, ExtractionSchema<T>)
  , /// Nothing worth asking about; answer with the default directly
    Skip(TemplateId, ExtractionSchema<T>)
}

/// Fixed per-endpoint model settings
#[derive(Debug, Clone, Copy)]
pub struct EndpointSpec
{   pub model: &'static str
  , pub max_tokens: usize
  , pub temperature: f32
  , pub policy: FallbackPolicy
  , /// Shown to the user when a `Surface` endpoint fails
    pub failure_message: &'static str
}

/// Shared handler state
pub struct AppState<S>
{   pub adapter: CompletionAdapter<S>
  , pub budget: Duration
}

impl<S: CompletionService> AppState<S>
{   pub fn new(service: S, budget: Duration) -> Self
    {   AppState
        {   adapter: CompletionAdapter::new(service)
          , budget
        }
    }

    /// Run one completion and apply the endpoint's fallback policy.
    pub async fn generate<T>(
      &self
    , spec: &EndpointSpec
    , request: PromptRequest
    , schema: ExtractionSchema<T>
    ) -> Result<T, ApiFailure>
    where T: DeserializeOwned
    {   let options = CompletionOptions::new(
          spec.model, spec.max_tokens, spec.temperature
        ).with_budget(self.budget);

        let result = self.adapter
          .complete(request, schema, &options)
          .await
          .map_err(ApiFailure::Template)?;

        match result
        {   CompletionResult::Ok(value) => Ok(value)
          , CompletionResult::Fallback(value, reason)
              if spec.policy.serves(reason) => Ok(value)
          , CompletionResult::Fallback(_, reason) => {
              Err(ApiFailure::Generation
              {   message: spec.failure_message
                , reason
              })
            }
        }
    }

    /// Like [`generate`](Self::generate), but a skipped request answers
    /// the default without calling the service.
    pub async fn answer<T>(&self, spec: &EndpointSpec, prepared: Prepared<T>)
      -> Result<T, ApiFailure>
    where T: DeserializeOwned
    {   match prepared
        {   Prepared::Call(request, schema) => {
              self.generate(spec, request, schema).await
            }
          , Prepared::Skip(template, schema) => {
              info!("No input for {}; serving default", template.name());
              Ok(schema.into_default())
            }
        }
    }
}

/// A request that does not end in a 200
#[derive(Debug)]
pub enum ApiFailure
{   /// Required input missing or blank
    BadRequest(&'static str)
  , /// Template could not be bound: a deployment defect
    Template(Error)
  , /// Generation failed on an endpoint that surfaces failures
    Generation
    {   message: &'static str
      , reason: FailureReason
    }
}

impl IntoResponse for ApiFailure
{   fn into_response(self) -> Response
    {   match self
        {   ApiFailure::BadRequest(message) => {
              warn!("Rejected request: {}", message);
              (StatusCode::BAD_REQUEST, Json(json!({ "message": message })))
                .into_response()
            }
          , ApiFailure::Template(e) => {
              error!("Template defect: {}", e);
              (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                  "message": "Internal server error",
                  "details": e.to_string()
                }))
              ).into_response()
            }
          , ApiFailure::Generation { message, reason } => {
              error!("Generation failed: {}", reason);
              (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                  "error": message,
                  "details": reason.to_string()
                }))
              ).into_response()
            }
        }
    }
}

/// A list of strings where the list itself, or any entry, may be `null`
pub(crate) fn lenient_texts<'de, D>(deserializer: D)
  -> Result<Vec<String>, D::Error>
where D: Deserializer<'de>
{   let raw: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default().into_iter().flatten().collect())
}

/// Trimmed, or `None` when blank
pub(crate) fn present(value: &Option<String>) -> Option<&str>
{   value
      .as_deref()
      .map(str::trim)
      .filter(|v| !v.is_empty())
}

async fn method_not_allowed() -> Response
{   (
      StatusCode::METHOD_NOT_ALLOWED,
      Json(json!({ "message": "Method not allowed" }))
    ).into_response()
}

/// All endpoints, POST only
pub fn router<S>(state: Arc<AppState<S>>) -> Router
where S: CompletionService + 'static
{   Router::new()
      .route(
        "/api/generate-keywords",
        post(keywords::handle::<S>).fallback(method_not_allowed)
      )
      .route(
        "/api/generate-questions",
        post(questions::handle::<S>).fallback(method_not_allowed)
      )
      .route(
        "/api/generate-response-letter",
        post(response_letter::handle::<S>).fallback(method_not_allowed)
      )
      .route(
        "/api/generate-solutions",
        post(solutions::handle::<S>).fallback(method_not_allowed)
      )
      .route(
        "/api/summarize-situation",
        post(summary::handle::<S>).fallback(method_not_allowed)
      )
      .route(
        "/api/check-emotion",
        post(emotion::handle::<S>).fallback(method_not_allowed)
      )
      .route(
        "/api/check-blame-pattern",
        post(blame::handle::<S>).fallback(method_not_allowed)
      )
      .route(
        "/api/generate-strength-keywords",
        post(strength_keywords::handle::<S>).fallback(method_not_allowed)
      )
      .route(
        "/api/generate-reflection-hints",
        post(reflection_hints::handle::<S>).fallback(method_not_allowed)
      )
      .route(
        "/api/generate-ai-solutions",
        post(ai_solutions::handle::<S>).fallback(method_not_allowed)
      )
      .with_state(state)
}
