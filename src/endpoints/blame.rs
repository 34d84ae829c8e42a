//! Spotting self-blame in a reflection and offering environmental factors

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{present, ApiFailure, AppState, EndpointSpec, FallbackPolicy, Prepared};
use crate::extract::{ExtractionSchema, Field, Shape};
use crate::providers::CompletionService;
use crate::request::PromptRequest;
use crate::template::TemplateId;

pub const SPEC: EndpointSpec = EndpointSpec
{   model: "gpt-3.5-turbo"
  , max_tokens: 400
  , temperature: 0.7
  , policy: FallbackPolicy::Serve
  , failure_message: "비난 패턴 확인 중 오류가 발생했습니다."
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlameBody
{   #[serde(default)]
    pub reflection_content: Option<String>
  , #[serde(default)]
    pub original_letter: Option<String>
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlameCheck
{   pub has_blame_pattern: bool
  , pub warning: String
  , pub environmental_factors: Vec<String>
}

pub fn prepare(body: &BlameBody) -> Prepared<BlameCheck>
{   let schema = ExtractionSchema::new(
      Shape::Object(vec![
        Field::flag("hasBlamePattern")
      , Field::text("warning")
      , Field::text_list("environmentalFactors", 0, None)
      ]),
      BlameCheck::default()
    );
    let reflection = match present(&body.reflection_content)
    {   Some(reflection) => reflection
      , None => return Prepared::Skip(TemplateId::BlamePattern, schema)
    };
    let request = PromptRequest::new(TemplateId::BlamePattern)
      .with("reflection", reflection)
      .with("letter", present(&body.original_letter).unwrap_or("(없음)"));
    Prepared::Call(request, schema)
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<BlameBody>
) -> Result<Json<BlameCheck>, ApiFailure>
where S: CompletionService
{   Ok(Json(state.answer(&SPEC, prepare(&body)).await?))
}
