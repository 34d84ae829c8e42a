//! Whether a reflection names an emotion, with a nudge when it does not

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
  , max_tokens: 300
  , temperature: 0.7
  , policy: FallbackPolicy::Serve
  , failure_message: "감정 확인 중 오류가 발생했습니다."
};

pub const DEFAULT_SUGGESTION: &str =
  "이 상황에서 양양이 어떤 감정을 느꼈을지 생각해보고 추가해보세요. 예: '이런 상황에서 나는 좌절감을 느꼈다' 또는 '이로 인해 불안하고 걱정스러웠다'";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionBody
{   #[serde(default)]
    pub reflection_content: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionCheck
{   pub has_emotion: bool
  , pub suggestion: String
}

pub fn prepare(body: &EmotionBody) -> Prepared<EmotionCheck>
{   let schema = ExtractionSchema::new(
      Shape::Object(vec![
        Field::flag("hasEmotion")
      , Field::text("suggestion")
      ]),
      EmotionCheck
      {   has_emotion: false
        , suggestion: DEFAULT_SUGGESTION.to_string()
      }
    );
    match present(&body.reflection_content)
    {   Some(reflection) => Prepared::Call(
          PromptRequest::new(TemplateId::EmotionCheck)
            .with("reflection", reflection),
          schema
        )
      , None => Prepared::Skip(TemplateId::EmotionCheck, schema)
    }
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<EmotionBody>
) -> Result<Json<EmotionCheck>, ApiFailure>
where S: CompletionService
{   Ok(Json(state.answer(&SPEC, prepare(&body)).await?))
}
