//! Short hint phrases that help the user put the speaker's worries into words

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{present, ApiFailure, AppState, EndpointSpec, FallbackPolicy};
use crate::extract::{ExtractionSchema, Shape};
use crate::providers::CompletionService;
use crate::request::PromptRequest;
use crate::template::TemplateId;

pub const SPEC: EndpointSpec = EndpointSpec
{   model: "gpt-4"
  , max_tokens: 500
  , temperature: 0.7
  , policy: FallbackPolicy::ServeUnusable
  , failure_message: "Failed to generate reflection hints"
};

pub const MAX_HINTS: usize = 7;

pub const DEFAULT_HINTS: [&str; 5] = [
  "집중력 부족으로 인한 어려움"
, "업무 효율성 문제"
, "동료와의 관계 걱정"
, "자신감 하락"
, "우선순위 설정의 어려움"
];

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightItem
{   #[serde(default)]
    pub text: String
  , #[serde(default)]
    pub problem_reason: Option<String>
  , #[serde(default)]
    pub user_explanation: Option<String>
  , #[serde(default)]
    pub emotion_inference: Option<String>
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintsBody
{   #[serde(default)]
    pub character_name: Option<String>
  , #[serde(default)]
    pub highlighted_data: Vec<HighlightItem>
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Hints
{   pub hints: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintsReply
{   pub success: bool
  , pub hints: Vec<String>
}

fn summarise(items: &[HighlightItem]) -> String
{   items
      .iter()
      .filter(|item| !item.text.trim().is_empty())
      .enumerate()
      .map(|(i, item)| {
        let mut summary = format!(
          "{}. 하이라이트된 텍스트: \"{}\"",
          i + 1, item.text.trim()
        );
        if let Some(reason) = present(&item.problem_reason)
        {   summary.push_str(&format!("\n   고민이라고 생각한 이유: {}", reason));
        }
        if let Some(explanation) = present(&item.user_explanation)
        {   summary.push_str(&format!("\n   사용자 공감/경험: {}", explanation));
        }
        if let Some(emotion) = present(&item.emotion_inference)
        {   summary.push_str(&format!("\n   유추한 감정: {}", emotion));
        }
        summary
      })
      .collect::<Vec<_>>()
      .join("\n\n")
}

pub fn prepare(body: &HintsBody)
  -> Result<(PromptRequest, ExtractionSchema<Hints>), ApiFailure>
{   let speaker = present(&body.character_name)
      .ok_or(ApiFailure::BadRequest("Required data is missing"))?;
    let highlights = summarise(&body.highlighted_data);
    if highlights.is_empty()
    {   return Err(ApiFailure::BadRequest("Required data is missing"));
    }

    let request = PromptRequest::new(TemplateId::ReflectionHints)
      .with("speaker", speaker)
      .with("highlights", highlights);
    let schema = ExtractionSchema::new(
      Shape::Lines { field: "hints", max: MAX_HINTS },
      Hints
      {   hints: DEFAULT_HINTS.iter().map(|h| h.to_string()).collect()
      }
    );
    Ok((request, schema))
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<HintsBody>
) -> Result<Json<HintsReply>, ApiFailure>
where S: CompletionService
{   let (request, schema) = prepare(&body)?;
    let hints = state.generate(&SPEC, request, schema).await?;
    Ok(Json(HintsReply
    {   success: true
      , hints: hints.hints
    }))
}
