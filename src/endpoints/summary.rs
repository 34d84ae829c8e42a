//! Two-to-three word summary of a reflection

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
  , max_tokens: 50
  , temperature: 0.3
  , policy: FallbackPolicy::Serve
  , failure_message: "요약 중 오류가 발생했습니다."
};

pub const DEFAULT_SUMMARY: &str = "이 상황";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBody
{   #[serde(default)]
    pub reflection_content: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary
{   pub summary: String
}

pub fn prepare(body: &SummaryBody) -> Prepared<Summary>
{   let schema = ExtractionSchema::new(
      Shape::Object(vec![Field::text("summary")]),
      Summary { summary: DEFAULT_SUMMARY.to_string() }
    ).with_check(|s| !s.summary.trim().is_empty());
    match present(&body.reflection_content)
    {   Some(reflection) => Prepared::Call(
          PromptRequest::new(TemplateId::Summary)
            .with("reflection", reflection),
          schema
        )
      , None => Prepared::Skip(TemplateId::Summary, schema)
    }
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<SummaryBody>
) -> Result<Json<Summary>, ApiFailure>
where S: CompletionService
{   Ok(Json(state.answer(&SPEC, prepare(&body)).await?))
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::FailureReason;

    #[test]
    fn blank_summary_is_rejected()
    {   let body = SummaryBody
        {   reflection_content: Some("발표 때마다 떨려요".into())
        };
        let schema = match prepare(&body)
        {   Prepared::Call(_, schema) => schema
          , Prepared::Skip(..) => panic!("expected a call")
        };
        assert_eq!(
          schema.extract(r#"{"summary": "  "}"#),
          Err(FailureReason::SchemaMismatch)
        );
        assert_eq!(
          schema.extract(r#"{"summary": "발표 불안"}"#).unwrap().summary,
          "발표 불안"
        );
    }

    #[test]
    fn blank_reflection_serves_default()
    {   let body = SummaryBody { reflection_content: Some("  ".into()) };
        match prepare(&body)
        {   Prepared::Skip(_, schema) => {
              assert_eq!(schema.into_default().summary, DEFAULT_SUMMARY);
            }
          , Prepared::Call(..) => panic!("blank input should not be sent")
        }
    }
}
