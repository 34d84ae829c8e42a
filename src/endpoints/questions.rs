//! Empathetic follow-up questions about highlighted passages

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{present, ApiFailure, AppState, EndpointSpec, FallbackPolicy};
use crate::extract::{ExtractionSchema, Field, Shape};
use crate::providers::CompletionService;
use crate::request::{join_fragments, PromptRequest};
use crate::template::TemplateId;

pub const SPEC: EndpointSpec = EndpointSpec
{   model: "gpt-4o"
  , max_tokens: 1000
  , temperature: 0.7
  , policy: FallbackPolicy::Surface
  , failure_message: "Failed to parse AI response"
};

pub const QUESTION_COUNT: usize = 3;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsBody
{   #[serde(default)]
    pub highlighted_texts: Option<Vec<String>>
  , #[serde(default)]
    pub user_input: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questions
{   pub questions: Vec<String>
}

// Never served: this endpoint surfaces failures.
fn placeholder_questions() -> Questions
{   Questions
    {   questions: vec![
          "이 편지를 쓴 사람은 지금 어떤 마음일까요?".to_string()
        , "이 상황에서 가장 힘든 점은 무엇일까요?".to_string()
        , "어떤 도움이 있으면 좋을까요?".to_string()
        ]
    }
}

pub fn prepare(body: &QuestionsBody)
  -> Result<(PromptRequest, ExtractionSchema<Questions>), ApiFailure>
{   let texts = body.highlighted_texts
      .as_ref()
      .ok_or(ApiFailure::BadRequest(
        "highlightedTexts is required and must be an array"
      ))?;
    let highlights = join_fragments(texts, "\n\n");
    if highlights.is_empty()
    {   return Err(ApiFailure::BadRequest(
          "highlightedTexts must contain text"
        ));
    }

    let request = match present(&body.user_input)
    {   Some(rationale) => {
          PromptRequest::new(TemplateId::QuestionsWithRationale)
            .with("highlights", &highlights)
            .with("rationale", rationale)
        }
      , None => {
          PromptRequest::new(TemplateId::Questions)
            .with("highlights", &highlights)
        }
    };
    let schema = ExtractionSchema::new(
      Shape::Object(vec![Field::text_list(
        "questions", QUESTION_COUNT, Some(QUESTION_COUNT)
      )]),
      placeholder_questions()
    );
    Ok((request, schema))
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<QuestionsBody>
) -> Result<Json<Questions>, ApiFailure>
where S: CompletionService
{   let (request, schema) = prepare(&body)?;
    Ok(Json(state.generate(&SPEC, request, schema).await?))
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn rationale_selects_deeper_template()
    {   let body = QuestionsBody
        {   highlighted_texts: Some(vec!["a".into(), "b".into()])
          , user_input: Some("공감돼서".into())
        };
        let (request, _) = prepare(&body).unwrap();
        assert_eq!(request.template(), TemplateId::QuestionsWithRationale);
        assert_eq!(request.value("highlights"), Some("a\n\nb"));
        assert_eq!(request.value("rationale"), Some("공감돼서"));
    }

    #[test]
    fn missing_highlights_is_rejected()
    {   assert!(matches!(
          prepare(&QuestionsBody::default()),
          Err(ApiFailure::BadRequest(_))
        ));
        let blank = QuestionsBody
        {   highlighted_texts: Some(vec!["  ".into()])
          , user_input: None
        };
        assert!(matches!(prepare(&blank), Err(ApiFailure::BadRequest(_))));
    }

    #[test]
    fn exactly_three_questions_are_accepted()
    {   let body = QuestionsBody
        {   highlighted_texts: Some(vec!["a".into()])
          , user_input: None
        };
        let (_, schema) = prepare(&body).unwrap();
        assert!(schema.extract(r#"{"questions": ["1", "2"]}"#).is_err());
        assert_eq!(
          schema.extract(r#"{"questions": ["1", "2", "3"]}"#)
            .unwrap()
            .questions
            .len(),
          3
        );
        assert_eq!(schema.default_value().questions.len(), 3);
    }
}
