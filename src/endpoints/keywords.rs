//! Keywords from highlighted passages, answers and the reflection in progress

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{present, ApiFailure, AppState, EndpointSpec, FallbackPolicy, Prepared};
use crate::extract::{ExtractionSchema, Shape};
use crate::providers::CompletionService;
use crate::request::{join_fragments, PromptRequest};
use crate::template::TemplateId;

pub const SPEC: EndpointSpec = EndpointSpec
{   model: "gpt-3.5-turbo"
  , max_tokens: 200
  , temperature: 0.7
  , policy: FallbackPolicy::Serve
  , failure_message: "키워드 생성 중 오류가 발생했습니다."
};

pub const DEFAULT_KEYWORDS: [&str; 10] = [
  "집중력 부족", "업무 효율성", "동료 관계"
, "자신감 하락", "우선순위 설정", "시간 관리"
, "스트레스 관리", "의사소통", "자기 성찰", "목표 설정"
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordsBody
{   #[serde(default, deserialize_with = "super::lenient_texts")]
    pub highlighted_texts: Vec<String>
  , #[serde(default, deserialize_with = "super::lenient_texts")]
    pub user_answers: Vec<String>
  , #[serde(default, deserialize_with = "super::lenient_texts")]
    pub user_explanations: Vec<String>
  , #[serde(default)]
    pub current_reflection: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keywords
{   pub keywords: Vec<String>
}

pub fn default_keywords() -> Keywords
{   Keywords
    {   keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
    }
}

pub fn prepare(body: &KeywordsBody) -> Prepared<Keywords>
{   let schema = ExtractionSchema::new(
      Shape::Delimited { delimiter: ',', field: "keywords" },
      default_keywords()
    );
    let reflection = present(&body.current_reflection);
    let texts = join_fragments(
      body.highlighted_texts.iter()
        .chain(body.user_answers.iter())
        .chain(body.user_explanations.iter())
        .map(String::as_str)
        .chain(reflection),
      " "
    );
    if texts.is_empty()
    {   return Prepared::Skip(TemplateId::Keywords, schema);
    }

    let template = match reflection
    {   Some(_) => TemplateId::KeywordsWithReflection
      , None => TemplateId::Keywords
    };
    let request = PromptRequest::new(template).with("texts", texts);
    Prepared::Call(request, schema)
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<KeywordsBody>
) -> Result<Json<Keywords>, ApiFailure>
where S: CompletionService
{   Ok(Json(state.answer(&SPEC, prepare(&body)).await?))
}

#[cfg(test)]
mod tests
{   use super::*;

    fn bound(prepared: Prepared<Keywords>) -> PromptRequest
    {   match prepared
        {   Prepared::Call(request, _) => request
          , Prepared::Skip(..) => panic!("expected a call")
        }
    }

    #[test]
    fn joins_all_sources_and_picks_reflection_template()
    {   let body = KeywordsBody
        {   highlighted_texts: vec!["집중이 안 돼요".into(), " ".into()]
          , user_answers: vec!["회의 중에".into()]
          , user_explanations: vec![]
          , current_reflection: Some(" 마감이 걱정돼요 ".into())
        };
        let request = bound(prepare(&body));
        assert_eq!(request.template(), TemplateId::KeywordsWithReflection);
        assert_eq!(
          request.value("texts"),
          Some("집중이 안 돼요 회의 중에 마감이 걱정돼요")
        );
    }

    #[test]
    fn blank_reflection_uses_plain_template()
    {   let body = KeywordsBody
        {   highlighted_texts: vec!["집중이 안 돼요".into()]
          , current_reflection: Some("   ".into())
          , ..Default::default()
        };
        let request = bound(prepare(&body));
        assert_eq!(request.template(), TemplateId::Keywords);
    }

    #[test]
    fn nothing_to_analyse_skips_the_call()
    {   match prepare(&KeywordsBody::default())
        {   Prepared::Skip(_, schema) => {
              assert_eq!(schema.into_default(), default_keywords());
            }
          , Prepared::Call(..) => panic!("blank input should not be sent")
        }
    }

    #[test]
    fn null_entries_are_ignored()
    {   let body: KeywordsBody = serde_json::from_str(
          r#"{"highlightedTexts": ["집중이 안 돼요", null], "userAnswers": null}"#
        ).unwrap();
        assert_eq!(body.highlighted_texts, vec!["집중이 안 돼요"]);
        assert!(body.user_answers.is_empty());
        assert!(body.user_explanations.is_empty());
    }

    #[test]
    fn default_has_ten_keywords()
    {   assert_eq!(default_keywords().keywords.len(), 10);
    }
}
