//! One solution direction in each of three randomly chosen categories

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{present, ApiFailure, AppState, EndpointSpec, FallbackPolicy};
use crate::extract::{ExtractionSchema, Field, Shape};
use crate::providers::CompletionService;
use crate::request::PromptRequest;
use crate::template::TemplateId;

pub const SPEC: EndpointSpec = EndpointSpec
{   model: "gpt-3.5-turbo"
  , max_tokens: 1000
  , temperature: 0.7
  , policy: FallbackPolicy::Serve
  , failure_message: "해결책 생성 중 오류가 발생했습니다."
};

pub const PICKED: usize = 3;

/// A solution category: key, Korean label, default suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category
{   pub key: &'static str
  , pub label: &'static str
  , pub default_text: &'static str
}

pub const CATEGORIES: [Category; 6] = [
  Category
  {   key: "inner_peace"
    , label: "내적 평화와 마음 돌보기"
    , default_text: "호흡법 연습하기"
  }
, Category
  {   key: "physical_environment"
    , label: "물리적 환경과 일상의 루틴 조정"
    , default_text: "공간 정리하기"
  }
, Category
  {   key: "social_support"
    , label: "사회적 연결 및 지지 확보하기"
    , default_text: "동료에게 말하기"
  }
, Category
  {   key: "self_advocacy"
    , label: "자기옹호와 자기주장 강화하기"
    , default_text: "도움 요청하기"
  }
, Category
  {   key: "behavioral_activation"
    , label: "구체적 행동 활성화 전략"
    , default_text: "목록 만들기"
  }
, Category
  {   key: "cognitive_reframing"
    , label: "인지적 재구성과 관점 전환"
    , default_text: "관점 바꾸기"
  }
];

pub fn category(key: &str) -> Option<&'static Category>
{   CATEGORIES.iter().find(|c| c.key == key)
}

/// Uniform choice of three distinct categories
pub fn select_categories<R: Rng + ?Sized>(rng: &mut R) -> Vec<Category>
{   CATEGORIES
      .choose_multiple(rng, PICKED)
      .copied()
      .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionsBody
{   #[serde(default)]
    pub problem_content: Option<String>
  , #[serde(default)]
    pub personal_reflection: Option<String>
  , #[serde(default)]
    pub character_name: Option<String>
  , #[serde(default)]
    pub letter_content: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion
{   pub category: String
  , pub text: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestions
{   pub suggestions: Vec<Suggestion>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelledSuggestion
{   pub category: String
  , pub category_label: String
  , pub text: String
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionsReply
{   pub suggestions: Vec<LabelledSuggestion>
}

pub fn default_suggestions(picked: &[Category]) -> Suggestions
{   Suggestions
    {   suggestions: picked
          .iter()
          .map(|c| Suggestion
          {   category: c.key.to_string()
            , text: c.default_text.to_string()
          })
          .collect()
    }
}

/// Known categories only, none repeated
fn known_and_distinct(s: &Suggestions) -> bool
{   let mut seen: Vec<&str> = Vec::new();
    for suggestion in &s.suggestions
    {   let key = suggestion.category.as_str();
        if category(key).is_none() || seen.contains(&key)
        {   return false;
        }
        seen.push(key);
    }
    true
}

pub fn prepare(body: &SolutionsBody, picked: &[Category])
  -> Result<(PromptRequest, ExtractionSchema<Suggestions>), ApiFailure>
{   let problem = present(&body.problem_content)
      .ok_or(ApiFailure::BadRequest("Problem content is required"))?;

    let mut request = PromptRequest::new(TemplateId::Solutions)
      .with("problem", problem)
      .with("speaker", present(&body.character_name).unwrap_or("편지 작성자"))
      .with("letter", present(&body.letter_content).unwrap_or("없음"))
      .with("reflection", present(&body.personal_reflection).unwrap_or("없음"));
    for (i, c) in picked.iter().enumerate()
    {   request = request
          .with(&format!("category_{}", i + 1), c.key)
          .with(&format!("category_{}_label", i + 1), c.label);
    }

    let schema = ExtractionSchema::new(
      Shape::Object(vec![Field::records(
        "suggestions", PICKED, Some(PICKED),
        vec![Field::text("category"), Field::text("text")]
      )]),
      default_suggestions(picked)
    ).with_check(known_and_distinct);
    Ok((request, schema))
}

/// Attach Korean labels. Only known categories get past extraction.
pub fn label(suggestions: Suggestions) -> SuggestionsReply
{   SuggestionsReply
    {   suggestions: suggestions.suggestions
          .into_iter()
          .filter_map(|s| {
            let known = category(&s.category)?;
            Some(LabelledSuggestion
            {   category: s.category
              , category_label: known.label.to_string()
              , text: s.text
            })
          })
          .collect()
    }
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<SolutionsBody>
) -> Result<Json<SuggestionsReply>, ApiFailure>
where S: CompletionService
{   let picked = select_categories(&mut rand::thread_rng());
    let (request, schema) = prepare(&body, &picked)?;
    let suggestions = state.generate(&SPEC, request, schema).await?;
    Ok(Json(label(suggestions)))
}

#[cfg(test)]
mod tests
{   use super::*;

    fn body() -> SolutionsBody
    {   SolutionsBody
        {   problem_content: Some("회의 중 집중이 어려움".into())
          , ..Default::default()
        }
    }

    #[test]
    fn picks_three_distinct_categories()
    {   let mut rng = rand::thread_rng();
        for _ in 0..50
        {   let picked = select_categories(&mut rng);
            assert_eq!(picked.len(), 3);
            for (i, c) in picked.iter().enumerate()
            {   assert!(category(c.key).is_some());
                assert!(!picked[i + 1..].contains(c));
            }
        }
    }

    #[test]
    fn binds_picked_categories()
    {   let picked = vec![CATEGORIES[0], CATEGORIES[3], CATEGORIES[5]];
        let (request, schema) = prepare(&body(), &picked).unwrap();
        assert_eq!(request.value("category_2"), Some("self_advocacy"));
        assert_eq!(
          request.value("category_3_label"),
          Some("인지적 재구성과 관점 전환")
        );
        assert_eq!(request.value("reflection"), Some("없음"));
        let defaults: Vec<&str> = schema.default_value()
          .suggestions
          .iter()
          .map(|s| s.text.as_str())
          .collect();
        assert_eq!(defaults, vec!["호흡법 연습하기", "도움 요청하기", "관점 바꾸기"]);
    }

    #[test]
    fn rejects_unknown_or_repeated_categories()
    {   let picked = vec![CATEGORIES[0], CATEGORIES[1], CATEGORIES[2]];
        let (_, schema) = prepare(&body(), &picked).unwrap();
        let repeated = r#"{"suggestions": [
          {"category": "inner_peace", "text": "a"},
          {"category": "inner_peace", "text": "b"},
          {"category": "social_support", "text": "c"}]}"#;
        assert!(schema.extract(repeated).is_err());
        let unknown = r#"{"suggestions": [
          {"category": "inner_peace", "text": "a"},
          {"category": "astrology", "text": "b"},
          {"category": "social_support", "text": "c"}]}"#;
        assert!(schema.extract(unknown).is_err());
    }

    #[test]
    fn labels_are_attached()
    {   let reply = label(default_suggestions(&[CATEGORIES[4]]));
        assert_eq!(reply.suggestions[0].category_label, "구체적 행동 활성화 전략");
        assert_eq!(reply.suggestions[0].text, "목록 만들기");
    }

    #[test]
    fn problem_is_required()
    {   assert!(matches!(
          prepare(&SolutionsBody::default(), &CATEGORIES[..3]),
          Err(ApiFailure::BadRequest(_))
        ));
    }
}
