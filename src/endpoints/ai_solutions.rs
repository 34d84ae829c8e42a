//! Three concrete action plans for one problem, shaped by the strengths
//! and solution categories the user picked

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::strength_keywords::StrengthItem;
use super::{present, ApiFailure, AppState, EndpointSpec, FallbackPolicy};
use crate::extract::{ExtractionSchema, Shape};
use crate::providers::CompletionService;
use crate::request::PromptRequest;
use crate::template::TemplateId;

pub const SPEC: EndpointSpec = EndpointSpec
{   model: "gpt-3.5-turbo"
  , max_tokens: 800
  , temperature: 0.7
  , policy: FallbackPolicy::Serve
  , failure_message: "Failed to generate AI solutions"
};

pub const SOLUTION_COUNT: usize = 3;

const STRENGTH_SOLUTIONS: [(&str, &str); 7] = [
  ("깊게 집중하는 능력", "매일 오전 30분 조용한 공간에서 집중해서 해결책 생각하기")
, ("새로운 아이디어 내기", "주 3회 산책하며 창의적 해결책 떠올리기")
, ("다른 사람 마음 읽기", "비슷한 경험 가진 지인과 주 1회 깊은 대화 나누기")
, ("문제를 분석하기", "고민을 3단계로 나누어 매일 하나씩 체계적으로 해결하기")
, ("공감하고 소통하기", "신뢰하는 가족이나 친구에게 구체적인 조언 구하기")
, ("끝까지 포기 안하기", "작은 목표 세우고 매일 달성 여부 점검하기")
, ("팀을 이끌어가기", "주변 사람들과 함께 브레인스토밍 세션 갖기")
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSolutionsBody
{   #[serde(default)]
    pub problem_content: Option<String>
  , #[serde(default)]
    pub letter_content: Option<String>
  , #[serde(default)]
    pub character_name: Option<String>
  , #[serde(default, deserialize_with = "super::lenient_texts")]
    pub selected_strength_tags: Vec<String>
  , #[serde(default, deserialize_with = "super::lenient_texts")]
    pub selected_solution_categories: Vec<String>
  , #[serde(default)]
    pub strength_items: Vec<StrengthItem>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSolutions
{   pub solutions: Vec<String>
}

fn category_solution(category: &str, speaker: &str) -> Option<String>
{   let text = match category
    {   "마음 챙기기" => "어려운 상황에서 느끼는 감정을 매일 3분씩 글로 써보며 마음 정리하기"
      , "주변 환경 바꾸기" => "고민이 생기는 환경을 파악하고 더 편안한 공간에서 해결책 생각하기"
      , "도움 요청하기" => "관련 경험이 있는 사람에게 구체적인 조언 구하기"
      , "좋은 관계 만들기" => "도움이 될 수 있는 사람과의 관계 개선하기"
      , "나답게 행동/말하기" => {
          return Some(format!(
            "{}의 성향과 가치관에 맞는 방식으로 대처하기", speaker
          ));
        }
      , "작지만 확실한 실천" => "해결을 위한 작은 행동을 매일 하나씩 꾸준히 실천하기"
      , "생각 뒤집기" => "고민을 다른 각도에서 바라보며 새로운 해결책 찾기"
      , _ => return None
    };
    Some(text.to_string())
}

fn mentions(problem: &str, words: &[&str]) -> bool
{   words.iter().any(|w| problem.contains(w))
}

/// Suggestions keyed on what the problem is about
fn contextual(problem: &str, tags: &[String], categories: &[String])
  -> Vec<&'static str>
{   let tagged = |tag: &str| tags.iter().any(|t| t == tag);
    let chosen = |category: &str| categories.iter().any(|c| c == category);

    let mut out = Vec::new();
    if mentions(problem, &["대화", "소통", "표현", "전달"])
    {   if tagged("다른 사람 마음 읽기")
        {   out.push("상대방의 반응을 살피며 천천히 대화하는 연습하기");
        }
        if tagged("공감하고 소통하기")
        {   out.push("신뢰하는 사람과 중요한 대화 미리 연습해보기");
        }
        if chosen("도움 요청하기")
        {   out.push("가족이나 친구에게 대화 연습 도와달라고 요청하기");
        }
    }
    if mentions(problem, &["자신감", "확신", "불안"])
    {   if tagged("끝까지 포기 안하기")
        {   out.push("작은 성공 경험을 쌓아가며 자신감 키우기");
        }
        if chosen("마음 챙기기")
        {   out.push("매일 긍정적인 자기 대화 연습하기");
        }
    }
    if mentions(problem, &["관계", "사람", "친구"])
    {   if chosen("좋은 관계 만들기")
        {   out.push("작은 관심 표현부터 시작해서 관계 개선하기");
        }
        if tagged("공감하고 소통하기")
        {   out.push("상대방 입장에서 생각해보며 대화하기");
        }
    }
    out
}

/// Three distinct solutions built without the model: problem-specific
/// ones first, then per strength and per category, then generic ones
/// drawn at random.
pub fn fallback_solutions<R: Rng + ?Sized>(
  problem: &str
, tags: &[String]
, categories: &[String]
, speaker: &str
, rng: &mut R
) -> Vec<String>
{   let mut solutions: Vec<String> = contextual(problem, tags, categories)
      .into_iter()
      .map(str::to_string)
      .collect();

    for tag in tags
    {   if solutions.len() >= SOLUTION_COUNT
        {   break;
        }
        if let Some((_, text)) = STRENGTH_SOLUTIONS.iter().find(|(t, _)| t == tag)
        {   solutions.push(text.to_string());
        }
    }
    for category in categories
    {   if solutions.len() >= SOLUTION_COUNT
        {   break;
        }
        if let Some(text) = category_solution(category, speaker)
        {   solutions.push(text);
        }
    }

    let mut generic = vec![
      "현재 고민을 3개 단계로 나누어 매일 하나씩 차근차근 해결하기".to_string()
    , format!("{}만의 루틴 만들어 어려운 상황에 대처하기", speaker)
    , "어려운 상황에서도 자신감을 유지하는 긍정적 자기대화 연습하기".to_string()
    , "작은 진전이라도 매일 기록하고 스스로를 격려하기".to_string()
    , "현재 상황을 제3자 관점에서 바라보며 객관적 조언 찾기".to_string()
    ];
    generic.shuffle(rng);
    for text in generic
    {   if solutions.len() >= SOLUTION_COUNT
        {   break;
        }
        if !solutions.contains(&text)
        {   solutions.push(text);
        }
    }

    solutions.truncate(SOLUTION_COUNT);
    solutions
}

fn strength_context(tags: &[String], items: &[StrengthItem]) -> String
{   let listed = tags
      .iter()
      .map(|tag| format!("- {}", tag))
      .collect::<Vec<_>>()
      .join("\n");
    let details = items
      .iter()
      .filter(|item| tags.iter().any(|tag| {
        item.text.contains(tag.as_str())
          || item.strength_description
               .as_deref()
               .map_or(false, |d| d.contains(tag.as_str()))
          || item.strength_application
               .as_deref()
               .map_or(false, |a| a.contains(tag.as_str()))
      }))
      .enumerate()
      .map(|(i, item)| format!(
        "{}. 강점 내용: \"{}\"\n   설명: \"{}\"\n   활용법: \"{}\"",
        i + 1,
        item.text.trim(),
        present(&item.strength_description).unwrap_or("없음"),
        present(&item.strength_application).unwrap_or("없음")
      ))
      .collect::<Vec<_>>()
      .join("\n");
    let details = if details.is_empty()
    {   "강점 세부 정보 없음".to_string()
    }
    else
    {   details
    };
    format!(
      "**선택된 강점들:**\n{}\n\n**강점 관련 세부 정보:**\n{}",
      listed, details
    )
}

fn approach(problem: &str, tags: &[String], categories: &[String]) -> String
{   match (tags.is_empty(), categories.is_empty())
    {   (false, false) => format!(
          "\"{}\"라는 핵심 고민을 해결하기 위해 강점 \"{}\"을 활용하여 \"{}\" 방식으로 접근하는 구체적이고 실행 가능한 행동 계획",
          problem, tags.join(", "), categories.join(", ")
        )
      , (false, true) => format!(
          "\"{}\"라는 핵심 고민을 해결하기 위해 강점 \"{}\"을 최대한 활용하는 구체적 실행 방법",
          problem, tags.join(", ")
        )
      , _ => format!(
          "\"{}\"라는 핵심 고민을 해결하기 위한 \"{}\" 접근법의 구체적이고 실용적인 실행 방법",
          problem, categories.join(", ")
        )
    }
}

fn trimmed(values: &[String]) -> Vec<String>
{   values
      .iter()
      .map(|v| v.trim())
      .filter(|v| !v.is_empty())
      .map(str::to_string)
      .collect()
}

pub fn prepare<R: Rng + ?Sized>(body: &AiSolutionsBody, rng: &mut R)
  -> Result<(PromptRequest, ExtractionSchema<AiSolutions>), ApiFailure>
{   let (problem, speaker) = match (
      present(&body.problem_content),
      present(&body.character_name)
    )
    {   (Some(problem), Some(speaker)) => (problem, speaker)
      , _ => {
          return Err(ApiFailure::BadRequest(
            "Problem content and character name are required"
          ));
        }
    };
    let tags = trimmed(&body.selected_strength_tags);
    let categories = trimmed(&body.selected_solution_categories);
    if tags.is_empty() && categories.is_empty()
    {   return Err(ApiFailure::BadRequest(
          "At least one strength tag or solution category must be selected"
        ));
    }

    let mut context = Vec::new();
    if !tags.is_empty()
    {   context.push(strength_context(&tags, &body.strength_items));
    }
    if !categories.is_empty()
    {   let listed = categories
          .iter()
          .map(|c| format!("- {}", c))
          .collect::<Vec<_>>()
          .join("\n");
        context.push(format!("**선택된 해결방안 카테고리들:**\n{}", listed));
    }

    let request = PromptRequest::new(TemplateId::AiSolutions)
      .with("speaker", speaker)
      .with("letter", present(&body.letter_content).unwrap_or("(없음)"))
      .with("problem", problem)
      .with("context", context.join("\n\n"))
      .with("approach", approach(problem, &tags, &categories));
    let schema = ExtractionSchema::new(
      Shape::JsonList
      {   field: "solutions"
        , min: SOLUTION_COUNT
        , max: Some(SOLUTION_COUNT)
      },
      AiSolutions
      {   solutions: fallback_solutions(problem, &tags, &categories, speaker, rng)
      }
    );
    Ok((request, schema))
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<AiSolutionsBody>
) -> Result<Json<AiSolutions>, ApiFailure>
where S: CompletionService
{   let (request, schema) = prepare(&body, &mut rand::thread_rng())?;
    Ok(Json(state.generate(&SPEC, request, schema).await?))
}

#[cfg(test)]
mod tests
{   use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strings(values: &[&str]) -> Vec<String>
    {   values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn problem_specific_solutions_come_first()
    {   let mut rng = StdRng::seed_from_u64(7);
        let out = fallback_solutions(
          "대화를 통해 생각을 전하기 어려움",
          &strings(&["공감하고 소통하기"]),
          &strings(&["도움 요청하기"]),
          "양양",
          &mut rng
        );
        assert_eq!(out, vec![
          "신뢰하는 사람과 중요한 대화 미리 연습해보기"
        , "가족이나 친구에게 대화 연습 도와달라고 요청하기"
        , "신뢰하는 가족이나 친구에게 구체적인 조언 구하기"
        ]);
    }

    #[test]
    fn pads_with_distinct_generic_solutions()
    {   for seed in 0..20
        {   let mut rng = StdRng::seed_from_u64(seed);
            let out = fallback_solutions(
              "아침에 일어나기 힘듦",
              &[],
              &strings(&["나답게 행동/말하기"]),
              "양양",
              &mut rng
            );
            assert_eq!(out.len(), SOLUTION_COUNT);
            assert_eq!(out[0], "양양의 성향과 가치관에 맞는 방식으로 대처하기");
            assert_ne!(out[1], out[2]);
        }
    }

    #[test]
    fn name_and_a_selection_are_required()
    {   let mut rng = StdRng::seed_from_u64(1);
        let body = AiSolutionsBody
        {   problem_content: Some("집중이 어려움".into())
          , selected_strength_tags: strings(&["문제를 분석하기"])
          , ..Default::default()
        };
        assert!(matches!(
          prepare(&body, &mut rng),
          Err(ApiFailure::BadRequest(_))
        ));

        let body = AiSolutionsBody
        {   problem_content: Some("집중이 어려움".into())
          , character_name: Some("양양".into())
          , selected_strength_tags: strings(&[" "])
          , ..Default::default()
        };
        assert!(matches!(
          prepare(&body, &mut rng),
          Err(ApiFailure::BadRequest(_))
        ));
    }

    #[test]
    fn prompt_carries_matching_strength_details()
    {   let mut rng = StdRng::seed_from_u64(1);
        let body = AiSolutionsBody
        {   problem_content: Some("회의 중 집중이 어려움".into())
          , character_name: Some("양양".into())
          , selected_strength_tags: strings(&["집중"])
          , strength_items: vec![
              StrengthItem
              {   text: "오래 집중해서 일함".into()
                , strength_description: Some("몰입".into())
                , ..Default::default()
              }
            , StrengthItem
              {   text: "잘 웃음".into()
                , ..Default::default()
              }
            ]
          , ..Default::default()
        };
        let (request, schema) = prepare(&body, &mut rng).unwrap();
        let context = request.value("context").unwrap();
        assert!(context.contains("- 집중"));
        assert!(context.contains("강점 내용: \"오래 집중해서 일함\""));
        assert!(!context.contains("잘 웃음"));
        assert!(!context.contains("해결방안 카테고리"));
        assert_eq!(request.value("letter"), Some("(없음)"));
        assert_eq!(schema.default_value().solutions.len(), SOLUTION_COUNT);

        let reply = r#"["메모하기", "타이머 쓰기", "산책하기"]"#;
        assert_eq!(schema.extract(reply).unwrap().solutions.len(), 3);
        assert!(schema.extract(r#"["메모하기"]"#).is_err());
    }
}
