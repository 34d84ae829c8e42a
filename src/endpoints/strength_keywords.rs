//! Keywords naming the strengths a user found in the letter

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
{   model: "gpt-3.5-turbo"
  , max_tokens: 300
  , temperature: 0.7
  , policy: FallbackPolicy::Serve
  , failure_message: "강점 키워드 생성 중 오류가 발생했습니다."
};

pub const MIN_KEYWORDS: usize = 3;
pub const MAX_KEYWORDS: usize = 8;

/// Stem found in a strength's text, and the keywords it stands for
const KEYWORD_MAP: [(&str, [&str; 3]); 21] = [
  ("집중", ["집중력", "몰입력", "지속력"])
, ("창의", ["창의성", "아이디어", "독창성"])
, ("공감", ["공감능력", "마음읽기", "소통력"])
, ("디테일", ["세심함", "꼼꼼함", "정확성"])
, ("기억", ["기억력", "암기력", "정보정리"])
, ("지도", ["공간인식", "방향감각", "길찾기"])
, ("센서", ["직감", "감지력", "눈치"])
, ("수학", ["논리력", "계산력", "분석력"])
, ("원칙", ["체계성", "규칙성", "일관성"])
, ("뒤집기", ["유연성", "전환력", "적응력"])
, ("인싸", ["사교성", "친화력", "소통력"])
, ("끈기", ["끈기", "인내심", "지속력"])
, ("컴퓨터", ["IT능력", "기술력", "디지털"])
, ("독서", ["학습력", "이해력", "독해력"])
, ("글", ["문장력", "표현력", "작문력"])
, ("엉뚱", ["독창성", "창의성", "참신함"])
, ("완벽", ["완벽주의", "정확성", "꼼꼼함"])
, ("주도", ["리더십", "주도성", "이끌기"])
, ("설명", ["설명력", "전달력", "소통력"])
, ("약속", ["신뢰성", "책임감", "약속이행"])
, ("인내", ["인내심", "참을성", "끈기"])
];

const GENERIC_KEYWORDS: [&str; 3] = ["강점", "능력", "특성"];

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthItem
{   #[serde(default)]
    pub text: String
  , #[serde(default)]
    pub original_text: Option<String>
  , #[serde(default)]
    pub strength_description: Option<String>
  , #[serde(default)]
    pub strength_application: Option<String>
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthBody
{   #[serde(default)]
    pub strength_items: Vec<StrengthItem>
  , #[serde(default)]
    pub character_name: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthKeywords
{   pub keywords: Vec<String>
}

/// Keywords from the stem map, deduplicated, padded to three, capped
/// at eight.
pub fn fallback_keywords(items: &[StrengthItem]) -> Vec<String>
{   let mut keywords: Vec<String> = Vec::new();
    for item in items
    {   let text = format!(
          "{} {} {}",
          item.text,
          item.strength_description.as_deref().unwrap_or(""),
          item.strength_application.as_deref().unwrap_or("")
        );
        for (stem, mapped) in KEYWORD_MAP.iter()
        {   if text.contains(stem)
            {   for k in mapped
                {   if !keywords.iter().any(|have| have == k)
                    {   keywords.push(k.to_string());
                    }
                }
            }
        }
    }
    if keywords.len() < MIN_KEYWORDS
    {   keywords.extend(GENERIC_KEYWORDS.iter().map(|k| k.to_string()));
    }
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

fn format_strengths(items: &[StrengthItem]) -> String
{   items
      .iter()
      .enumerate()
      .map(|(i, item)| format!(
        "{}. 하이라이트된 본문: \"{}\"\n   원본 문맥: \"{}\"\n   강점 설명: \"{}\"\n   활용 상황: \"{}\"",
        i + 1,
        item.text.trim(),
        present(&item.original_text).unwrap_or("없음"),
        present(&item.strength_description).unwrap_or("없음"),
        present(&item.strength_application).unwrap_or("없음")
      ))
      .collect::<Vec<_>>()
      .join("\n\n")
}

pub fn prepare(body: &StrengthBody)
  -> Result<(PromptRequest, ExtractionSchema<StrengthKeywords>), ApiFailure>
{   let items: Vec<StrengthItem> = body.strength_items
      .iter()
      .filter(|item| !item.text.trim().is_empty())
      .cloned()
      .collect();
    if items.is_empty()
    {   return Err(ApiFailure::BadRequest("No strength items provided"));
    }

    let request = PromptRequest::new(TemplateId::StrengthKeywords)
      .with("speaker", present(&body.character_name).unwrap_or("편지 화자"))
      .with("strengths", format_strengths(&items));
    let schema = ExtractionSchema::new(
      Shape::JsonList { field: "keywords", min: MIN_KEYWORDS, max: None },
      StrengthKeywords { keywords: fallback_keywords(&items) }
    );
    Ok((request, schema))
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<StrengthBody>
) -> Result<Json<StrengthKeywords>, ApiFailure>
where S: CompletionService
{   let (request, schema) = prepare(&body)?;
    let mut out = state.generate(&SPEC, request, schema).await?;
    out.keywords.truncate(MAX_KEYWORDS);
    Ok(Json(out))
}

#[cfg(test)]
mod tests
{   use super::*;

    fn item(text: &str, description: Option<&str>) -> StrengthItem
    {   StrengthItem
        {   text: text.to_string()
          , strength_description: description.map(str::to_string)
          , ..Default::default()
        }
    }

    #[test]
    fn maps_stems_without_duplicates()
    {   let items = vec![
          item("오래 집중해서 일함", None)
        , item("끈기 있게 버팀", Some("집중을 유지함"))
        ];
        assert_eq!(
          fallback_keywords(&items),
          vec!["집중력", "몰입력", "지속력", "끈기", "인내심"]
        );
    }

    #[test]
    fn pads_when_nothing_matches()
    {   let keywords = fallback_keywords(&[item("잘 웃음", None)]);
        assert_eq!(keywords, vec!["강점", "능력", "특성"]);
    }

    #[test]
    fn caps_at_eight()
    {   let keywords = fallback_keywords(&[
          item("집중 창의 공감 디테일", None)
        ]);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
    }

    #[test]
    fn blank_items_are_rejected()
    {   let body = StrengthBody
        {   strength_items: vec![item("  ", None)]
          , character_name: None
        };
        assert!(matches!(prepare(&body), Err(ApiFailure::BadRequest(_))));
    }
}
