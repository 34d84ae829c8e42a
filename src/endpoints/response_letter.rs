//! Drafting the user's reply to the letter they received

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{present, ApiFailure, AppState, EndpointSpec, FallbackPolicy};
use crate::extract::{ExtractionSchema, Shape};
use crate::providers::CompletionService;
use crate::request::{join_fragments, PromptRequest};
use crate::template::TemplateId;

pub const SPEC: EndpointSpec = EndpointSpec
{   model: "gpt-4"
  , max_tokens: 4000
  , temperature: 0.7
  , policy: FallbackPolicy::Surface
  , failure_message: "답장 생성 중 오류가 발생했습니다."
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterBody
{   #[serde(default)]
    pub user_nickname: Option<String>
  , #[serde(default)]
    pub character_name: Option<String>
  , #[serde(default)]
    pub original_letter: Option<String>
  , #[serde(default)]
    pub user_introduction: Option<String>
  , #[serde(default)]
    pub reflection_items: Vec<ReflectionItem>
  , #[serde(default)]
    pub strength_items: Vec<StrengthRef>
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionItem
{   #[serde(default)]
    pub content: Option<String>
  , #[serde(default)]
    pub solution_inputs: Vec<SolutionInput>
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SolutionInput
{   #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct StrengthRef
{   #[serde(default)]
    pub text: Option<String>
}

/// A problem the user worked on and the solutions they wrote for it
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSolutions
{   pub problem: String
  , pub solutions: Vec<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct LetterDraft
{   pub letter: String
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterMetadata
{   pub user_nickname: Option<String>
  , pub character_name: String
  , pub generated_at: DateTime<Utc>
}

#[derive(Debug, Clone, Serialize)]
pub struct LetterReply
{   pub success: bool
  , pub letter: String
  , pub metadata: LetterMetadata
}

/// Problems that have text and at least one non-blank solution
pub fn problem_solutions(items: &[ReflectionItem]) -> Vec<ProblemSolutions>
{   items
      .iter()
      .filter_map(|item| {
        let problem = present(&item.content)?.to_string();
        let solutions: Vec<String> = item.solution_inputs
          .iter()
          .filter_map(|s| present(&s.content))
          .map(str::to_string)
          .collect();
        if solutions.is_empty() { None }
        else { Some(ProblemSolutions { problem, solutions }) }
      })
      .collect()
}

fn format_problems(problems: &[ProblemSolutions]) -> String
{   problems
      .iter()
      .enumerate()
      .map(|(i, p)| format!(
        "{}. 고민: {}\n   해결책: {}",
        i + 1, p.problem, p.solutions.join(", ")
      ))
      .collect::<Vec<_>>()
      .join("\n\n")
}

pub fn prepare(body: &LetterBody)
  -> Result<(PromptRequest, ExtractionSchema<LetterDraft>), ApiFailure>
{   let speaker = present(&body.character_name)
      .ok_or(ApiFailure::BadRequest("characterName is required"))?;
    let letter = present(&body.original_letter)
      .ok_or(ApiFailure::BadRequest("originalLetter is required"))?;
    let problems = problem_solutions(&body.reflection_items);
    if problems.is_empty()
    {   return Err(ApiFailure::BadRequest(
          "reflectionItems with at least one solution are required"
        ));
    }

    let strengths = join_fragments(
      body.strength_items.iter().filter_map(|s| s.text.as_deref()),
      ", "
    );
    let request = PromptRequest::new(TemplateId::ResponseLetter)
      .with("speaker", speaker)
      .with(
        "introduction",
        present(&body.user_introduction).unwrap_or("평범한 사람")
      )
      .with(
        "strengths",
        if strengths.is_empty() { "없음" } else { strengths.as_str() }
      )
      .with("letter", letter)
      .with("problems", format_problems(&problems));

    let schema = ExtractionSchema::new(
      Shape::Scalar { field: "letter" },
      LetterDraft { letter: String::new() }
    );
    Ok((request, schema))
}

pub async fn handle<S>(
  State(state): State<Arc<AppState<S>>>
, Json(body): Json<LetterBody>
) -> Result<Json<LetterReply>, ApiFailure>
where S: CompletionService
{   let (request, schema) = prepare(&body)?;
    let draft = state.generate(&SPEC, request, schema).await?;
    Ok(Json(LetterReply
    {   success: true
      , letter: draft.letter
      , metadata: LetterMetadata
        {   user_nickname: present(&body.user_nickname).map(str::to_string)
          , character_name: present(&body.character_name)
              .unwrap_or_default()
              .to_string()
          , generated_at: Utc::now()
        }
    }))
}
