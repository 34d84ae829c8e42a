//! Turning raw completion text into typed values.
//!
//! An [`ExtractionSchema`] names the shape the reply should have, the field
//! types inside it, and the default handed back when anything goes wrong.
//! Every shape is first normalised into a `serde_json::Value`, validated,
//! and only then deserialised into `T`, so a value that reaches the caller
//! always has the declared shape.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::FailureReason;

/// Type of one named field inside an object reply
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind
{   /// Any JSON string, empty included
    Text
  , /// JSON boolean
    Flag
  , /// Array of strings with length bounds
    TextList
    {   min: usize
      , max: Option<usize>
    }
  , /// Array of objects, each with its own fields
    Records
    {   min: usize
      , max: Option<usize>
      , fields: Vec<Field>
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field
{   pub name: &'static str
  , pub kind: FieldKind
}

impl Field
{   pub fn text(name: &'static str) -> Self
    {   Field { name, kind: FieldKind::Text }
    }

    pub fn flag(name: &'static str) -> Self
    {   Field { name, kind: FieldKind::Flag }
    }

    pub fn text_list(
      name: &'static str
    , min: usize
    , max: Option<usize>
    ) -> Self
    {   Field { name, kind: FieldKind::TextList { min, max } }
    }

    pub fn records(
      name: &'static str
    , min: usize
    , max: Option<usize>
    , fields: Vec<Field>
    ) -> Self
    {   Field { name, kind: FieldKind::Records { min, max, fields } }
    }
}

/// Overall shape of the reply text
#[derive(Debug, Clone, PartialEq)]
pub enum Shape
{   /// JSON object with the given required fields
    Object(Vec<Field>)
  , /// Bare JSON array of strings, placed under `field`
    JsonList
    {   field: &'static str
      , min: usize
      , max: Option<usize>
    }
  , /// `a, b, c` style text, placed under `field`
    Delimited
    {   delimiter: char
      , field: &'static str
    }
  , /// Quoted phrases, else one phrase per line; at most `max` kept
    Lines
    {   field: &'static str
      , max: usize
    }
  , /// The whole reply as one string under `field`
    Scalar
    {   field: &'static str
    }
}

/// How to read `T` out of a reply, and what to use when that fails
pub struct ExtractionSchema<T>
{   shape: Shape
  , default: T
  , check: Option<fn(&T) -> bool>
}

impl<T: DeserializeOwned> ExtractionSchema<T>
{   pub fn new(shape: Shape, default: T) -> Self
    {   ExtractionSchema
        {   shape
          , default
          , check: None
        }
    }

    /// Extra domain rule; a value failing it counts as a schema mismatch.
    pub fn with_check(mut self, check: fn(&T) -> bool) -> Self
    {   self.check = Some(check);
        self
    }

    /// Read `T` from `raw`, or say why not.
    pub fn extract(&self, raw: &str) -> Result<T, FailureReason>
    {   if raw.trim().is_empty()
        {   return Err(FailureReason::EmptyResponse);
        }

        let value = normalise(&self.shape, raw)?;
        let parsed: T = serde_json::from_value(value).map_err(|e| {
          debug!("Reply did not deserialise: {}", e);
          FailureReason::SchemaMismatch
        })?;

        if let Some(check) = self.check
        {   if !check(&parsed)
            {   debug!("Reply failed domain check");
                return Err(FailureReason::SchemaMismatch);
            }
        }
        Ok(parsed)
    }
}

impl<T> ExtractionSchema<T>
{   pub fn shape(&self) -> &Shape
    {   &self.shape
    }

    pub fn default_value(&self) -> &T
    {   &self.default
    }

    pub fn into_default(self) -> T
    {   self.default
    }
}

/// Remove a ```` ``` ```` or ```` ```json ```` fence around a reply.
/// Text without a fence comes back trimmed.
pub fn strip_fences(raw: &str) -> &str
{   let trimmed = raw.trim();
    let open = match trimmed.find("```")
    {   Some(open) => open
      , None => return trimmed
    };
    let after = &trimmed[open + 3..];
    let body_start = match after.find('\n')
    {   Some(nl) if after[..nl]
          .trim()
          .chars()
          .all(|c| c.is_ascii_alphanumeric()) => nl + 1
      , _ if after.starts_with("json") => 4
      , _ => 0
    };
    let body = &after[body_start..];
    match body.find("```")
    {   Some(close) => body[..close].trim()
      , None => body.trim()
    }
}

/// Split on `delimiter`, trim, drop empties.
pub fn split_delimited(raw: &str, delimiter: char) -> Vec<String>
{   raw
      .split(delimiter)
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .collect()
}

/// Quoted phrases if there are any, otherwise cleaned-up lines.
pub fn split_lines(raw: &str) -> Vec<String>
{   let quoted: Vec<String> = quoted_re()
      .captures_iter(raw)
      .map(|c| c[1].trim().to_string())
      .filter(|s| !s.is_empty())
      .collect();
    if !quoted.is_empty()
    {   return quoted;
    }

    raw
      .lines()
      .map(|line| {
        let line = line.trim();
        let line = marker_re().replace(line, "");
        line.replace(['[', ']'], "").trim().to_string()
      })
      .filter(|hint| {
        let n = hint.chars().count();
        n > 2 && n < 50
      })
      .collect()
}

fn quoted_re() -> &'static Regex
{   static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
      Regex::new(r#""([^"]+)""#).expect("static regex")
    })
}

fn marker_re() -> &'static Regex
{   static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
      Regex::new(r"^(?:\d+\.\s*|[-•*]\s*|[가-힣]+\.\s*)")
        .expect("static regex")
    })
}

fn normalise(shape: &Shape, raw: &str)
  -> Result<Value, FailureReason>
{   match shape
    {   Shape::Object(fields) => {
          let value = parse_json(strip_fences(raw))?;
          match &value
          {   Value::Object(map) => {
                validate_fields(fields, map)
                  .map_err(mismatch)?;
              }
            , _ => return Err(mismatch("reply is not an object".into()))
          }
          Ok(value)
        }
      , Shape::JsonList { field, min, max } => {
          let value = parse_json(strip_fences(raw))?;
          validate_kind(
            field,
            &FieldKind::TextList { min: *min, max: *max },
            &value
          ).map_err(mismatch)?;
          Ok(wrap(field, value))
        }
      , Shape::Delimited { delimiter, field } => {
          let items = split_delimited(raw, *delimiter);
          if items.is_empty()
          {   return Err(mismatch("no delimited items".into()));
          }
          Ok(wrap(field, Value::from(items)))
        }
      , Shape::Lines { field, max } => {
          let mut items = split_lines(raw);
          if items.is_empty()
          {   return Err(mismatch("no usable lines".into()));
          }
          items.truncate(*max);
          Ok(wrap(field, Value::from(items)))
        }
      , Shape::Scalar { field } => {
          Ok(wrap(field, Value::from(raw.trim())))
        }
    }
}

fn parse_json(text: &str) -> Result<Value, FailureReason>
{   serde_json::from_str(text).map_err(|e| {
      debug!("Reply is not JSON: {}", e);
      FailureReason::ParseError
    })
}

fn wrap(field: &str, value: Value) -> Value
{   let mut map = Map::new();
    map.insert(field.to_string(), value);
    Value::Object(map)
}

fn mismatch(detail: String) -> FailureReason
{   debug!("Schema mismatch: {}", detail);
    FailureReason::SchemaMismatch
}

fn validate_fields(fields: &[Field], map: &Map<String, Value>)
  -> Result<(), String>
{   for field in fields
    {   let value = map
          .get(field.name)
          .ok_or_else(|| format!("missing field {}", field.name))?;
        validate_kind(field.name, &field.kind, value)?;
    }
    Ok(())
}

fn validate_kind(name: &str, kind: &FieldKind, value: &Value)
  -> Result<(), String>
{   match kind
    {   FieldKind::Text => {
          if value.is_string() { Ok(()) }
          else { Err(format!("{} is not a string", name)) }
        }
      , FieldKind::Flag => {
          if value.is_boolean() { Ok(()) }
          else { Err(format!("{} is not a boolean", name)) }
        }
      , FieldKind::TextList { min, max } => {
          let items = value
            .as_array()
            .ok_or_else(|| format!("{} is not an array", name))?;
          check_len(name, items.len(), *min, *max)?;
          if items.iter().all(Value::is_string) { Ok(()) }
          else { Err(format!("{} holds a non-string", name)) }
        }
      , FieldKind::Records { min, max, fields } => {
          let items = value
            .as_array()
            .ok_or_else(|| format!("{} is not an array", name))?;
          check_len(name, items.len(), *min, *max)?;
          for item in items
          {   let map = item
                .as_object()
                .ok_or_else(|| format!("{} holds a non-object", name))?;
              validate_fields(fields, map)?;
          }
          Ok(())
        }
    }
}

fn check_len(name: &str, len: usize, min: usize, max: Option<usize>)
  -> Result<(), String>
{   if len < min
    {   return Err(format!("{} has {} items, need {}", name, len, min));
    }
    match max
    {   Some(max) if len > max => {
          Err(format!("{} has {} items, max {}", name, len, max))
        }
      , _ => Ok(())
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Keywords
    {   keywords: Vec<String>
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Summary
    {   summary: String
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Blame
    {   has_blame_pattern: bool
      , warning: String
      , environmental_factors: Vec<String>
    }

    fn summary_schema() -> ExtractionSchema<Summary>
    {   ExtractionSchema::new(
          Shape::Object(vec![Field::text("summary")]),
          Summary { summary: "이 상황".to_string() }
        )
    }

    #[test]
    fn delimited_drops_blank_segments()
    {   let schema = ExtractionSchema::new(
          Shape::Delimited { delimiter: ',', field: "keywords" },
          Keywords { keywords: vec![] }
        );
        let out = schema.extract("a, b, ,c").unwrap();
        assert_eq!(out.keywords, vec!["a", "b", "c"]);
    }

    #[test]
    fn delimited_of_only_commas_is_mismatch()
    {   let schema = ExtractionSchema::new(
          Shape::Delimited { delimiter: ',', field: "keywords" },
          Keywords { keywords: vec![] }
        );
        assert_eq!(
          schema.extract(" , ,"),
          Err(FailureReason::SchemaMismatch)
        );
    }

    #[test]
    fn fenced_and_bare_json_extract_the_same()
    {   let schema = summary_schema();
        let bare = schema.extract(r#"{"summary": "자신감 부족"}"#);
        let fenced = schema.extract(
          "```json\n{\"summary\": \"자신감 부족\"}\n```"
        );
        let plain_fence = schema.extract(
          "```\n{\"summary\": \"자신감 부족\"}\n```"
        );
        assert_eq!(bare, fenced);
        assert_eq!(bare, plain_fence);
        assert_eq!(
          bare.unwrap().summary,
          "자신감 부족"
        );
    }

    #[test]
    fn fence_with_surrounding_prose()
    {   let raw = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(strip_fences(raw), "{\"a\": 1}");
        assert_eq!(strip_fences("```json{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn prose_is_a_parse_error()
    {   assert_eq!(
          summary_schema().extract("요약하자면 자신감 부족입니다."),
          Err(FailureReason::ParseError)
        );
    }

    #[test]
    fn blank_reply_is_empty_response()
    {   assert_eq!(
          summary_schema().extract("  \n "),
          Err(FailureReason::EmptyResponse)
        );
    }

    #[test]
    fn missing_field_is_schema_mismatch()
    {   assert_eq!(
          summary_schema().extract(r#"{"title": "자신감 부족"}"#),
          Err(FailureReason::SchemaMismatch)
        );
        assert_eq!(
          summary_schema().extract(r#"{"summary": 3}"#),
          Err(FailureReason::SchemaMismatch)
        );
        assert_eq!(
          summary_schema().extract(r#"["자신감 부족"]"#),
          Err(FailureReason::SchemaMismatch)
        );
    }

    #[test]
    fn object_with_lists_and_flags()
    {   let schema = ExtractionSchema::new(
          Shape::Object(vec![
            Field::flag("hasBlamePattern")
          , Field::text("warning")
          , Field::text_list("environmentalFactors", 0, None)
          ]),
          Blame
          {   has_blame_pattern: false
            , warning: String::new()
            , environmental_factors: vec![]
          }
        );
        let out = schema.extract(
          r#"{"hasBlamePattern": true, "warning": "환경도 살펴보면 어떨까요?",
              "environmentalFactors": ["회의실 소음", "업무 할당 방식"]}"#
        ).unwrap();
        assert!(out.has_blame_pattern);
        assert_eq!(out.environmental_factors.len(), 2);

        assert_eq!(
          schema.extract(
            r#"{"hasBlamePattern": "yes", "warning": "", "environmentalFactors": []}"#
          ),
          Err(FailureReason::SchemaMismatch)
        );
    }

    #[test]
    fn json_list_respects_bounds()
    {   let schema = ExtractionSchema::new(
          Shape::JsonList { field: "keywords", min: 3, max: None },
          Keywords { keywords: vec![] }
        );
        assert_eq!(
          schema.extract(r#"["집중력", "창의성", "공감능력"]"#)
            .unwrap()
            .keywords
            .len(),
          3
        );
        assert_eq!(
          schema.extract(r#"["집중력"]"#),
          Err(FailureReason::SchemaMismatch)
        );
        assert_eq!(
          schema.extract(r#"["집중력", 2, "공감능력"]"#),
          Err(FailureReason::SchemaMismatch)
        );
    }

    #[test]
    fn records_validate_each_item()
    {   #[derive(Debug, Deserialize)]
        struct Out
        {   suggestions: Vec<Item>
        }
        #[derive(Debug, Deserialize)]
        struct Item
        {   category: String
          , text: String
        }

        let schema = ExtractionSchema::new(
          Shape::Object(vec![Field::records(
            "suggestions", 2, Some(2),
            vec![Field::text("category"), Field::text("text")]
          )]),
          Out { suggestions: vec![] }
        );
        let ok = schema.extract(
          r#"{"suggestions": [{"category": "a", "text": "x"},
                              {"category": "b", "text": "y"}]}"#
        ).unwrap();
        assert_eq!(ok.suggestions[1].category, "b");
        assert_eq!(ok.suggestions[0].text, "x");

        assert!(schema.extract(
          r#"{"suggestions": [{"category": "a"}, {"category": "b", "text": "y"}]}"#
        ).is_err());
        assert!(schema.extract(
          r#"{"suggestions": [{"category": "a", "text": "x"}]}"#
        ).is_err());
    }

    #[test]
    fn check_rejects_values()
    {   let schema = summary_schema()
          .with_check(|s| !s.summary.trim().is_empty());
        assert_eq!(
          schema.extract(r#"{"summary": "  "}"#),
          Err(FailureReason::SchemaMismatch)
        );
    }

    #[test]
    fn lines_prefer_quoted_phrases()
    {   let raw = "힌트입니다:\n\"업무 집중 어려움\"\n\"동료 눈치에 위축감\"";
        assert_eq!(
          split_lines(raw),
          vec!["업무 집중 어려움", "동료 눈치에 위축감"]
        );
    }

    #[test]
    fn lines_strip_list_markers()
    {   let raw = "1. 업무 집중 어려움\n- 동료 눈치에 위축감\n• [실수로 인한 자책감]\n가. 혼란스러운 우선순위\n\n이";
        assert_eq!(
          split_lines(raw),
          vec![
            "업무 집중 어려움"
          , "동료 눈치에 위축감"
          , "실수로 인한 자책감"
          , "혼란스러운 우선순위"
          ]
        );
    }

    #[test]
    fn lines_are_truncated()
    {   #[derive(Debug, Deserialize)]
        struct Hints
        {   hints: Vec<String>
        }
        let schema = ExtractionSchema::new(
          Shape::Lines { field: "hints", max: 2 },
          Hints { hints: vec![] }
        );
        let out = schema.extract("\"하나하나\" \"둘둘둘\" \"셋셋셋\"").unwrap();
        assert_eq!(out.hints, vec!["하나하나", "둘둘둘"]);
    }

    #[test]
    fn scalar_takes_whole_reply()
    {   #[derive(Debug, Deserialize)]
        struct Letter
        {   letter: String
        }
        let schema = ExtractionSchema::new(
          Shape::Scalar { field: "letter" },
          Letter { letter: String::new() }
        );
        let out = schema.extract("\n안녕하세요, 양양님.\n\n반가워요.\n").unwrap();
        assert_eq!(out.letter, "안녕하세요, 양양님.\n\n반가워요.");
    }
}
