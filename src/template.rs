//! Named prompt templates and placeholder binding.
//!
//! A template body refers to caller fragments as `{{name}}`. Binding a
//! [`PromptRequest`] substitutes every reference; a reference with no
//! bound value is a programming error and surfaces as
//! [`Error::MissingPlaceholder`].

use serde::{Deserialize, Serialize};
use log::{error, trace};

use crate::error::Error;
use crate::request::PromptRequest;

/// Every prompt the application sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateId
{   Keywords
  , KeywordsWithReflection
  , Questions
  , QuestionsWithRationale
  , ResponseLetter
  , Solutions
  , Summary
  , EmotionCheck
  , BlamePattern
  , StrengthKeywords
  , ReflectionHints
  , AiSolutions
}

impl TemplateId
{   pub const ALL: [TemplateId; 12] = [
      TemplateId::Keywords
    , TemplateId::KeywordsWithReflection
    , TemplateId::Questions
    , TemplateId::QuestionsWithRationale
    , TemplateId::ResponseLetter
    , TemplateId::Solutions
    , TemplateId::Summary
    , TemplateId::EmotionCheck
    , TemplateId::BlamePattern
    , TemplateId::StrengthKeywords
    , TemplateId::ReflectionHints
    , TemplateId::AiSolutions
    ];

    pub fn name(self) -> &'static str
    {   match self
        {   TemplateId::Keywords => "keywords"
          , TemplateId::KeywordsWithReflection => "keywords-with-reflection"
          , TemplateId::Questions => "questions"
          , TemplateId::QuestionsWithRationale => "questions-with-rationale"
          , TemplateId::ResponseLetter => "response-letter"
          , TemplateId::Solutions => "solutions"
          , TemplateId::Summary => "summary"
          , TemplateId::EmotionCheck => "emotion-check"
          , TemplateId::BlamePattern => "blame-pattern"
          , TemplateId::StrengthKeywords => "strength-keywords"
          , TemplateId::ReflectionHints => "reflection-hints"
          , TemplateId::AiSolutions => "ai-solutions"
        }
    }

    pub fn template(self) -> &'static Template
    {   match self
        {   TemplateId::Keywords => &KEYWORDS
          , TemplateId::KeywordsWithReflection => &KEYWORDS_WITH_REFLECTION
          , TemplateId::Questions => &QUESTIONS
          , TemplateId::QuestionsWithRationale => &QUESTIONS_WITH_RATIONALE
          , TemplateId::ResponseLetter => &RESPONSE_LETTER
          , TemplateId::Solutions => &SOLUTIONS
          , TemplateId::Summary => &SUMMARY
          , TemplateId::EmotionCheck => &EMOTION_CHECK
          , TemplateId::BlamePattern => &BLAME_PATTERN
          , TemplateId::StrengthKeywords => &STRENGTH_KEYWORDS
          , TemplateId::ReflectionHints => &REFLECTION_HINTS
          , TemplateId::AiSolutions => &AI_SOLUTIONS
        }
    }
}

/// A persona instruction plus a user prompt body with placeholders
#[derive(Debug)]
pub struct Template
{   pub id: TemplateId
  , pub system: &'static str
  , pub body: &'static str
}

impl Template
{   /// Placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<&'static str>
    {   let mut names: Vec<&'static str> = Vec::new();
        for segment in segments(self.body)
        {   if let Segment::Placeholder(name) = segment
            {   if !names.contains(&name)
                {   names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every placeholder from `request`
    pub fn bind(&self, request: &PromptRequest)
      -> Result<String, Error>
    {   let mut out = String::with_capacity(self.body.len());
        for segment in segments(self.body)
        {   match segment
            {   Segment::Literal(text) => out.push_str(text)
              , Segment::Placeholder(name) => {
                  match request.value(name)
                  {   Some(value) => out.push_str(value)
                    , None => {
                        error!(
                          "Template {} missing placeholder {}",
                          self.id.name(), name
                        );
                        return Err(Error::MissingPlaceholder
                        {   template: self.id.name().to_string()
                          , placeholder: name.to_string()
                        });
                      }
                  }
                }
            }
        }
        trace!("Bound {} prompt ({} bytes)", self.id.name(), out.len());
        Ok(out)
    }
}

/// Bind `request` against the template it names
pub fn bind(request: &PromptRequest) -> Result<String, Error>
{   request.template().template().bind(request)
}

enum Segment<'a>
{   Literal(&'a str)
  , Placeholder(&'a str)
}

fn segments(body: &str) -> Vec<Segment<'_>>
{   let mut out = Vec::new();
    let mut rest = body;
    while let Some(open) = rest.find("{{")
    {   let after = &rest[open + 2..];
        match after.find("}}")
        {   Some(close) => {
              if open > 0
              {   out.push(Segment::Literal(&rest[..open]));
              }
              out.push(Segment::Placeholder(after[..close].trim()));
              rest = &after[close + 2..];
            }
          , None => break
        }
    }
    if !rest.is_empty()
    {   out.push(Segment::Literal(rest));
    }
    out
}

// ===== Templates =====

const KEYWORD_SYSTEM: &str =
  "당신은 심리 상담 도우미입니다. 사용자의 텍스트를 분석하여 고민 정리에 도움이 되는 키워드를 제공합니다.";

static KEYWORDS: Template = Template
{   id: TemplateId::Keywords
  , system: KEYWORD_SYSTEM
  , body: "다음은 사용자가 편지에서 하이라이트한 내용과 질문에 대한 답변입니다:

{{texts}}

이 내용을 바탕으로 사용자가 고민을 정리할 때 도움이 될 수 있는 2-3단어 키워드를 8-10개 정도 추출해주세요.
키워드는 구체적이고 실용적이어야 하며, 사용자가 자신의 상황을 표현하는 데 도움이 되어야 합니다.
키워드는 중학생이 이해할 수 있도록 단순하고 쉬운 단어를 사용해야 합니다.

응답은 다음 형식으로 해주세요:
집중력 부족, 업무 효율성, 동료 관계, 자신감 하락, 우선순위 설정, 시간 관리, 스트레스 관리, 의사소통"
};

static KEYWORDS_WITH_REFLECTION: Template = Template
{   id: TemplateId::KeywordsWithReflection
  , system: KEYWORD_SYSTEM
  , body: "다음은 사용자가 편지에서 하이라이트한 내용과 질문에 대한 답변, 그리고 현재 작성 중인 고민입니다:

{{texts}}

이 내용을 바탕으로 사용자가 고민을 정리할 때 도움이 될 수 있는 2-3단어 키워드를 8-10개 정도 추출해주세요.
특히 현재 작성 중인 고민과 연관성이 높고 이어나갈 수 있는 키워드를 포함해주세요.
키워드는 구체적이고 실용적이어야 하며, 사용자가 자신의 상황을 표현하는 데 도움이 되어야 합니다.
키워드는 중학생이 이해할 수 있도록 단순하고 쉬운 단어를 사용해야 합니다.

응답은 다음 형식으로 해주세요:
집중력 부족, 업무 효율성, 동료 관계, 자신감 하락, 우선순위 설정, 시간 관리, 스트레스 관리, 의사소통"
};

const QUESTION_SYSTEM: &str =
  "당신은 편지를 통해 사람들의 마음을 깊이 이해하고 공감할 수 있는 질문을 만드는 전문가입니다.";

static QUESTIONS: Template = Template
{   id: TemplateId::Questions
  , system: QUESTION_SYSTEM
  , body: "다음은 누군가가 쓴 편지에서 하이라이트한 내용들입니다:

{{highlights}}

이 편지를 쓴 사람이 누구인지, 어떤 어려움을 겪고 있고, 어떤 상황에 처해있는지를 깊이 이해할 수 있도록 도와주는 질문 3개를 추천해주세요.

질문은 다음과 같은 특징을 가져야 합니다:
- 편지 작성자의 감정과 상황을 깊이 이해할 수 있는 질문
- 공감적이고 따뜻한 어조
- 구체적이고 실용적인 답변을 유도할 수 있는 질문
- 각 질문은 50자 이내

JSON 형식으로 응답해주세요:
{ \"questions\": [\"질문 1\", \"질문 2\", \"질문 3\"] }"
};

static QUESTIONS_WITH_RATIONALE: Template = Template
{   id: TemplateId::QuestionsWithRationale
  , system: QUESTION_SYSTEM
  , body: "다음은 누군가가 쓴 편지에서 하이라이트한 내용과 사용자의 생각입니다:

하이라이트한 내용:
{{highlights}}

사용자가 이 부분을 중요하게 생각하는 이유:
{{rationale}}

사용자가 이 부분을 왜 중요하게 생각했는지에 대한 통찰을 바탕으로, 편지 작성자의 심리와 상황을 더 깊이 탐구할 수 있는 질문 3개를 추천해주세요.

질문은 다음과 같은 특징을 가져야 합니다:
- 사용자의 관점과 통찰을 바탕으로 한 깊이 있는 질문
- 편지 작성자의 내면과 감정을 세밀하게 이해할 수 있는 질문
- 공감적이고 따뜻한 어조
- 각 질문은 50자 이내

JSON 형식으로 응답해주세요:
{ \"questions\": [\"질문 1\", \"질문 2\", \"질문 3\"] }"
};

static RESPONSE_LETTER: Template = Template
{   id: TemplateId::ResponseLetter
  , system: "당신은 따뜻하고 공감적인 상담사로서 진정성 있는 답장을 작성합니다."
  , body: "당신은 따뜻하고 공감적인 사람으로서 어려움을 겪고 있는 편지 화자에게 진정성 있는 답장을 작성해주세요.

**편지 화자**: {{speaker}}
**답장 작성자 정보**: {{introduction}}
**답장 작성자의 강점들**: {{strengths}}

**원본 편지 내용**:
{{letter}}

**작성자가 정리한 고민과 해결책들**:
{{problems}}

다음 구조로 답장을 작성해주세요:
1. 친근한 자기소개: \"상담사\"라는 용어 없이, {{speaker}}님께 직접 말하는 형태로
2. 편지를 받은 소감
3. 고민별 공감과 조언: 각 고민에 대해 한 문단씩, 작성자가 제시한 해결책을 바탕으로
4. 격려와 마무리

작성 가이드라인:
- 따뜻하고 진정성 있는 어조, 한국어 존댓말
- \"여러분\" 등 복수형 표현 금지, {{speaker}}님께 2인칭 단수로
- 날짜나 서명은 포함하지 말 것"
};

static SOLUTIONS: Template = Template
{   id: TemplateId::Solutions
  , system: "당신은 ADHD 전문 상담사이자 직장 적응 코치입니다. ADHD를 가진 직장인들의 구체적인 어려움을 이해하고, 실제 직장 환경에서 바로 적용할 수 있는 구체적이고 실용적인 해결책을 제시합니다. 일반적인 격려보다는 즉시 실행 가능한 행동 지침을 제공합니다."
  , body: "편지 작성자: {{speaker}} (ADHD를 가진 직장인)
편지 내용: {{letter}}

사용자가 정리한 구체적 문제: {{problem}}

사용자의 개인 경험/반영: {{reflection}}

위의 상황과 맥락을 바탕으로 \"{{speaker}}\"의 어려움에 직접적으로 도움이 될 수 있는 실용적인 해결책을 다음 3가지 카테고리에서 각각 1개씩 생성해주세요:

1. {{category_1_label}}
2. {{category_2_label}}
3. {{category_3_label}}

각 제안은:
- 3-6자 정도의 간결한 방향성 키워드 (예: \"타이머 활용하기\")
- \"~하기\" 형태의 행동 지향적 표현

응답은 다음 JSON 형식으로 해주세요:
{ \"suggestions\": [
  { \"category\": \"{{category_1}}\", \"text\": \"첫 번째 카테고리 제안\" },
  { \"category\": \"{{category_2}}\", \"text\": \"두 번째 카테고리 제안\" },
  { \"category\": \"{{category_3}}\", \"text\": \"세 번째 카테고리 제안\" }
] }"
};

static SUMMARY: Template = Template
{   id: TemplateId::Summary
  , system: "당신은 텍스트 요약 전문가입니다. 주어진 텍스트의 핵심을 2-3단어로 간결하게 요약합니다."
  , body: "다음은 사용자가 작성한 고민 내용입니다:

{{reflection}}

이 고민 내용을 2-3단어로 간단히 요약해주세요. 핵심 상황이나 문제를 나타내는 명사구 형태로 작성해주세요.

예시: \"업무 집중 어려움\", \"동료와의 갈등\", \"자신감 부족\"

JSON 형태로 다음과 같이 응답해주세요:
{\"summary\": \"요약 내용\"}"
};

static EMOTION_CHECK: Template = Template
{   id: TemplateId::EmotionCheck
  , system: "You are an emotion detection expert. Only return hasEmotion: true if the text contains explicit Korean emotion words. Be very strict."
  , body: "Text to analyze: \"{{reflection}}\"

Does this text contain explicit emotion words? Check if ANY of these emotion words are present:

Emotion words: 속상, 좌절, 불안, 화, 걱정, 실망, 부끄러, 당황, 우울, 스트레스, 분노, 슬픔, 죄책감

NOT emotion words: 집중, 피해, 실수, 어려움, 힘들, 효율, 문제, 막막

Example:
- \"회사에서 집중을 못해서 남한테 피해를 줌\" -> hasEmotion: false
- \"회사에서 집중을 못해서 스트레스를 받음\" -> hasEmotion: true

Response format (JSON):
{\"hasEmotion\": true/false, \"suggestion\": \"suggestion text\"}"
};

static BLAME_PATTERN: Template = Template
{   id: TemplateId::BlamePattern
  , system: "당신은 따뜻하고 공감적인 심리 상담 전문가입니다. 자기 비난 패턴을 부드럽게 식별하고 균형잡힌 관점을 제안 톤으로 제공합니다. \"~해보면 어떨까요?\" 같은 부드러운 제안 방식을 사용합니다."
  , body: "다음은 편지 원문과 사용자가 작성한 고민 정리 내용입니다:

편지 원문:
{{letter}}

사용자의 고민 정리:
{{reflection}}

고민 정리에 자기 비난 패턴이 있는지 확인해주세요:
- 명시적 자기 비난 (\"내가 못해서\", \"나 때문에\")
- 환경 요인은 언급하지 않고 개인 결함에만 집중
- 신경발달적 특성(ADHD 등)을 의지나 도덕의 문제로 해석

단순한 사실 서술이나 환경 요인을 함께 고려한 균형잡힌 성찰은 비난 패턴이 아닙니다.

패턴이 발견되면 편지 맥락에 맞는 구체적인 주변 요인들(각 3-5단어)을 제안해주세요.

JSON 형태로 응답해주세요:
{\"hasBlamePattern\": true/false, \"warning\": \"부드러운 관점 확장 제안 (2-3문장)\", \"environmentalFactors\": [\"요인\"]}"
};

static STRENGTH_KEYWORDS: Template = Template
{   id: TemplateId::StrengthKeywords
  , system: "당신은 사람의 강점을 분석하여 핵심 키워드를 추출하는 전문가입니다. 항상 JSON 배열 형태로 응답하며, 키워드는 1-3단어로 구성합니다."
  , body: "다음은 사용자가 {{speaker}}의 편지에서 찾아낸 강점들입니다:

{{strengths}}

각 강점을 대표할 수 있는 핵심 키워드를 생성해주세요.
- 1-3단어로 구성된 간결하고 구체적인 키워드
- 중학생도 이해할 수 있는 쉬운 단어

모든 강점의 키워드에서 중복을 제거하고 가장 대표적인 키워드를 최소 3개, 최대 8개 JSON 배열로 제공해주세요.

예: [\"집중력\", \"창의성\", \"공감능력\", \"세심함\", \"리더십\"]"
};

static REFLECTION_HINTS: Template = Template
{   id: TemplateId::ReflectionHints
  , system: "당신은 사용자의 고민 정리를 돕는 전문가입니다. 하이라이트된 내용과 사용자 분석을 바탕으로 유용한 키워드를 생성합니다."
  , body: "다음은 사용자가 {{speaker}}의 편지를 읽고 분석한 내용입니다:

{{highlights}}

위 분석 내용을 종합하여 {{speaker}}의 핵심 고민을 나타내는 짧은 구문을 5-7개 생성해주세요.
- 각 힌트는 8-12자의 짧은 구문
- {{speaker}}의 관점에서 표현

다음과 같은 형식으로 힌트만 반환해주세요:
\"업무 집중 어려움\"
\"동료 눈치에 위축감\"
\"실수로 인한 자책감\""
};

static AI_SOLUTIONS: Template = Template
{   id: TemplateId::AiSolutions
  , system: "당신은 개인화된 문제 해결 솔루션을 제공하는 전문가입니다. 사용자의 강점과 선호하는 해결방식을 고려하여 구체적이고 실행 가능한 조언을 제공합니다. 항상 JSON 배열 형태로 정확히 3개의 솔루션을 제공합니다."
  , body: "당신은 심리 상담과 문제 해결 전문가입니다. 편지 속 인물 \"{{speaker}}\"의 고민을 해결하기 위한 구체적이고 실용적인 행동 계획을 제안해주세요.

**편지 전체 내용:**
{{letter}}

**핵심 고민 (반드시 이 고민을 해결하는 솔루션이어야 함):**
\"{{problem}}\"

{{context}}

**해결방안 카테고리별 구체적 가이드 (핵심 고민 해결 중심):**
- **마음 챙기기**: 핵심 고민 상황에서 마음을 다스리고 감정을 조절하는 구체적 방법
- **주변 환경 바꾸기**: 핵심 고민이 발생하는 환경이나 상황을 개선하는 구체적 방법
- **도움 요청하기**: 핵심 고민과 관련해 구체적으로 누구에게, 어떤 도움을 요청할지 명시
- **좋은 관계 만들기**: 핵심 고민 해결을 위한 관계 개선이나 소통 방법
- **나답게 행동/말하기**: 핵심 고민 상황에서 자신다운 방식으로 대처하는 방법
- **작지만 확실한 실천**: 핵심 고민 해결을 위한 매일 실행 가능한 작은 습관
- **생각 뒤집기**: 핵심 고민에 대한 관점이나 생각을 전환하는 구체적 방법

**솔루션 생성 규칙:**
1. **정확히 3개의 솔루션**을 제안
2. 각 솔루션은 **\"~하기\" 형태의 명사형**으로 구성
3. **핵심 고민을 직접적으로 해결하는** 구체적 행동 계획 제시
4. **선택된 강점을 핵심 고민 해결에 활용**하는 방법 포함
5. **선택된 해결방안 카테고리를 핵심 고민에 적용**한 구체적 실행법
6. **{{speaker}}의 상황, 성격, 환경에 맞는** 개인화된 조언
7. **언제, 어디서, 어떻게** 할지 구체적으로 명시

**솔루션 접근법:**
{{approach}}

**응답 형식:**
반드시 JSON 배열 형태로 3개의 솔루션을 제공해주세요.
예시 (고민이 \"대화를 통해 자신의 생각을 전하는 것에 어려움\"인 경우):
[\"대화 전 핵심 메시지 3가지 미리 정리해서 메모하기\", \"상대방과 대화할 때 한 번에 하나씩 차근차근 전달하기\", \"신뢰하는 친구에게 중요한 대화 연습 도움 요청하기\"]

각 솔루션은 {{speaker}}이 바로 실행할 수 있는 구체적인 행동 계획이어야 하며, 반드시 '~하기' 형태로 끝나야 합니다."
};
