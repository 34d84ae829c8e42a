use serde::{Deserialize, Serialize};
use log::{debug, trace, error};
use async_trait::async_trait;

use crate::config::ProviderConfig;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub max_tokens: usize
  , pub temperature: f32
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse
{   pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ReplyMessage
  , pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyMessage
{   #[serde(default)]
    pub content: Option<String>
}

// ===== Client =====

/// OpenAI-compatible chat-completions client
pub struct OpenAiClient
{   api_base: String
  , api_key: Option<String>
  , http_client: reqwest::Client
}

impl OpenAiClient
{   pub fn new(config: &ProviderConfig) -> Self
    {   debug!("Creating OpenAiClient for {}", config.api_base);
        OpenAiClient
        {   api_base: config.api_base.clone()
          , api_key: config.api_key.clone()
          , http_client: reqwest::Client::new()
        }
    }

    pub fn endpoint(&self) -> String
    {   format!("{}/chat/completions", self.api_base)
    }

    fn api_key(&self) -> Result<&str, crate::error::Error>
    {   self.api_key.as_deref().ok_or_else(|| {
          error!("No API key configured");
          crate::error::Error::MissingApiKey("openai".to_string())
        })
    }

    /// Request body for one system+user exchange
    pub fn build_request(
      system: &str
    , prompt: &str
    , options: &crate::CompletionOptions
    ) -> ChatRequest
    {   ChatRequest
        {   model: options.model.clone()
          , messages: vec![
              ChatMessage
              {   role: "system".to_string()
                , content: system.to_string()
              }
            , ChatMessage
              {   role: "user".to_string()
                , content: prompt.to_string()
              }
            ]
          , max_tokens: options.max_tokens
          , temperature: options.temperature
        }
    }
}

#[async_trait]
impl super::CompletionService for OpenAiClient
{   async fn send(
      &self
    , system: &str
    , prompt: &str
    , options: &crate::CompletionOptions
    ) -> Result<String, crate::error::Error>
    {   debug!("Sending completion to model: {}", options.model);

        let api_key = self.api_key()?;
        let request = Self::build_request(system, prompt, options);

        trace!("OpenAI request: {:?}", request);

        let response = self.http_client
          .post(self.endpoint())
          .header("Authorization", format!("Bearer {}", api_key))
          .header("Content-Type", "application/json")
          .json(&request)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        trace!("OpenAI response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("OpenAI API error: {}", error_text);
            return Err(crate::error::Error::ApiError
            {   status: status.as_u16()
              , body: error_text
            });
        }

        let chat_response: ChatResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            crate::error::Error::ParseError(e.to_string())
          })?;

        let text = chat_response.choices
          .into_iter()
          .next()
          .and_then(|c| c.message.content)
          .map(|t| t.trim().to_string())
          .unwrap_or_default();

        if text.is_empty()
        {   error!("No content in response");
            return Err(crate::error::Error::EmptyResponse);
        }
        trace!("OpenAI reply: {}", text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::providers::CompletionService;

    #[test]
    fn request_carries_persona_and_prompt()
    {   let options = crate::CompletionOptions::new(
          "gpt-3.5-turbo", 200, 0.7
        );
        let req = OpenAiClient::build_request("persona", "prompt", &options);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 200);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "persona");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "prompt");
    }

    #[test]
    fn response_without_content_decodes()
    {   let body = r#"{"choices": [{"message": {"role": "assistant"}, "finish_reason": "length"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn missing_key_fails_without_calling_out()
    {   let client = OpenAiClient::new(&ProviderConfig::default());
        let options = crate::CompletionOptions::new("gpt-4", 10, 0.7);
        let err = client.send("s", "p", &options).await.unwrap_err();
        assert_eq!(
          err,
          crate::error::Error::MissingApiKey("openai".to_string())
        );
    }
}
