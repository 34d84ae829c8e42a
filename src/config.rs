//! Configuration for the completion service and the HTTP server

use serde::{Deserialize, Serialize};
use log::debug;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// API base URL, `/chat/completions` is appended
    pub api_base: String
  , /// Bearer key; a call without one falls back
    pub api_key: Option<String>
  , /// Total per-call time budget in seconds
    pub timeout_secs: u64
}

impl Default for ProviderConfig
{   fn default() -> Self
    {   ProviderConfig
        {   api_base: DEFAULT_API_BASE.to_string()
          , api_key: None
          , timeout_secs: DEFAULT_TIMEOUT_SECS
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig
{   /// Address the HTTP server binds to
    pub bind_addr: String
  , /// Completion service configuration
    pub provider: ProviderConfig
}

impl Default for AppConfig
{   fn default() -> Self
    {   AppConfig
        {   bind_addr: DEFAULT_BIND_ADDR.to_string()
          , provider: ProviderConfig::default()
        }
    }
}

impl AppConfig
{   /// Build configuration from the process environment
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable lookup, defaults for the
    /// variables it does not know.
    pub fn from_lookup<F>(lookup: F)
      -> Result<Self, crate::error::Error>
    where F: Fn(&str) -> Option<String>
    {   let mut config = AppConfig::default();

        if let Some(addr) = non_blank(lookup("LETTER_BIND_ADDR"))
        {   config.bind_addr = addr;
        }
        if let Some(base) = non_blank(lookup("OPENAI_API_BASE"))
        {   config.provider.api_base
              = base.trim_end_matches('/').to_string();
        }
        config.provider.api_key
          = non_blank(lookup("OPENAI_API_KEY"));

        if let Some(raw) = non_blank(lookup("COMPLETION_TIMEOUT_SECS"))
        {   let secs: u64 = raw.parse().map_err(|_| {
              crate::error::Error::InvalidConfiguration(
                format!("COMPLETION_TIMEOUT_SECS={}", raw)
              )
            })?;
            if secs == 0
            {   return Err(crate::error::Error::InvalidConfiguration(
                  "COMPLETION_TIMEOUT_SECS must be positive"
                    .to_string()
                ));
            }
            config.provider.timeout_secs = secs;
        }

        debug!(
          "Loaded config: bind={} api_base={} key_set={}",
          config.bind_addr,
          config.provider.api_base,
          config.provider.api_key.is_some()
        );
        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String>
{   value
      .map(|v| v.trim().to_string())
      .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::collections::HashMap;

    fn lookup_from(
      pairs: &[(&str, &str)]
    ) -> impl Fn(&str) -> Option<String>
    {   let map: HashMap<String, String> = pairs
          .iter()
          .map(|(k, v)| (k.to_string(), v.to_string()))
          .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty()
    {   let config = AppConfig::from_lookup(lookup_from(&[]))
          .unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.provider.api_base, DEFAULT_API_BASE);
        assert_eq!(config.provider.timeout_secs, 30);
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn reads_overrides()
    {   let config = AppConfig::from_lookup(lookup_from(&[
          ("LETTER_BIND_ADDR", "0.0.0.0:8080")
        , ("OPENAI_API_BASE", "http://localhost:9000/v1/")
        , ("OPENAI_API_KEY", "sk-test")
        , ("COMPLETION_TIMEOUT_SECS", "5")
        ])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(
          config.provider.api_base,
          "http://localhost:9000/v1"
        );
        assert_eq!(
          config.provider.api_key.as_deref(),
          Some("sk-test")
        );
        assert_eq!(config.provider.timeout_secs, 5);
    }

    #[test]
    fn blank_key_counts_as_missing()
    {   let config = AppConfig::from_lookup(lookup_from(&[
          ("OPENAI_API_KEY", "   ")
        ])).unwrap();
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn rejects_bad_timeout()
    {   let err = AppConfig::from_lookup(lookup_from(&[
          ("COMPLETION_TIMEOUT_SECS", "soon")
        ])).unwrap_err();
        assert!(matches!(
          err,
          crate::error::Error::InvalidConfiguration(_)
        ));

        let err = AppConfig::from_lookup(lookup_from(&[
          ("COMPLETION_TIMEOUT_SECS", "0")
        ])).unwrap_err();
        assert!(matches!(
          err,
          crate::error::Error::InvalidConfiguration(_)
        ));
    }
}
