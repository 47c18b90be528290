use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::agent::provider::LLMConfig;
use crate::ioc::ExtractorConfig;

/// VirusTotal client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirusTotalConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_vt_base_url")]
    pub base_url: String,
    /// Requests per minute (free tier: 4/min).
    #[serde(default = "default_vt_rate_limit")]
    pub rate_limit: u32,
}

fn default_vt_base_url() -> String {
    "https://www.virustotal.com/api/v3".to_string()
}

fn default_vt_rate_limit() -> u32 {
    4
}

impl Default for VirusTotalConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_vt_base_url(),
            rate_limit: default_vt_rate_limit(),
        }
    }
}

/// ThreatFox client settings. The API works without a key, with limited
/// functionality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatFoxConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_tf_base_url")]
    pub base_url: String,
    /// Delay between API requests in seconds.
    #[serde(default = "default_tf_rate_delay")]
    pub rate_limit_delay: f64,
}

fn default_tf_base_url() -> String {
    "https://threatfox-api.abuse.ch/api/v1".to_string()
}

fn default_tf_rate_delay() -> f64 {
    1.0
}

impl Default for ThreatFoxConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_tf_base_url(),
            rate_limit_delay: default_tf_rate_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// When true, all reputation lookups return deterministic mock data and
    /// the LLM provider falls back to canned responses.
    #[serde(default = "default_offline_mode")]
    pub offline_mode: bool,
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub virustotal: VirusTotalConfig,
    #[serde(default)]
    pub threatfox: ThreatFoxConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

fn default_offline_mode() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables with defaults.
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        let offline_mode = std::env::var("OFFLINE_MODE")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);

        let mut extractor = ExtractorConfig::default();
        if let Some(max) = std::env::var("IOC_MAX_RESULTS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            extractor.max_results = max;
        }

        let config = Config {
            offline_mode,
            llm: LLMConfig {
                provider: std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "mock".to_string()),
                model: std::env::var("LLM_MODEL")
                    .unwrap_or_else(|_| "claude-3-5-sonnet".to_string()),
                api_key: std::env::var("LLM_API_KEY").ok(),
                ..LLMConfig::default()
            },
            virustotal: VirusTotalConfig {
                api_key: std::env::var("VIRUSTOTAL_API_KEY").unwrap_or_default(),
                base_url: std::env::var("VT_BASE_URL").unwrap_or_else(|_| default_vt_base_url()),
                rate_limit: std::env::var("VT_RATE_LIMIT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_vt_rate_limit),
            },
            threatfox: ThreatFoxConfig {
                api_key: std::env::var("THREATFOX_API_KEY").unwrap_or_default(),
                base_url: std::env::var("THREATFOX_BASE_URL")
                    .unwrap_or_else(|_| default_tf_base_url()),
                rate_limit_delay: std::env::var("THREATFOX_RATE_DELAY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_tf_rate_delay),
            },
            extractor,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if !self.offline_mode {
            if self.virustotal.api_key.is_empty() {
                tracing::warn!(
                    "VIRUSTOTAL_API_KEY is not set. VirusTotal lookups will fall back to mock data."
                );
            }
            if self.threatfox.api_key.is_empty() {
                tracing::warn!(
                    "THREATFOX_API_KEY is not set. ThreatFox queries may be rejected."
                );
            }
        }

        if self.virustotal.rate_limit == 0 {
            return Err(crate::Error::Config(
                "VT_RATE_LIMIT must be greater than zero".to_string(),
            ));
        }
        if self.extractor.max_results == 0 {
            return Err(crate::Error::Config(
                "IOC_MAX_RESULTS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offline_mode: true,
            llm: LLMConfig::default(),
            virustotal: VirusTotalConfig::default(),
            threatfox: ThreatFoxConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_offline() {
        let config = Config::default();
        assert!(config.offline_mode);
        assert_eq!(config.virustotal.rate_limit, 4);
        assert_eq!(config.extractor.max_results, 10);
    }

    #[test]
    fn yaml_round_trip_keeps_sections() {
        let yaml = r#"
offline_mode: false
virustotal:
  api_key: "abc123"
  rate_limit: 8
extractor:
  max_results: 5
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.offline_mode);
        assert_eq!(config.virustotal.api_key, "abc123");
        assert_eq!(config.virustotal.rate_limit, 8);
        assert_eq!(config.extractor.max_results, 5);
        // Untouched sections fall back to defaults.
        assert_eq!(config.threatfox.rate_limit_delay, 1.0);
    }
}
