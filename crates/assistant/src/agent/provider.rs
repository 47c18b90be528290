//! LLM Provider Abstraction
//!
//! Provides a unified interface for different LLM providers using Rig.

use anyhow::Result;
use rig::completion::Prompt;
use rig::providers::{anthropic, openai};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "claude-3-5-sonnet".to_string(),
            api_key: None,
            temperature: Some(0.7),
            max_tokens: Some(4096),
            timeout_seconds: Some(300),
        }
    }
}

/// Trait for LLM providers that can handle prompts
#[async_trait::async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a prompt to the LLM and get a response
    async fn prompt(&self, prompt: &str) -> Result<String>;
}

/// Anthropic Claude provider using Rig
pub struct AnthropicProvider {
    client: anthropic::Client,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<String>, model: &str) -> Result<Self> {
        let client = if let Some(key) = api_key {
            anthropic::Client::new(
                &key,
                "https://api.anthropic.com",
                None,
                anthropic::ANTHROPIC_VERSION_LATEST,
            )
        } else {
            // Reads ANTHROPIC_API_KEY
            anthropic::Client::from_env()
        };

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }

    /// Map model name to Rig's model constant
    fn get_model_id(&self) -> &'static str {
        match self.model.as_str() {
            "claude-3-5-sonnet" | "claude-3-5-sonnet-20241022" => anthropic::CLAUDE_3_5_SONNET,
            "claude-3-7-sonnet" => anthropic::CLAUDE_3_7_SONNET,
            "claude-3-haiku" | "claude-3-haiku-20240307" => anthropic::CLAUDE_3_HAIKU,
            "claude-3-opus" | "claude-3-opus-20240229" => anthropic::CLAUDE_3_OPUS,
            "claude-3-sonnet" | "claude-3-sonnet-20240229" => anthropic::CLAUDE_3_SONNET,
            _ => anthropic::CLAUDE_3_5_SONNET,
        }
    }
}

#[async_trait::async_trait]
impl LLMProvider for AnthropicProvider {
    async fn prompt(&self, prompt: &str) -> Result<String> {
        let agent = self.client.agent(self.get_model_id()).build();

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| anyhow::anyhow!("Anthropic API error: {:?}", e))?;

        Ok(response)
    }
}

/// OpenAI provider using Rig
pub struct OpenAIProvider {
    client: openai::Client,
    model: String,
}

impl OpenAIProvider {
    pub fn new(api_key: Option<String>, model: &str) -> Result<Self> {
        let client = if let Some(key) = api_key {
            openai::Client::new(&key)
        } else {
            // This will use OPENAI_API_KEY env var
            openai::Client::from_env()
        };

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl LLMProvider for OpenAIProvider {
    async fn prompt(&self, prompt: &str) -> Result<String> {
        let agent = self.client.agent(&self.model).build();

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| anyhow::anyhow!("OpenAI API error: {:?}", e))?;

        Ok(response)
    }
}

/// Mock provider for offline mode and testing
pub struct MockProvider;

#[async_trait::async_trait]
impl LLMProvider for MockProvider {
    async fn prompt(&self, prompt: &str) -> Result<String> {
        // Return a canned SOC analysis based on the prompt contents
        if prompt.contains("classify") || prompt.contains("Classification") {
            Ok("network_intrusion\nhigh\n\
                Multiple failed login attempts from external addresses followed by \
                successful authentication and lateral movement indicators."
                .to_string())
        } else if prompt.contains("log") || prompt.contains("Timeline") {
            Ok("Timeline Analysis: Repeated SSH failures followed by a successful login.\n\
                Suspicious Activities: Brute force pattern, privilege escalation via sudo.\n\
                IOC Candidates: 192.168.1.100 (attack source)\n\
                Confidence Assessment: High\n\
                Recommended Follow-up: Review sudo activity and reset affected credentials."
                .to_string())
        } else {
            Ok(format!(
                "Analysis of: {}...\n\nInsufficient context for attribution. \
                 Manual review recommended.",
                prompt.chars().take(50).collect::<String>()
            ))
        }
    }
}

/// Create a provider from configuration
pub fn create_provider(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
    match config.provider.as_str() {
        "anthropic" | "claude" => {
            let provider = AnthropicProvider::new(config.api_key.clone(), &config.model)?;
            Ok(Arc::new(provider))
        }
        "openai" => {
            let provider = OpenAIProvider::new(config.api_key.clone(), &config.model)?;
            Ok(Arc::new(provider))
        }
        "mock" => Ok(Arc::new(MockProvider)),
        _ => {
            // Default to mock for unrecognized providers
            Ok(Arc::new(MockProvider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_provider_returns_canned_classification() {
        let response = tokio_test::block_on(MockProvider.prompt("please classify this event"))
            .unwrap();
        assert!(response.starts_with("network_intrusion"));
    }

    #[test]
    fn unrecognized_provider_falls_back_to_mock() {
        let config = LLMConfig {
            provider: "something-else".to_string(),
            ..LLMConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        let response = tokio_test::block_on(provider.prompt("hello")).unwrap();
        assert!(response.contains("Manual review recommended"));
    }
}
