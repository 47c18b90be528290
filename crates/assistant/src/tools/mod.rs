//! Specialist Tools Module
//!
//! Each tool wraps one SOC workflow (log triage, IOC reputation, threat
//! hunting, response planning) behind a common async trait so the CLI and
//! any future agent loop can dispatch them uniformly by name.

pub mod classifier;
pub mod intel_lookup;
pub mod ioc_analyzer;
pub mod log_analyzer;
pub mod playbook;
pub mod response_planner;
pub mod takedown;
pub mod threat_hunter;
pub mod virustotal;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::LLMProvider;
use crate::config::Config;
use crate::intel::{ThreatFoxClient, VirusTotalClient};
use crate::ioc::IocExtractor;
use crate::{Error, Result};

pub use classifier::ClassifierTool;
pub use intel_lookup::IntelLookupTool;
pub use ioc_analyzer::IocAnalyzerTool;
pub use log_analyzer::LogAnalyzerTool;
pub use playbook::PlaybookTool;
pub use response_planner::ResponsePlannerTool;
pub use takedown::TakedownTool;
pub use threat_hunter::ThreatHunterTool;
pub use virustotal::VirusTotalTool;

/// Result from tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    /// Markdown or JSON report intended for the analyst.
    pub report: String,
    /// Structured payload for downstream automation, when the tool has one.
    pub data: Option<serde_json::Value>,
}

impl ToolOutput {
    pub fn ok(report: impl Into<String>) -> Self {
        Self {
            success: true,
            report: report.into(),
            data: None,
        }
    }

    pub fn ok_with_data(report: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            report: report.into(),
            data: Some(data),
        }
    }

    pub fn failed(report: impl Into<String>) -> Self {
        Self {
            success: false,
            report: report.into(),
            data: None,
        }
    }
}

/// Common trait for all specialist tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name used for dispatch
    fn name(&self) -> &str;

    /// Get the tool description for the LLM and the CLI listing
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's argument object
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given JSON arguments
    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput>;
}

/// Shared handles the tools need: configuration, API clients, extractor
/// and the LLM provider.
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<Config>,
    pub llm: Arc<dyn LLMProvider>,
    pub virustotal: Arc<VirusTotalClient>,
    pub threatfox: Arc<ThreatFoxClient>,
    pub extractor: Arc<IocExtractor>,
}

impl ToolContext {
    pub fn new(config: Config, llm: Arc<dyn LLMProvider>) -> Self {
        let offline = config.offline_mode;
        let virustotal = Arc::new(VirusTotalClient::new(config.virustotal.clone(), offline));
        let threatfox = Arc::new(ThreatFoxClient::new(config.threatfox.clone(), offline));
        let extractor = Arc::new(IocExtractor::new(config.extractor.clone()));
        Self {
            config: Arc::new(config),
            llm,
            virustotal,
            threatfox,
            extractor,
        }
    }

    pub fn offline(&self) -> bool {
        self.config.offline_mode
    }
}

pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(args: serde_json::Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| Error::Validation(format!("Invalid tool arguments: {}", e)))
}

pub(crate) fn schema_for<T: schemars::JsonSchema>() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(serde_json::Value::Null)
}

/// Name-based dispatch table over the specialist tools.
///
/// Registration is explicit: every tool is constructed and inserted in
/// `with_defaults`, so the full toolkit is visible in one place.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Build the registry with the full specialist toolkit.
    pub fn with_defaults(ctx: ToolContext) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LogAnalyzerTool::new(ctx.clone())));
        registry.register(Arc::new(IocAnalyzerTool::new(ctx.clone())));
        registry.register(Arc::new(VirusTotalTool::new(ctx.clone())));
        registry.register(Arc::new(ThreatHunterTool::new(ctx.clone())));
        registry.register(Arc::new(IntelLookupTool::new(ctx.clone())));
        registry.register(Arc::new(ResponsePlannerTool::new(ctx.clone())));
        registry.register(Arc::new(PlaybookTool::new(ctx.clone())));
        registry.register(Arc::new(TakedownTool::new(ctx.clone())));
        registry.register(Arc::new(ClassifierTool::new(ctx)));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        info!("Registering tool: {}", tool.name());
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names in stable order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Dispatch by name. Unknown names are an error, not a panic.
    pub async fn execute(&self, name: &str, args: serde_json::Value) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Unknown tool: {}", name)))?;
        info!("Executing tool: {}", name);
        tool.execute(args).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_output_constructors() {
        let ok = ToolOutput::ok("done");
        assert!(ok.success);
        assert!(ok.data.is_none());

        let with_data = ToolOutput::ok_with_data("done", serde_json::json!({"n": 1}));
        assert_eq!(with_data.data.unwrap()["n"], 1);

        let failed = ToolOutput::failed("nope");
        assert!(!failed.success);
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("no_such_tool", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
