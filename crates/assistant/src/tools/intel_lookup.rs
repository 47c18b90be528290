//! Threat Intelligence Lookup Tool
//!
//! Queries threat intelligence context for a set of IOCs, including campaign
//! attribution and attack technique mapping.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use super::{parse_args, schema_for, Tool, ToolContext, ToolOutput};
use crate::agent::prompts::{fill, INTEL_LOOKUP_PROMPT};
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IntelLookupArgs {
    /// IOCs to look up, one per line or comma-separated
    pub ioc_list: String,
    /// Type of threat being investigated
    #[serde(default = "default_threat_type")]
    pub threat_type: String,
}

fn default_threat_type() -> String {
    "unknown".to_string()
}

pub struct IntelLookupTool {
    ctx: ToolContext,
}

impl IntelLookupTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn offline_report() -> &'static str {
        "## Threat Intelligence Analysis Results\n\n\
         **IOC Analysis Results:**\n\
         - 192.168.1.100: High Risk - Associated with APT29 campaigns, known C2 infrastructure\n\
         - admin@malicious.com: Medium Risk - Linked to phishing campaigns, first seen 2024-12\n\
         - c:\\temp\\backdoor.exe: Critical Risk - Known malware family 'SilentDrop', detected by 45/70 engines\n\n\
         **Threat Campaign Match:** APT29 (Cozy Bear) - Operation Ghost Writer\n\n\
         **Attack Techniques:**\n\
         - T1110 (Brute Force)\n\
         - T1078 (Valid Accounts)\n\
         - T1055 (Process Injection)\n\n\
         **Confidence Level:** High - Multiple corroborating sources\n\n\
         **Additional Context:** This IOC set matches recent APT29 infrastructure rotation patterns observed in Q4 2024."
    }
}

#[async_trait]
impl Tool for IntelLookupTool {
    fn name(&self) -> &str {
        "intel_lookup"
    }

    fn description(&self) -> &str {
        "Queries threat intelligence sources for IOC attribution and campaign context"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_for::<IntelLookupArgs>()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput> {
        let args: IntelLookupArgs = parse_args(args)?;

        if self.ctx.offline() {
            return Ok(ToolOutput::ok(Self::offline_report()));
        }

        let prompt = fill(
            INTEL_LOOKUP_PROMPT,
            &[
                ("ioc_list", &args.ioc_list),
                ("threat_type", &args.threat_type),
            ],
        );
        let response = self
            .ctx
            .llm
            .prompt(&prompt)
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        Ok(ToolOutput::ok(format!(
            "## Threat Intelligence Analysis Results\n\n{}",
            response
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockProvider;
    use crate::config::Config;
    use std::sync::Arc;

    #[tokio::test]
    async fn offline_intel_includes_campaign_attribution() {
        let ctx = ToolContext::new(Config::default(), Arc::new(MockProvider));
        let tool = IntelLookupTool::new(ctx);
        let output = tool
            .execute(serde_json::json!({ "ioc_list": "192.168.1.100" }))
            .await
            .unwrap();
        assert!(output.report.contains("APT29"));
        assert!(output.report.contains("T1110"));
    }
}
