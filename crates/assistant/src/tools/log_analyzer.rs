//! Security Log Analyzer Tool
//!
//! Analyzes security logs and events to identify patterns, correlations,
//! and indicators of compromise.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use super::{parse_args, schema_for, Tool, ToolContext, ToolOutput};
use crate::agent::prompts::{fill, LOG_ANALYZER_PROMPT};
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LogAnalyzerArgs {
    /// Security log entries to analyze (JSON or text format)
    pub log_data: String,
    /// Time range for the analysis
    #[serde(default = "default_time_range")]
    pub time_range: String,
}

fn default_time_range() -> String {
    "24h".to_string()
}

pub struct LogAnalyzerTool {
    ctx: ToolContext,
}

impl LogAnalyzerTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn offline_report() -> String {
        let timeline = [
            "2025-01-15 14:23:12 - Multiple failed SSH login attempts from IP 192.168.1.100",
            "2025-01-15 14:25:45 - Successful login from same IP after brute force attempt",
            "2025-01-15 14:27:30 - Privilege escalation attempt detected",
            "2025-01-15 14:30:15 - Unusual file access patterns in /etc/passwd",
        ];
        let suspicious = [
            "Brute force SSH attack pattern detected",
            "Successful authentication after multiple failures",
            "Privilege escalation via sudo",
            "Access to sensitive system files",
        ];
        let ioc_candidates = [
            "IP: 192.168.1.100 (source of attack)",
            "User: admin (compromised account)",
            "Process: /usr/bin/sudo (privilege escalation)",
        ];
        let followup = [
            "Block IP 192.168.1.100 immediately",
            "Reset credentials for 'admin' account",
            "Review all sudo activity in timeframe",
            "Check for lateral movement indicators",
        ];

        let bullets = |items: &[&str]| {
            items
                .iter()
                .map(|i| format!("- {}", i))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "## Security Log Analysis Results\n\n\
             **Timeline Analysis:**\n{}\n\n\
             **Suspicious Activities:**\n{}\n\n\
             **IOC Candidates:**\n{}\n\n\
             **Confidence Assessment:** High - Clear attack pattern with successful compromise\n\n\
             **Recommended Follow-up:**\n{}",
            bullets(&timeline),
            bullets(&suspicious),
            bullets(&ioc_candidates),
            bullets(&followup),
        )
    }
}

#[async_trait]
impl Tool for LogAnalyzerTool {
    fn name(&self) -> &str {
        "log_analyzer"
    }

    fn description(&self) -> &str {
        "Analyzes security logs for suspicious patterns, attack timelines and IOC candidates"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_for::<LogAnalyzerArgs>()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput> {
        let args: LogAnalyzerArgs = parse_args(args)?;

        if self.ctx.offline() {
            return Ok(ToolOutput::ok(Self::offline_report()));
        }

        let prompt = fill(
            LOG_ANALYZER_PROMPT,
            &[
                ("log_data", &args.log_data),
                ("time_range", &args.time_range),
            ],
        );
        let response = self
            .ctx
            .llm
            .prompt(&prompt)
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        Ok(ToolOutput::ok(format!(
            "## Security Log Analysis Results\n\n{}",
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

    fn offline_tool() -> LogAnalyzerTool {
        let ctx = ToolContext::new(Config::default(), Arc::new(MockProvider));
        LogAnalyzerTool::new(ctx)
    }

    #[tokio::test]
    async fn offline_analysis_has_report_sections() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({ "log_data": "Jan 15 sshd[99]: Failed password" }))
            .await
            .unwrap();
        assert!(output.success);
        assert!(output.report.contains("Timeline Analysis"));
        assert!(output.report.contains("IOC Candidates"));
        assert!(output.report.contains("Recommended Follow-up"));
    }

    #[tokio::test]
    async fn missing_log_data_is_invalid() {
        let tool = offline_tool();
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
