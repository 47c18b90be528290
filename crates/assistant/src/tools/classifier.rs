//! Security Event Classifier Tool
//!
//! Classifies an analysis report into an event type and severity. Online
//! mode asks the LLM for the three-line response format; offline mode falls
//! back to a keyword heuristic over the report text.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{parse_args, schema_for, Tool, ToolContext, ToolOutput};
use crate::agent::prompts::CLASSIFIER_PROMPT;
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClassifierArgs {
    /// The security analysis report to classify
    pub analysis_report: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub event_type: String,
    pub severity: String,
    pub reasoning: String,
}

pub struct ClassifierTool {
    ctx: ToolContext,
}

impl ClassifierTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Keyword heuristic used when no LLM is available. Checks the most
    /// severe categories first.
    fn heuristic(report: &str) -> Classification {
        let lower = report.to_lowercase();
        let rules: &[(&str, &[&str], &str)] = &[
            (
                "data_exfiltration",
                &["exfiltration", "data transfer", "dlp"],
                "critical",
            ),
            (
                "malware_infection",
                &["malware", "trojan", "ransomware", "backdoor", "botnet"],
                "high",
            ),
            (
                "network_intrusion",
                &["brute force", "lateral movement", "intrusion", "c2"],
                "high",
            ),
            (
                "phishing_attack",
                &["phishing", "credential harvest", "spoofed email"],
                "medium",
            ),
            (
                "unauthorized_access",
                &["unauthorized", "privilege escalation", "failed login"],
                "medium",
            ),
        ];

        for (event_type, keywords, severity) in rules {
            if let Some(hit) = keywords.iter().find(|kw| lower.contains(*kw)) {
                return Classification {
                    event_type: event_type.to_string(),
                    severity: severity.to_string(),
                    reasoning: format!("Report contains indicator keyword '{}'", hit),
                };
            }
        }

        Classification {
            event_type: "requires_investigation".to_string(),
            severity: "informational".to_string(),
            reasoning: "No known threat keywords found in the report".to_string(),
        }
    }

    /// Parse the three-line response: event type, severity, reasoning.
    fn parse_response(response: &str) -> Classification {
        let mut lines = response
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty());
        let event_type = lines
            .next()
            .unwrap_or("requires_investigation")
            .trim_matches('`')
            .to_string();
        let severity = lines
            .next()
            .unwrap_or("informational")
            .trim_matches('`')
            .to_lowercase();
        let reasoning = lines.collect::<Vec<_>>().join(" ");
        Classification {
            event_type,
            severity,
            reasoning,
        }
    }

    fn render(classification: &Classification) -> String {
        format!(
            "### Security Event Classification\n\n\
             - **Event Type**: {}\n\
             - **Severity**: {}\n\
             - **Reasoning**: {}",
            classification.event_type, classification.severity, classification.reasoning
        )
    }
}

#[async_trait]
impl Tool for ClassifierTool {
    fn name(&self) -> &str {
        "classifier"
    }

    fn description(&self) -> &str {
        "Classifies a security analysis report into an event type and severity"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_for::<ClassifierArgs>()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput> {
        let args: ClassifierArgs = parse_args(args)?;

        let classification = if self.ctx.offline() {
            Self::heuristic(&args.analysis_report)
        } else {
            let prompt = format!(
                "{}\n\nSecurity Analysis Report:\n{}",
                CLASSIFIER_PROMPT, args.analysis_report
            );
            let response = self
                .ctx
                .llm
                .prompt(&prompt)
                .await
                .map_err(|e| Error::Llm(e.to_string()))?;
            Self::parse_response(&response)
        };

        let report = Self::render(&classification);
        let data = json!({
            "event_type": classification.event_type,
            "severity": classification.severity,
            "reasoning": classification.reasoning,
        });
        Ok(ToolOutput::ok_with_data(report, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockProvider;
    use crate::config::Config;
    use std::sync::Arc;

    fn tool_with(offline: bool) -> ClassifierTool {
        let config = Config {
            offline_mode: offline,
            ..Config::default()
        };
        ClassifierTool::new(ToolContext::new(config, Arc::new(MockProvider)))
    }

    #[tokio::test]
    async fn offline_heuristic_flags_malware() {
        let tool = tool_with(true);
        let output = tool
            .execute(serde_json::json!({
                "analysis_report": "Endpoint detected a trojan beaconing out",
            }))
            .await
            .unwrap();
        let data = output.data.unwrap();
        assert_eq!(data["event_type"], "malware_infection");
        assert_eq!(data["severity"], "high");
    }

    #[tokio::test]
    async fn offline_heuristic_defaults_to_investigation() {
        let tool = tool_with(true);
        let output = tool
            .execute(serde_json::json!({ "analysis_report": "routine system update" }))
            .await
            .unwrap();
        let data = output.data.unwrap();
        assert_eq!(data["event_type"], "requires_investigation");
        assert_eq!(data["severity"], "informational");
    }

    #[tokio::test]
    async fn online_path_parses_three_line_response() {
        let tool = tool_with(false);
        let output = tool
            .execute(serde_json::json!({
                "analysis_report": "Multiple failed logins then success",
            }))
            .await
            .unwrap();
        let data = output.data.unwrap();
        assert_eq!(data["event_type"], "network_intrusion");
        assert_eq!(data["severity"], "high");
        assert!(data["reasoning"].as_str().unwrap().contains("lateral movement"));
    }

    #[test]
    fn parse_strips_backticks() {
        let c = ClassifierTool::parse_response("`malware_infection`\n`High`\nbecause reasons");
        assert_eq!(c.event_type, "malware_infection");
        assert_eq!(c.severity, "high");
        assert_eq!(c.reasoning, "because reasons");
    }
}
