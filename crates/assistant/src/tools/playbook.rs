//! Playbook Specialist Tool
//!
//! Generates incident-specific response playbooks as JSON, shaped for
//! ingestion by a SOC automation backend.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{parse_args, schema_for, Tool, ToolContext, ToolOutput};
use crate::agent::prompts::{fill, PLAYBOOK_PROMPT};
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlaybookArgs {
    /// Detailed incident information and context
    pub incident_data: String,
    /// Type of security incident (e.g. malware_infection, network_intrusion)
    pub incident_type: String,
    /// Severity level (critical, high, medium, low)
    #[serde(default = "default_severity")]
    pub severity: String,
    /// Comma-separated list of affected systems or hosts
    #[serde(default)]
    pub affected_systems: String,
}

fn default_severity() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Manual,
    Automated,
}

/// One playbook step, serialized with the backend's camelCase field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookStep {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub description: String,
    /// Seconds allotted before the step is flagged overdue.
    pub timeout: u64,
    pub is_required: bool,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playbook {
    pub name: String,
    pub description: String,
    pub category: String,
    pub trigger_type: String,
    pub steps: Vec<PlaybookStep>,
    pub is_active: bool,
    /// Sum of step timeouts, in seconds.
    pub estimated_time: u64,
    pub complexity_level: String,
    pub trigger_conditions: serde_json::Value,
    pub input_parameters: serde_json::Value,
    pub metadata: serde_json::Value,
}

pub struct PlaybookTool {
    ctx: ToolContext,
}

impl PlaybookTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn category_for(incident_type: &str) -> &'static str {
        match incident_type {
            "malware_infection" => "Malware Response",
            "network_intrusion" => "Network Security",
            "data_exfiltration" => "Data Protection",
            "phishing_attack" => "Email Security",
            "unauthorized_access" => "Access Control",
            "vulnerability_exploitation" => "Vulnerability Management",
            "denial_of_service" => "Service Availability",
            "insider_threat" => "Insider Threat Response",
            _ => "General Security Response",
        }
    }

    fn step(
        order: u32,
        name: &str,
        step_type: StepType,
        description: String,
        timeout: u64,
    ) -> PlaybookStep {
        PlaybookStep {
            id: format!("step-{}", order),
            name: name.to_string(),
            step_type,
            description,
            timeout,
            is_required: true,
            order,
        }
    }

    fn build_playbook(args: &PlaybookArgs) -> Playbook {
        let high_severity = matches!(args.severity.as_str(), "critical" | "high");
        let category = Self::category_for(&args.incident_type);

        let mut steps = Vec::new();
        let mut order = 1;

        steps.push(Self::step(
            order,
            "Initial Incident Assessment",
            StepType::Manual,
            format!(
                "Assess the {} incident and gather initial information about scope and impact",
                args.incident_type
            ),
            300,
        ));
        order += 1;

        match args.incident_type.as_str() {
            "malware_infection" => {
                steps.push(Self::step(
                    order,
                    "Isolate Infected Systems",
                    StepType::Automated,
                    "Automatically isolate infected systems from network to prevent malware spread"
                        .to_string(),
                    180,
                ));
                steps.push(Self::step(
                    order + 1,
                    "Malware Analysis",
                    StepType::Manual,
                    "Analyze malware sample using sandbox and threat intelligence tools"
                        .to_string(),
                    1800,
                ));
                order += 2;
            }
            "network_intrusion" => {
                steps.push(Self::step(
                    order,
                    "Block Malicious Network Traffic",
                    StepType::Automated,
                    "Configure firewall rules to block identified malicious IP addresses and ports"
                        .to_string(),
                    120,
                ));
                steps.push(Self::step(
                    order + 1,
                    "Network Forensics Analysis",
                    StepType::Manual,
                    "Analyze network logs and traffic patterns to identify attack vectors and lateral movement"
                        .to_string(),
                    2400,
                ));
                order += 2;
            }
            "data_exfiltration" => {
                steps.push(Self::step(
                    order,
                    "Block Data Transfer",
                    StepType::Automated,
                    "Implement DLP controls to prevent further unauthorized data transfers"
                        .to_string(),
                    240,
                ));
                steps.push(Self::step(
                    order + 1,
                    "Data Impact Assessment",
                    StepType::Manual,
                    "Assess which data was compromised and evaluate business impact".to_string(),
                    3600,
                ));
                order += 2;
            }
            "phishing_attack" => {
                steps.push(Self::step(
                    order,
                    "Email Quarantine",
                    StepType::Automated,
                    "Remove malicious emails from all user mailboxes and quarantine threats"
                        .to_string(),
                    300,
                ));
                steps.push(Self::step(
                    order + 1,
                    "User Communication",
                    StepType::Manual,
                    "Notify affected users and provide security awareness guidance".to_string(),
                    600,
                ));
                order += 2;
            }
            _ => {}
        }

        let evidence_timeout = if high_severity { 900 } else { 1800 };
        steps.push(Self::step(
            order,
            "Evidence Collection",
            StepType::Automated,
            "Collect digital forensics evidence including system images, logs, and memory dumps"
                .to_string(),
            evidence_timeout,
        ));
        order += 1;

        steps.push(Self::step(
            order,
            "Stakeholder Notification",
            StepType::Manual,
            "Notify relevant stakeholders including CISO, legal team, and affected business units"
                .to_string(),
            600,
        ));
        order += 1;

        let recovery_timeout = if args.severity == "critical" { 3600 } else { 7200 };
        steps.push(Self::step(
            order,
            "System Recovery",
            StepType::Manual,
            "Restore affected systems from clean backups and verify system integrity".to_string(),
            recovery_timeout,
        ));

        let estimated_time: u64 = steps.iter().map(|s| s.timeout).sum();
        let readable_type = args.incident_type.replace('_', " ");

        let affected: Vec<&str> = if args.affected_systems.is_empty() {
            Vec::new()
        } else {
            args.affected_systems.split(',').map(str::trim).collect()
        };

        let context: String = if args.incident_data.chars().count() > 200 {
            let head: String = args.incident_data.chars().take(200).collect();
            format!("{}...", head)
        } else {
            args.incident_data.clone()
        };

        Playbook {
            name: format!("{} Playbook - {}", category, title_words(&readable_type)),
            description: format!(
                "Custom playbook for {} incidents with {} severity level. Generated based on specific incident context and affected systems.",
                readable_type, args.severity
            ),
            category: category.to_string(),
            trigger_type: if high_severity { "automatic" } else { "manual" }.to_string(),
            steps,
            is_active: true,
            estimated_time,
            complexity_level: if high_severity {
                "advanced"
            } else {
                "intermediate"
            }
            .to_string(),
            trigger_conditions: json!({
                "incident_type": args.incident_type,
                "severity_threshold": args.severity,
                "affected_system_types": affected,
                "auto_trigger": high_severity,
            }),
            input_parameters: json!({
                "incident_type": args.incident_type,
                "severity": args.severity,
                "affected_systems": args.affected_systems,
            }),
            metadata: json!({
                "generated_by": "playbook_specialist",
                "incident_context": context,
            }),
        }
    }
}

#[async_trait]
impl Tool for PlaybookTool {
    fn name(&self) -> &str {
        "playbook"
    }

    fn description(&self) -> &str {
        "Generates a custom JSON response playbook for a specific incident"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_for::<PlaybookArgs>()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput> {
        let args: PlaybookArgs = parse_args(args)?;

        if self.ctx.offline() {
            info!(
                "Generating offline playbook for {} - {} severity",
                args.incident_type, args.severity
            );
            let playbook = Self::build_playbook(&args);
            let value = serde_json::to_value(&playbook)?;
            let report = serde_json::to_string_pretty(&value)?;
            return Ok(ToolOutput::ok_with_data(report, value));
        }

        let prompt = fill(
            PLAYBOOK_PROMPT,
            &[
                ("incident_data", &args.incident_data),
                ("incident_type", &args.incident_type),
                ("severity", &args.severity),
                ("affected_systems", &args.affected_systems),
            ],
        );
        let response = self
            .ctx
            .llm
            .prompt(&prompt)
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        // Prefer the model's JSON as-is; wrap free text in a minimal shell.
        match serde_json::from_str::<serde_json::Value>(&response) {
            Ok(value) => {
                let report = serde_json::to_string_pretty(&value)?;
                Ok(ToolOutput::ok_with_data(report, value))
            }
            Err(_) => {
                let wrapped = json!({
                    "name": format!("Custom Playbook - {}", title_words(&args.incident_type.replace('_', " "))),
                    "description": format!("Generated playbook for {} incident", args.incident_type),
                    "category": "Custom Response",
                    "playbookContent": response,
                });
                let report = serde_json::to_string_pretty(&wrapped)?;
                Ok(ToolOutput::ok_with_data(report, wrapped))
            }
        }
    }
}

fn title_words(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockProvider;
    use crate::config::Config;
    use std::sync::Arc;

    fn offline_tool() -> PlaybookTool {
        let ctx = ToolContext::new(Config::default(), Arc::new(MockProvider));
        PlaybookTool::new(ctx)
    }

    #[tokio::test]
    async fn malware_playbook_has_isolation_step() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "incident_data": "Endpoint beaconing to known C2",
                "incident_type": "malware_infection",
                "severity": "critical",
            }))
            .await
            .unwrap();
        let playbook: Playbook = serde_json::from_value(output.data.unwrap()).unwrap();
        assert_eq!(playbook.category, "Malware Response");
        assert_eq!(playbook.trigger_type, "automatic");
        assert_eq!(playbook.complexity_level, "advanced");
        assert!(playbook
            .steps
            .iter()
            .any(|s| s.name == "Isolate Infected Systems" && s.step_type == StepType::Automated));
    }

    #[tokio::test]
    async fn report_is_valid_json_with_camel_case_fields() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "incident_data": "Phish reported by finance",
                "incident_type": "phishing_attack",
                "severity": "medium",
            }))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output.report).unwrap();
        assert_eq!(value["triggerType"], "manual");
        assert_eq!(value["steps"][0]["isRequired"], true);
        assert_eq!(value["steps"][0]["type"], "manual");
    }

    #[tokio::test]
    async fn estimated_time_is_sum_of_step_timeouts() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "incident_data": "x",
                "incident_type": "network_intrusion",
                "severity": "low",
            }))
            .await
            .unwrap();
        let playbook: Playbook = serde_json::from_value(output.data.unwrap()).unwrap();
        let sum: u64 = playbook.steps.iter().map(|s| s.timeout).sum();
        assert_eq!(playbook.estimated_time, sum);
    }

    #[tokio::test]
    async fn unknown_incident_type_uses_general_category() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "incident_data": "x",
                "incident_type": "crypto_mining",
                "severity": "low",
            }))
            .await
            .unwrap();
        let playbook: Playbook = serde_json::from_value(output.data.unwrap()).unwrap();
        assert_eq!(playbook.category, "General Security Response");
        // Assessment, evidence, notification, recovery only.
        assert_eq!(playbook.steps.len(), 4);
    }
}
