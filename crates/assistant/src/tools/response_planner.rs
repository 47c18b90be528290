//! Incident Response Planner Tool
//!
//! Generates phased incident response plans from threat type, severity and
//! affected systems.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use super::{parse_args, schema_for, Tool, ToolContext, ToolOutput};
use crate::agent::prompts::{fill, RESPONSE_PLANNER_PROMPT};
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResponsePlannerArgs {
    /// Type of security threat identified
    pub threat_type: String,
    /// Severity level (critical, high, medium, low)
    #[serde(default = "default_severity")]
    pub severity_level: String,
    /// Affected systems or assets
    #[serde(default)]
    pub affected_systems: String,
}

fn default_severity() -> String {
    "medium".to_string()
}

pub struct ResponsePlannerTool {
    ctx: ToolContext,
}

impl ResponsePlannerTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn title_case(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn offline_report(threat_type: &str, severity: &str) -> String {
        format!(
            "## Incident Response Plan: {} - {} Severity\n\n\
             ### Immediate Response Actions (0-1 hours)\n\
             - **CONTAINMENT**: Isolate affected systems from network immediately\n\
             - **PRESERVATION**: Create forensic images of compromised systems\n\
             - **BLOCKING**: Implement firewall rules to block malicious IP addresses\n\
             - **NOTIFICATION**: Alert SOC manager and security team leads\n\
             - **DOCUMENTATION**: Begin incident tracking in security platform\n\n\
             ### Investigation Procedures (1-24 hours)\n\
             - **LOG ANALYSIS**: Collect and analyze logs from affected systems\n\
             - **MALWARE ANALYSIS**: Submit suspicious files to sandbox for analysis\n\
             - **NETWORK FORENSICS**: Examine network traffic for lateral movement\n\
             - **USER INTERVIEWS**: Interview affected users about suspicious activities\n\
             - **SYSTEM IMAGING**: Create full forensic images for detailed analysis\n\n\
             ### Communication Plan\n\
             - **INTERNAL**: Notify CISO, IT management, affected business units\n\
             - **EXTERNAL**: Contact law enforcement if required, prepare customer notifications\n\
             - **REGULATORY**: Assess reporting requirements (GDPR, SOX, etc.)\n\
             - **MEDIA**: Prepare communications strategy if public disclosure needed\n\n\
             ### Recovery Strategy\n\
             - **REBUILD**: Rebuild compromised systems from clean backups\n\
             - **PATCH**: Apply security updates to prevent reinfection\n\
             - **MONITOR**: Enhanced monitoring of recovered systems for 30 days\n\
             - **VALIDATION**: Verify system integrity before returning to production\n\n\
             ### Follow-up Actions\n\
             - **LESSONS LEARNED**: Conduct post-incident review within 1 week\n\
             - **SECURITY IMPROVEMENTS**: Implement additional controls based on findings\n\
             - **POLICY UPDATES**: Review and update security policies as needed\n\
             - **TRAINING**: Conduct security awareness training for affected users\n\n\
             **Estimated Recovery Time**: 2-5 business days\n\
             **Resources Required**: SOC analysts (2), Network engineers (1), System administrators (2)",
            Self::title_case(threat_type),
            Self::title_case(severity),
        )
    }
}

#[async_trait]
impl Tool for ResponsePlannerTool {
    fn name(&self) -> &str {
        "response_planner"
    }

    fn description(&self) -> &str {
        "Generates incident response procedures and containment strategies"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_for::<ResponsePlannerArgs>()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput> {
        let args: ResponsePlannerArgs = parse_args(args)?;

        if self.ctx.offline() {
            return Ok(ToolOutput::ok(Self::offline_report(
                &args.threat_type,
                &args.severity_level,
            )));
        }

        let prompt = fill(
            RESPONSE_PLANNER_PROMPT,
            &[
                ("threat_type", &args.threat_type),
                ("severity_level", &args.severity_level),
                ("affected_systems", &args.affected_systems),
            ],
        );
        let response = self
            .ctx
            .llm
            .prompt(&prompt)
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        Ok(ToolOutput::ok(format!(
            "## Incident Response Plan\n\n{}",
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
    async fn offline_plan_has_all_phases() {
        let ctx = ToolContext::new(Config::default(), Arc::new(MockProvider));
        let tool = ResponsePlannerTool::new(ctx);
        let output = tool
            .execute(serde_json::json!({
                "threat_type": "ransomware",
                "severity_level": "critical",
            }))
            .await
            .unwrap();
        assert!(output.report.contains("Ransomware - Critical Severity"));
        assert!(output.report.contains("Immediate Response Actions"));
        assert!(output.report.contains("Investigation Procedures"));
        assert!(output.report.contains("Communication Plan"));
        assert!(output.report.contains("Recovery Strategy"));
        assert!(output.report.contains("Follow-up Actions"));
    }
}
