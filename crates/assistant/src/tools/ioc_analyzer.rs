//! IOC Analyzer Tool
//!
//! Narrative reputation analysis for a single indicator of compromise.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use super::{parse_args, schema_for, Tool, ToolContext, ToolOutput};
use crate::agent::prompts::{fill, IOC_ANALYZER_PROMPT};
use crate::ioc::{detect_type, IocKind};
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IocAnalyzerArgs {
    /// The IOC value to analyze
    pub ioc_value: String,
    /// Optional IOC type hint; auto-detected when omitted
    #[serde(default)]
    pub ioc_type: Option<String>,
}

pub struct IocAnalyzerTool {
    ctx: ToolContext,
}

impl IocAnalyzerTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn offline_report(value: &str, kind: IocKind) -> String {
        match kind {
            IocKind::Ip | IocKind::IpPort => format!(
                "## IOC Analysis: {value}\n\n\
                 **IOC Summary:** IPv4 Address - External source\n\n\
                 **Reputation Analysis:** Malicious (High Confidence)\n\
                 - First seen: 2024-11-15\n\
                 - Last seen: 2025-01-10\n\
                 - Threat categories: Botnet C2, Credential theft\n\n\
                 **Threat Context:**\n\
                 - Associated with Emotet botnet infrastructure\n\
                 - Used in credential harvesting campaigns\n\
                 - Communicates on ports 443, 8080, 9443\n\n\
                 **Risk Assessment:** Critical - Immediate blocking recommended\n\n\
                 **Technical Details:**\n\
                 - Geolocation: Eastern Europe\n\
                 - ASN: AS12345 (Suspicious hosting provider)\n\
                 - SSL Certificate: Self-signed, invalid"
            ),
            k if k.is_hash() => format!(
                "## IOC Analysis: {value}\n\n\
                 **IOC Summary:** {kind} Hash - Executable file\n\n\
                 **Reputation Analysis:** Malicious (High Confidence)\n\
                 - Detection ratio: 45/70 engines\n\
                 - File type: Windows PE32 executable\n\n\
                 **Threat Context:**\n\
                 - Malware family: TrickBot\n\
                 - Campaign: Banking trojan distribution\n\
                 - Capabilities: Credential theft, lateral movement\n\n\
                 **Risk Assessment:** Critical - Quarantine immediately\n\n\
                 **Technical Details:**\n\
                 - File size: 2.3MB\n\
                 - Compilation date: 2024-12-01\n\
                 - Packed with UPX"
            ),
            _ => format!(
                "## IOC Analysis: {value}\n\n\
                 **IOC Summary:** {kind} - Unknown reputation\n\n\
                 **Reputation Analysis:** Suspicious (Medium Confidence)\n\
                 - Limited intelligence available\n\
                 - Requires further investigation\n\n\
                 **Threat Context:** Insufficient data for threat attribution\n\n\
                 **Risk Assessment:** Medium - Monitor and investigate"
            ),
        }
    }
}

#[async_trait]
impl Tool for IocAnalyzerTool {
    fn name(&self) -> &str {
        "ioc_analyzer"
    }

    fn description(&self) -> &str {
        "Analyzes a single indicator of compromise for reputation and threat context"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_for::<IocAnalyzerArgs>()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput> {
        let args: IocAnalyzerArgs = parse_args(args)?;
        let kind = detect_type(&args.ioc_value);
        let type_label = args
            .ioc_type
            .clone()
            .unwrap_or_else(|| kind.as_str().to_string());

        if self.ctx.offline() {
            return Ok(ToolOutput::ok(Self::offline_report(&args.ioc_value, kind)));
        }

        let prompt = fill(
            IOC_ANALYZER_PROMPT,
            &[
                ("ioc_value", &args.ioc_value),
                ("ioc_type", &type_label),
            ],
        );
        let response = self
            .ctx
            .llm
            .prompt(&prompt)
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        Ok(ToolOutput::ok(format!(
            "## IOC Analysis: {}\n\n{}",
            args.ioc_value, response
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockProvider;
    use crate::config::Config;
    use std::sync::Arc;

    fn offline_tool() -> IocAnalyzerTool {
        let ctx = ToolContext::new(Config::default(), Arc::new(MockProvider));
        IocAnalyzerTool::new(ctx)
    }

    #[tokio::test]
    async fn ip_narrative_mentions_botnet_context() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({ "ioc_value": "203.0.113.5" }))
            .await
            .unwrap();
        assert!(output.report.contains("IPv4 Address"));
        assert!(output.report.contains("Emotet"));
    }

    #[tokio::test]
    async fn hash_narrative_reports_detection_ratio() {
        let tool = offline_tool();
        let sha256 = "a".repeat(64);
        let output = tool
            .execute(serde_json::json!({ "ioc_value": sha256 }))
            .await
            .unwrap();
        assert!(output.report.contains("45/70 engines"));
        assert!(output.report.contains("TrickBot"));
    }

    #[tokio::test]
    async fn other_kinds_get_the_generic_narrative() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({ "ioc_value": "example.test" }))
            .await
            .unwrap();
        assert!(output.report.contains("Unknown reputation"));
    }
}
