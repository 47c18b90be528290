//! VirusTotal Analyzer Tool
//!
//! The core reputation pipeline: detect the indicator type, look it up via
//! VirusTotal, score the detection ratio, and render an analyst report with
//! recommendations matched to the threat level.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::{parse_args, schema_for, Tool, ToolContext, ToolOutput};
use crate::intel::VtAnalysis;
use crate::ioc::{
    confidence, recommend, recommend_markdown, score, Indicator, IocKind, ThreatLevel,
};
use crate::template::render_template;
use crate::Result;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VirusTotalArgs {
    /// The IOC value to look up (hash, URL, IP or domain)
    pub ioc_value: String,
    /// Optional Tera template overriding the default Markdown report.
    /// Receives `value`, `kind`, `threat_level`, `confidence`,
    /// `detection_ratio`, `malicious`, `total_engines` and
    /// `recommendations`.
    #[serde(default)]
    pub template: Option<String>,
}

pub struct VirusTotalTool {
    ctx: ToolContext,
}

impl VirusTotalTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn summary(analysis: &VtAnalysis, kind: IocKind) -> String {
        let malicious = analysis.malicious;
        if malicious > 30 {
            format!(
                "**HIGH RISK**: This {} is flagged as malicious by {} security engines. Immediate action recommended.",
                kind, malicious
            )
        } else if malicious > 10 {
            format!(
                "**MEDIUM RISK**: This {} shows suspicious activity with {} detections. Investigation recommended.",
                kind, malicious
            )
        } else if malicious > 0 {
            format!(
                "**LOW RISK**: This {} has minimal detections ({}) but should be monitored.",
                kind, malicious
            )
        } else {
            format!(
                "**CLEAN**: This {} appears clean with no malicious detections from security engines.",
                kind
            )
        }
    }

    fn intel_lines(analysis: &VtAnalysis, kind: IocKind) -> String {
        let mut intel = Vec::new();

        if !analysis.threat_labels.is_empty() {
            intel.push(format!(
                "- **Threat Classification**: {}",
                analysis.threat_labels.join(", ")
            ));
        }
        if !analysis.names.is_empty() {
            let names: Vec<&str> = analysis.names.iter().take(3).map(|s| s.as_str()).collect();
            intel.push(format!("- **Associated Names**: {}", names.join(", ")));
        }
        if matches!(kind, IocKind::Ip | IocKind::IpPort) {
            if let Some(country) = &analysis.country {
                let owner = analysis.as_owner.as_deref().unwrap_or("Unknown ISP");
                intel.push(format!("- **Geolocation**: {} ({})", country, owner));
            }
        }
        if !analysis.categories.is_empty() {
            intel.push(format!(
                "- **Categories**: {}",
                analysis.categories.join(", ")
            ));
        }

        if intel.is_empty() {
            "- No additional threat intelligence available".to_string()
        } else {
            intel.join("\n")
        }
    }

    fn render(&self, analysis: &VtAnalysis, level: ThreatLevel) -> String {
        let detection = analysis.detection();
        let kind = analysis.indicator.kind;
        let conf = confidence(&detection);

        let mut report = format!(
            "## VirusTotal Analysis Results\n\n\
             **IOC Details:**\n\
             - **Value**: {}\n\
             - **Type**: {}\n\
             - **Detection Ratio**: {}\n\n\
             **Threat Assessment:**\n\
             - **Threat Level**: {}\n\
             - **Confidence**: {}\n\
             - **Malicious Detections**: {}/{} engines\n\n\
             **Analysis Summary:**\n{}\n\n\
             **Threat Intelligence:**\n{}\n\n\
             **Security Recommendations:**\n{}\n\n\
             **Technical Details:**\n\
             - **First Seen**: {}\n\
             - **Last Analysis**: {}\n\
             - **Reputation Score**: {}",
            analysis.indicator.value,
            kind.as_str().to_uppercase(),
            analysis.ratio_label(),
            level,
            conf,
            analysis.malicious,
            analysis.total_engines,
            Self::summary(analysis, kind),
            Self::intel_lines(analysis, kind),
            recommend_markdown(level),
            analysis.first_seen.as_deref().unwrap_or("Unknown"),
            analysis.last_seen.as_deref().unwrap_or("Unknown"),
            analysis.reputation,
        );

        if self.ctx.offline() {
            report.push_str(
                "\n\n*Note: This analysis was generated in offline mode using simulated data.*",
            );
        }

        report
    }
}

#[async_trait]
impl Tool for VirusTotalTool {
    fn name(&self) -> &str {
        "virustotal_analyzer"
    }

    fn description(&self) -> &str {
        "Looks up an IOC in VirusTotal, scores the detections and recommends response actions"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_for::<VirusTotalArgs>()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput> {
        let args: VirusTotalArgs = parse_args(args)?;
        let indicator = Indicator::provided(&args.ioc_value);

        let analysis = match self.ctx.virustotal.analyze(&indicator).await {
            Ok(analysis) => analysis,
            Err(e) => {
                return Ok(ToolOutput::failed(format!(
                    "## VirusTotal Analysis Error\n\n{}",
                    e
                )))
            }
        };

        let detection = analysis.detection();
        let level = score(&detection);
        let report = match &args.template {
            Some(template) => {
                let context = json!({
                    "value": analysis.indicator.value,
                    "kind": analysis.indicator.kind.as_str(),
                    "threat_level": level.as_str(),
                    "confidence": confidence(&detection).as_str(),
                    "detection_ratio": analysis.ratio_label(),
                    "malicious": analysis.malicious,
                    "total_engines": analysis.total_engines,
                    "recommendations": recommend(level),
                });
                render_template(template, &context)?
            }
            None => self.render(&analysis, level),
        };
        let data = serde_json::to_value(&detection).ok();

        Ok(ToolOutput {
            success: true,
            report,
            data,
        })
    }
}
