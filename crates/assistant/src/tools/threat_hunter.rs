//! Threat Hunter Tool
//!
//! Hunts an incident's indicators across ThreatFox: merges analyst-provided
//! IOCs with ones extracted from the incident text, queries each indicator,
//! aggregates an incident threat score and renders a hunting report with the
//! raw API responses appended for analyst verification.

use async_trait::async_trait;
use futures::future::join_all;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{parse_args, schema_for, Tool, ToolContext, ToolOutput};
use crate::intel::{IocSearch, IocSearchOutcome};
use crate::ioc::{aggregate, DetectionResult, Indicator, ThreatLevel};
use crate::Result;

/// Hunts stay bounded regardless of how noisy the incident text is.
const MAX_HUNT_IOCS: usize = 10;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ThreatHunterArgs {
    /// Incident description, alert text or log excerpt to hunt over
    pub incident_data: String,
    /// Additional IOCs to include beyond those extracted from the text
    #[serde(default)]
    pub iocs: Vec<String>,
}

pub struct ThreatHunterTool {
    ctx: ToolContext,
}

impl ThreatHunterTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Analyst-provided IOCs first, then extracted ones, deduplicated by
    /// value and capped.
    fn collect_indicators(&self, args: &ThreatHunterArgs) -> Vec<Indicator> {
        let mut indicators: Vec<Indicator> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for value in &args.iocs {
            let trimmed = value.trim();
            if !trimmed.is_empty() && seen.insert(trimmed.to_string()) {
                indicators.push(Indicator::provided(trimmed));
            }
        }
        for indicator in self.ctx.extractor.extract(&args.incident_data) {
            if seen.insert(indicator.value.clone()) {
                indicators.push(indicator);
            }
        }

        indicators.truncate(MAX_HUNT_IOCS);
        indicators
    }

    fn ioc_section(search: &IocSearch) -> String {
        let ioc = &search.indicator.value;
        match &search.outcome {
            IocSearchOutcome::Hits { threats } => {
                let primary = &threats[0];
                format!(
                    "### MALICIOUS: {ioc}\n\
                     - **Threat Type**: {}\n\
                     - **Malware Family**: {}\n\
                     - **Confidence**: {}%\n\
                     - **First Seen**: {}\n\
                     - **Last Seen**: {}\n\
                     - **Tags**: {}\n",
                    primary.threat_type,
                    primary.malware_printable,
                    primary.confidence_level,
                    primary.first_seen.as_deref().unwrap_or("Unknown"),
                    primary.last_seen.as_deref().unwrap_or("Unknown"),
                    primary.tags.join(", "),
                )
            }
            IocSearchOutcome::OfflineMode => format!(
                "### OFFLINE MODE: {ioc}\n\
                 - **Status**: Analysis skipped (offline mode enabled)\n\
                 - **Recommendation**: Enable online mode for live ThreatFox analysis\n"
            ),
            IocSearchOutcome::Error { message } => format!(
                "### ERROR: {ioc}\n\
                 - **Status**: API error occurred during analysis\n\
                 - **Error**: {message}\n\
                 - **Recommendation**: Check network connectivity and API key validity\n"
            ),
            IocSearchOutcome::NoResult => format!(
                "### CLEAN: {ioc}\n\
                 - **Status**: No malicious activity found in ThreatFox database\n\
                 - **Recommendation**: Consider additional analysis if suspicious context\n"
            ),
        }
    }

    fn immediate_actions(level: ThreatLevel) -> &'static str {
        match level {
            ThreatLevel::Critical | ThreatLevel::High => {
                "1. **ISOLATE** affected systems immediately to prevent lateral movement\n\
                 2. **BLOCK** all confirmed malicious IOCs at network perimeters\n\
                 3. **SCAN** enterprise for additional indicators of the identified malware families\n\
                 4. **ACTIVATE** incident response team and emergency procedures\n\
                 5. **PRESERVE** forensic evidence for detailed analysis"
            }
            _ => {
                "1. **MONITOR** affected systems for additional suspicious activity\n\
                 2. **ANALYZE** context around IOC interactions\n\
                 3. **INVESTIGATE** potential false positives\n\
                 4. **DOCUMENT** findings and maintain alerting\n\
                 5. **REVIEW** security controls and detection capabilities"
            }
        }
    }

    fn raw_appendix(searches: &[IocSearch]) -> String {
        let mut out = String::from(
            "## Raw ThreatFox API Responses\n\n\
             **Purpose**: Complete, unfiltered API responses for manual verification \
             and cross-checking of the analysis above.\n",
        );
        for search in searches {
            let status = match &search.outcome {
                IocSearchOutcome::Hits { .. } => "ok",
                IocSearchOutcome::NoResult => "no_result",
                IocSearchOutcome::OfflineMode => "offline_mode",
                IocSearchOutcome::Error { .. } => "error",
            };
            out.push_str(&format!(
                "\n### IOC Query: {}\n\
                 **Request Timestamp**: {}\n\
                 **Query Parameters**: {}\n\
                 **Response Status**: {}\n\n\
                 **Raw ThreatFox API Response**:\n```json\n{}\n```\n",
                search.indicator.value,
                search.queried_at.to_rfc3339(),
                search.query_parameters,
                status,
                serde_json::to_string_pretty(&search.raw_response)
                    .unwrap_or_else(|_| search.raw_response.to_string()),
            ));
        }

        let successful = searches
            .iter()
            .filter(|s| matches!(s.outcome, IocSearchOutcome::Hits { .. }))
            .count();
        let no_result = searches
            .iter()
            .filter(|s| matches!(s.outcome, IocSearchOutcome::NoResult))
            .count();
        let errors = searches.len() - successful - no_result;
        out.push_str(&format!(
            "\n## Data Verification Summary\n\n\
             **Total API Queries**: {}\n\
             **Successful Responses**: {}\n\
             **No Results**: {}\n\
             **Errors / Offline**: {}\n",
            searches.len(),
            successful,
            no_result,
            errors,
        ));
        out
    }

    fn render(incident_data: &str, searches: &[IocSearch], level: ThreatLevel) -> String {
        let total = searches.len();
        let malicious = searches
            .iter()
            .filter(|s| s.outcome.match_count() > 0)
            .count();
        let threat_score = if total == 0 {
            0.0
        } else {
            (malicious as f64 / total as f64) * 100.0
        };

        let mut families: Vec<String> = Vec::new();
        for search in searches {
            if let IocSearchOutcome::Hits { threats } = &search.outcome {
                for threat in threats {
                    if !families.contains(&threat.malware_printable) {
                        families.push(threat.malware_printable.clone());
                    }
                }
            }
        }

        let context: String = incident_data.chars().take(200).collect();
        let ioc_sections: String = searches.iter().map(Self::ioc_section).collect::<Vec<_>>().join("\n");

        format!(
            "# Threat Hunting Report\n\n\
             ## Executive Summary\n\
             **Incident Context**: {context}...\n\
             **Threat Score**: {threat_score:.1}% ({malicious}/{total} IOCs confirmed malicious)\n\
             **Threat Level**: {level}\n\
             **Malware Families Identified**: {families}\n\n\
             ## IOC Analysis Results\n\n\
             {ioc_sections}\n\
             ## Threat Hunting Recommendations\n\n\
             ### Immediate Actions ({level} Priority)\n{actions}\n\n\
             ### Long-term Hunting Strategies\n\
             1. **Campaign Tracking**: Monitor for IOCs associated with identified malware families\n\
             2. **Behavioral Analysis**: Look for tactics, techniques, and procedures (TTPs)\n\
             3. **Infrastructure Mapping**: Investigate related domains, IPs, and certificates\n\
             4. **Timeline Analysis**: Correlate threat activity with internal security events\n\
             5. **Threat Intelligence**: Subscribe to feeds for identified malware families\n\n\
             {appendix}\n\
             **Data Source**: ThreatFox by abuse.ch\n\
             **Raw Data Included**: Yes (for verification)",
            families = if families.is_empty() {
                "None".to_string()
            } else {
                families.join(", ")
            },
            actions = Self::immediate_actions(level),
            appendix = Self::raw_appendix(searches),
        )
    }
}

#[async_trait]
impl Tool for ThreatHunterTool {
    fn name(&self) -> &str {
        "threat_hunter"
    }

    fn description(&self) -> &str {
        "Hunts incident IOCs across ThreatFox and produces an aggregated hunting report"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_for::<ThreatHunterArgs>()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput> {
        let args: ThreatHunterArgs = parse_args(args)?;
        let indicators = self.collect_indicators(&args);
        info!("Hunting {} indicators", indicators.len());

        let searches: Vec<IocSearch> = join_all(
            indicators
                .iter()
                .map(|indicator| self.ctx.threatfox.search_ioc(indicator)),
        )
        .await;

        // One synthetic detection per IOC so the incident score is the
        // fraction of indicators with confirmed hits.
        let detections: Vec<DetectionResult> = searches
            .iter()
            .map(|s| {
                let malicious = if s.outcome.match_count() > 0 { 1 } else { 0 };
                DetectionResult::new(s.indicator.clone(), malicious, 1)
            })
            .collect();
        let level = aggregate(&detections);

        let report = Self::render(&args.incident_data, &searches, level);
        let data = json!({
            "hunt_id": uuid::Uuid::new_v4().to_string(),
            "threat_level": level.as_str(),
            "total_iocs": searches.len(),
            "malicious_iocs": searches.iter().filter(|s| s.outcome.match_count() > 0).count(),
            "searches": searches,
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

    fn offline_tool() -> ThreatHunterTool {
        let ctx = ToolContext::new(Config::default(), Arc::new(MockProvider));
        ThreatHunterTool::new(ctx)
    }

    #[tokio::test]
    async fn hunt_merges_provided_and_extracted_iocs() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "incident_data": "Beacon to suspicious-c2.com from workstation 203.0.113.5",
                "iocs": ["198.51.100.7"],
            }))
            .await
            .unwrap();
        assert!(output.report.contains("198.51.100.7"));
        assert!(output.report.contains("suspicious-c2.com"));
        assert!(output.report.contains("203.0.113.5"));
    }

    #[tokio::test]
    async fn keyword_flagged_ioc_drives_threat_sections() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "incident_data": "C2 traffic to suspicious-c2.com observed",
            }))
            .await
            .unwrap();
        assert!(output.report.contains("### MALICIOUS: suspicious-c2.com"));
        assert!(output.report.contains("Emotet"));
        assert!(output.report.contains("Raw ThreatFox API Responses"));
        let data = output.data.unwrap();
        assert_eq!(data["malicious_iocs"], 1);
    }

    #[tokio::test]
    async fn empty_incident_scores_low() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({ "incident_data": "nothing of note" }))
            .await
            .unwrap();
        let data = output.data.unwrap();
        assert_eq!(data["total_iocs"], 0);
        assert_eq!(data["threat_level"], "Low");
    }

    #[tokio::test]
    async fn all_malicious_hunt_is_critical_priority() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "incident_data": "",
                "iocs": ["malicious-c2.example", "bad-host.example"],
            }))
            .await
            .unwrap();
        let data = output.data.unwrap();
        assert_eq!(data["threat_level"], "Critical");
        assert!(output.report.contains("Immediate Actions (Critical Priority)"));
        assert!(output.report.contains("**ISOLATE**"));
    }
}
