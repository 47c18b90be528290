//! Takedown Specialist Tool
//!
//! Generates isolation, termination and evidence-preservation procedures for
//! confirmed threats. Output is JSON so orchestration backends can consume
//! the procedures directly. Destructive commands are emitted commented-out
//! unless aggressive actions are explicitly enabled.

use async_trait::async_trait;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{parse_args, schema_for, Tool, ToolContext, ToolOutput};
use crate::Result;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TakedownArgs {
    /// Threat level driving procedure selection (critical, high, medium, low)
    pub threat_level: String,
    /// Type of takedown: network_isolation, process_termination or full_containment
    #[serde(default = "default_takedown_type")]
    pub takedown_type: String,
    /// Script language for generated commands: bash or powershell
    #[serde(default = "default_script_language")]
    pub script_language: String,
    /// Malware families identified during hunting
    #[serde(default)]
    pub threat_families: Vec<String>,
    /// Emit live termination commands instead of commented-out guidance
    #[serde(default)]
    pub enable_aggressive_actions: bool,
}

fn default_takedown_type() -> String {
    "network_isolation".to_string()
}

fn default_script_language() -> String {
    "bash".to_string()
}

pub struct TakedownTool {
    ctx: ToolContext,
}

impl TakedownTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn network_isolation(level: &str) -> Value {
        match level {
            "critical" | "high" => json!({
                "isolation_steps": [
                    "Isolate affected system from network immediately",
                    "Block all traffic to/from compromised asset",
                    "Preserve network logs for forensic analysis",
                    "Notify incident response team",
                ],
                "verification_commands": [
                    "ping -c 1 <asset_ip> (should fail)",
                    "nmap -p 22,80,443 <asset_ip> (should show filtered)",
                    "tcpdump -i <interface> host <asset_ip> (should show no traffic)",
                ],
                "rollback_procedures": [
                    "Re-enable switch port after clearance from incident commander",
                    "Verify clean state before restoring network access",
                ],
                "estimated_downtime": "5-15 minutes",
            }),
            "medium" => json!({
                "isolation_steps": [
                    "Monitor network traffic closely",
                    "Apply restrictive firewall rules",
                    "Log all connections for analysis",
                    "Prepare for escalation if needed",
                ],
                "verification_commands": [],
                "rollback_procedures": [],
                "estimated_downtime": "0 minutes",
            }),
            _ => json!({
                "isolation_steps": [],
                "verification_commands": [],
                "rollback_procedures": [],
                "estimated_downtime": "0 minutes",
            }),
        }
    }

    fn process_termination(
        families: &[String],
        script_language: &str,
        aggressive: bool,
    ) -> Value {
        let (analysis, termination): (Vec<String>, Vec<String>) = if script_language == "powershell"
        {
            (
                vec![
                    "Get-Process | Where-Object {$_.ProcessName -match '(malware|trojan|backdoor)'}".into(),
                    "Get-NetTCPConnection | Where-Object {$_.State -eq 'Established'}".into(),
                    "Get-WmiObject Win32_Process | Select ProcessId,Name,CommandLine".into(),
                ],
                if aggressive {
                    vec![
                        "Stop-Process -Name '<suspicious_process>' -Force".into(),
                        "Get-Process | Where-Object {$_.Name -match '<pattern>'} | Stop-Process -Force".into(),
                    ]
                } else {
                    vec![
                        "# Stop suspicious processes (REVIEW BEFORE EXECUTION)".into(),
                        "# Stop-Process -Name '<suspicious_process>' -Force".into(),
                        "# Get-Process | Where-Object {$_.Name -match '<pattern>'} | Stop-Process -Force".into(),
                    ]
                },
            )
        } else {
            (
                vec![
                    "ps aux | grep -E '(malware|trojan|backdoor)'".into(),
                    "netstat -tulpn | grep ESTABLISHED".into(),
                    "lsof -i | grep ESTABLISHED".into(),
                ],
                if aggressive {
                    vec![
                        "pkill -f '<suspicious_process_name>'".into(),
                        "killall -9 <malicious_binary>".into(),
                    ]
                } else {
                    vec![
                        "# Kill suspicious processes (REVIEW BEFORE EXECUTION)".into(),
                        "# pkill -f '<suspicious_process_name>'".into(),
                        "# killall -9 <malicious_binary>".into(),
                    ]
                },
            )
        };

        let mut persistence_removal = Vec::new();
        let mut cleanup_steps = Vec::new();
        for family in families {
            let lower = family.to_lowercase();
            if lower.contains("rat") || lower.contains("backdoor") {
                persistence_removal.push(format!("Check for {} persistence mechanisms", family));
                cleanup_steps.push(format!("Remove {} registry entries/cron jobs", family));
            }
        }

        json!({
            "process_analysis": analysis,
            "termination_commands": termination,
            "cleanup_steps": cleanup_steps,
            "persistence_removal": persistence_removal,
        })
    }

    fn evidence_preservation() -> Value {
        json!({
            "memory_capture": [
                "Create memory dump before system changes",
                "Preserve volatile data and running processes",
                "Document network connections and open files",
            ],
            "disk_evidence": [
                "Create disk image of affected partitions",
                "Hash all collected evidence",
                "Maintain chain of custody documentation",
            ],
            "network_evidence": [
                "Capture network traffic for IOC analysis",
                "Export firewall and proxy logs",
                "Document DNS query history",
            ],
            "timeline_preservation": [
                "Export system event logs",
                "Capture file modification timestamps",
                "Document user activity during incident timeframe",
            ],
        })
    }

    fn execution_timeline() -> Value {
        json!([
            {
                "step": "threat_analysis_review",
                "description": "Review threat assessment and IOC analysis",
                "estimated_time": "2-5 minutes",
                "criticality": "high",
            },
            {
                "step": "procedure_validation",
                "description": "Validate takedown procedures against environment",
                "estimated_time": "5-10 minutes",
                "criticality": "high",
            },
            {
                "step": "execution_preparation",
                "description": "Prepare systems and tools for takedown execution",
                "estimated_time": "10-15 minutes",
                "criticality": "medium",
            },
            {
                "step": "takedown_execution",
                "description": "Execute takedown procedures with monitoring",
                "estimated_time": "15-30 minutes",
                "criticality": "high",
            },
            {
                "step": "verification_and_monitoring",
                "description": "Verify effectiveness and establish ongoing monitoring",
                "estimated_time": "30-60 minutes",
                "criticality": "medium",
            },
        ])
    }
}

#[async_trait]
impl Tool for TakedownTool {
    fn name(&self) -> &str {
        "takedown"
    }

    fn description(&self) -> &str {
        "Generates takedown, isolation and evidence-preservation procedures for confirmed threats"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_for::<TakedownArgs>()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput> {
        let args: TakedownArgs = parse_args(args)?;
        let level = args.threat_level.to_lowercase();
        info!(
            "Generating {} procedures for {} threat",
            args.takedown_type, level
        );

        let procedures = match args.takedown_type.as_str() {
            "process_termination" => Self::process_termination(
                &args.threat_families,
                &args.script_language,
                args.enable_aggressive_actions,
            ),
            "full_containment" => json!({
                "containment_strategy": "full_containment",
                "execution_phases": [
                    {
                        "phase": "evidence_preservation",
                        "priority": 1,
                        "procedures": Self::evidence_preservation(),
                    },
                    {
                        "phase": "threat_containment",
                        "priority": 2,
                        "procedures": {
                            "network_isolation": Self::network_isolation(&level),
                            "process_termination": Self::process_termination(
                                &args.threat_families,
                                &args.script_language,
                                args.enable_aggressive_actions,
                            ),
                        },
                    },
                ],
            }),
            _ => Self::network_isolation(&level),
        };

        let high_severity = matches!(level.as_str(), "critical" | "high");
        let result = json!({
            "status": "completed",
            "takedown_type": args.takedown_type,
            "threat_context": {
                "threat_level": level,
                "threat_families": args.threat_families,
            },
            "generated_procedures": procedures,
            "execution_timeline": Self::execution_timeline(),
            "safety_recommendations": {
                "test_in_staging": true,
                "backup_before_execution": true,
                "manual_approval_required": high_severity,
                "rollback_plan_required": true,
            },
            "automation_readiness": {
                "ready_for_automation": level != "critical" && args.enable_aggressive_actions,
                "requires_human_oversight": true,
                "risk_assessment": if matches!(level.as_str(), "high" | "medium") { "medium" } else { "low" },
            },
            "offline_mode": self.ctx.offline(),
            "generation_timestamp": Utc::now().to_rfc3339(),
        });

        let report = serde_json::to_string_pretty(&result)?;
        Ok(ToolOutput::ok_with_data(report, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockProvider;
    use crate::config::Config;
    use std::sync::Arc;

    fn offline_tool() -> TakedownTool {
        let ctx = ToolContext::new(Config::default(), Arc::new(MockProvider));
        TakedownTool::new(ctx)
    }

    #[tokio::test]
    async fn critical_isolation_requires_manual_approval() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({ "threat_level": "critical" }))
            .await
            .unwrap();
        let data = output.data.unwrap();
        assert_eq!(data["safety_recommendations"]["manual_approval_required"], true);
        assert_eq!(data["automation_readiness"]["ready_for_automation"], false);
        let steps = data["generated_procedures"]["isolation_steps"].as_array().unwrap();
        assert!(!steps.is_empty());
    }

    #[tokio::test]
    async fn termination_commands_stay_commented_without_aggressive_flag() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "threat_level": "high",
                "takedown_type": "process_termination",
                "threat_families": ["AsyncRAT"],
            }))
            .await
            .unwrap();
        let data = output.data.unwrap();
        let commands = data["generated_procedures"]["termination_commands"]
            .as_array()
            .unwrap();
        assert!(commands.iter().all(|c| c.as_str().unwrap().starts_with('#')));
        let persistence = data["generated_procedures"]["persistence_removal"]
            .as_array()
            .unwrap();
        assert_eq!(persistence.len(), 1);
    }

    #[tokio::test]
    async fn powershell_commands_for_windows_assets() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "threat_level": "high",
                "takedown_type": "process_termination",
                "script_language": "powershell",
                "enable_aggressive_actions": true,
            }))
            .await
            .unwrap();
        let data = output.data.unwrap();
        let commands = data["generated_procedures"]["termination_commands"]
            .as_array()
            .unwrap();
        assert!(commands[0].as_str().unwrap().contains("Stop-Process"));
        assert!(!commands[0].as_str().unwrap().starts_with('#'));
    }

    #[tokio::test]
    async fn full_containment_has_both_phases() {
        let tool = offline_tool();
        let output = tool
            .execute(serde_json::json!({
                "threat_level": "critical",
                "takedown_type": "full_containment",
            }))
            .await
            .unwrap();
        let data = output.data.unwrap();
        let phases = data["generated_procedures"]["execution_phases"].as_array().unwrap();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0]["phase"], "evidence_preservation");
    }
}
