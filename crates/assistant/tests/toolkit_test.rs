use std::sync::Arc;

use serde_json::json;

use opensoc_assistant::{
    agent::MockProvider,
    config::Config,
    tools::{ToolContext, ToolRegistry},
    Error,
};

fn offline_registry() -> ToolRegistry {
    // Default configuration runs fully offline with deterministic mocks.
    let config = Config::default();
    assert!(config.offline_mode);
    ToolRegistry::with_defaults(ToolContext::new(config, Arc::new(MockProvider)))
}

#[tokio::test]
async fn registry_lists_the_full_toolkit() {
    let registry = offline_registry();
    let names = registry.names();
    for expected in [
        "classifier",
        "intel_lookup",
        "ioc_analyzer",
        "log_analyzer",
        "playbook",
        "response_planner",
        "takedown",
        "threat_hunter",
        "virustotal_analyzer",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
    assert_eq!(names.len(), 9);
}

#[tokio::test]
async fn every_tool_exposes_an_object_schema() {
    let registry = offline_registry();
    for name in registry.names() {
        let tool = registry.get(&name).unwrap();
        let schema = tool.parameters_schema();
        assert!(schema.is_object(), "{} schema is not an object", name);
        assert!(!tool.description().is_empty());
    }
}

#[tokio::test]
async fn unknown_tool_dispatch_is_an_error() {
    let registry = offline_registry();
    let err = registry
        .execute("does_not_exist", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn virustotal_lookup_is_deterministic_offline() {
    let registry = offline_registry();
    let args = json!({ "ioc_value": "192.168.1.100" });
    let first = registry
        .execute("virustotal_analyzer", args.clone())
        .await
        .unwrap();
    let second = registry.execute("virustotal_analyzer", args).await.unwrap();
    assert_eq!(first.report, second.report);
    assert!(first.report.contains("15/70"));
    assert!(first.report.contains("offline mode"));
}

#[tokio::test]
async fn hunt_report_covers_extraction_scoring_and_raw_data() {
    let registry = offline_registry();
    let output = registry
        .execute(
            "threat_hunter",
            json!({
                "incident_data": "Beaconing to suspicious-c2.com, \
                 operator shell from 203.0.113.5, dropped payload \
                 5f4dcc3b5aa765d61d8327deb882cf99",
            }),
        )
        .await
        .unwrap();

    assert!(output.success);
    assert!(output.report.contains("## Executive Summary"));
    assert!(output.report.contains("### MALICIOUS: suspicious-c2.com"));
    assert!(output.report.contains("## Raw ThreatFox API Responses"));
    assert!(output.report.contains("## Data Verification Summary"));

    let data = output.data.unwrap();
    assert_eq!(data["total_iocs"], 3);
    assert_eq!(data["malicious_iocs"], 1);
}

#[tokio::test]
async fn playbook_report_is_valid_backend_json() {
    let registry = offline_registry();
    let output = registry
        .execute(
            "playbook",
            json!({
                "incident_data": "Confirmed Emotet infection on two laptops",
                "incident_type": "malware_infection",
                "severity": "high",
                "affected_systems": "laptop-01,laptop-02",
            }),
        )
        .await
        .unwrap();

    let playbook: serde_json::Value = serde_json::from_str(&output.report).unwrap();
    assert_eq!(playbook["category"], "Malware Response");
    assert_eq!(playbook["triggerType"], "automatic");
    let steps = playbook["steps"].as_array().unwrap();
    assert!(steps.len() >= 4);
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(step["order"], (i + 1) as u64);
        assert!(step["isRequired"].is_boolean());
    }
}

#[tokio::test]
async fn classifier_and_planner_chain_offline() {
    let registry = offline_registry();

    let classification = registry
        .execute(
            "classifier",
            json!({ "analysis_report": "Brute force SSH followed by lateral movement" }),
        )
        .await
        .unwrap();
    let data = classification.data.unwrap();
    assert_eq!(data["event_type"], "network_intrusion");

    let plan = registry
        .execute(
            "response_planner",
            json!({
                "threat_type": data["event_type"].as_str().unwrap(),
                "severity_level": data["severity"].as_str().unwrap(),
            }),
        )
        .await
        .unwrap();
    assert!(plan.report.contains("Incident Response Plan"));
}

#[tokio::test]
async fn invalid_arguments_are_a_validation_error() {
    let registry = offline_registry();
    let err = registry
        .execute("virustotal_analyzer", json!({ "wrong_key": 1 }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
