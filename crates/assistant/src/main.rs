use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use opensoc_assistant::{
    agent::create_provider,
    config::Config,
    ioc::{detect_type, IocExtractor},
    tools::{ToolContext, ToolRegistry},
    Result,
};

#[derive(Parser)]
#[command(name = "opensoc", about = "SOC assistant toolkit for alert triage and threat analysis")]
struct Cli {
    /// Path to a YAML configuration file; environment variables otherwise
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract indicators of compromise from text
    Extract {
        /// Text to scan (alert body, log excerpt, incident notes)
        text: String,
    },
    /// Detect the type of a single indicator
    Detect {
        /// Indicator value
        value: String,
    },
    /// Run the VirusTotal reputation pipeline for an IOC
    Lookup {
        /// Indicator value (hash, URL, IP or domain)
        ioc: String,
    },
    /// Hunt incident IOCs across ThreatFox
    Hunt {
        /// Incident description or alert text
        incident: String,
        /// Additional IOCs beyond those extracted from the text
        #[arg(long = "ioc")]
        iocs: Vec<String>,
    },
    /// Analyze security logs for suspicious patterns
    AnalyzeLogs {
        /// Log data to analyze
        logs: String,
        /// Time range covered by the logs
        #[arg(long, default_value = "24h")]
        time_range: String,
    },
    /// Look up threat intelligence for a set of IOCs
    Intel {
        /// IOC list, comma-separated
        iocs: String,
        /// Type of threat being investigated
        #[arg(long, default_value = "unknown")]
        threat_type: String,
    },
    /// Generate an incident response plan
    Plan {
        /// Type of security threat
        threat_type: String,
        #[arg(long, default_value = "medium")]
        severity: String,
        #[arg(long, default_value = "")]
        systems: String,
    },
    /// Generate a JSON response playbook for an incident
    Playbook {
        /// Incident type (e.g. malware_infection, phishing_attack)
        incident_type: String,
        #[arg(long, default_value = "medium")]
        severity: String,
        #[arg(long, default_value = "")]
        systems: String,
        /// Incident context passed to the generator
        #[arg(long, default_value = "")]
        data: String,
    },
    /// Generate takedown and isolation procedures
    Takedown {
        /// Threat level (critical, high, medium, low)
        threat_level: String,
        #[arg(long, default_value = "network_isolation")]
        takedown_type: String,
        #[arg(long, default_value = "bash")]
        script_language: String,
        /// Malware families identified during hunting
        #[arg(long = "family")]
        families: Vec<String>,
        /// Emit live termination commands instead of commented guidance
        #[arg(long)]
        aggressive: bool,
    },
    /// Classify a security analysis report
    Classify {
        /// The analysis report text
        report: String,
    },
    /// List the registered tools
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    info!(offline = config.offline_mode, "Configuration loaded");

    // Extraction and detection are pure and need no clients.
    match &cli.command {
        Command::Extract { text } => {
            let extractor = IocExtractor::new(config.extractor.clone());
            for indicator in extractor.extract(text) {
                println!("{}\t{}", indicator.kind, indicator.value);
            }
            return Ok(());
        }
        Command::Detect { value } => {
            println!("{}", detect_type(value));
            return Ok(());
        }
        _ => {}
    }

    let provider =
        create_provider(&config.llm).map_err(|e| opensoc_assistant::Error::Llm(e.to_string()))?;
    let registry = ToolRegistry::with_defaults(ToolContext::new(config, provider));

    let (name, args) = match cli.command {
        Command::Lookup { ioc } => ("virustotal_analyzer", json!({ "ioc_value": ioc })),
        Command::Hunt { incident, iocs } => (
            "threat_hunter",
            json!({ "incident_data": incident, "iocs": iocs }),
        ),
        Command::AnalyzeLogs { logs, time_range } => (
            "log_analyzer",
            json!({ "log_data": logs, "time_range": time_range }),
        ),
        Command::Intel { iocs, threat_type } => (
            "intel_lookup",
            json!({ "ioc_list": iocs, "threat_type": threat_type }),
        ),
        Command::Plan {
            threat_type,
            severity,
            systems,
        } => (
            "response_planner",
            json!({
                "threat_type": threat_type,
                "severity_level": severity,
                "affected_systems": systems,
            }),
        ),
        Command::Playbook {
            incident_type,
            severity,
            systems,
            data,
        } => (
            "playbook",
            json!({
                "incident_data": data,
                "incident_type": incident_type,
                "severity": severity,
                "affected_systems": systems,
            }),
        ),
        Command::Takedown {
            threat_level,
            takedown_type,
            script_language,
            families,
            aggressive,
        } => (
            "takedown",
            json!({
                "threat_level": threat_level,
                "takedown_type": takedown_type,
                "script_language": script_language,
                "threat_families": families,
                "enable_aggressive_actions": aggressive,
            }),
        ),
        Command::Classify { report } => ("classifier", json!({ "analysis_report": report })),
        Command::Tools => {
            for name in registry.names() {
                let tool = registry.get(&name).map(|t| t.description().to_string());
                println!("{}\t{}", name, tool.unwrap_or_default());
            }
            return Ok(());
        }
        Command::Extract { .. } | Command::Detect { .. } => unreachable!(),
    };

    let output = registry.execute(name, args).await?;
    println!("{}", output.report);
    if !output.success {
        std::process::exit(1);
    }

    Ok(())
}
