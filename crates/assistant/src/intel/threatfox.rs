//! ThreatFox Client
//!
//! Searches the abuse.ch ThreatFox database for indicator matches. API
//! failures are converted into structured outcomes rather than errors so a
//! hunt over many IOCs never aborts halfway; the raw response is preserved
//! for the analyst-verification appendix of hunting reports.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::ThreatFoxConfig;
use crate::ioc::Indicator;

/// One IOC record returned by ThreatFox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatFoxEntry {
    #[serde(default)]
    pub ioc: String,
    #[serde(default)]
    pub threat_type: String,
    #[serde(default)]
    pub malware: String,
    #[serde(default)]
    pub malware_printable: String,
    #[serde(default)]
    pub confidence_level: u32,
    #[serde(default)]
    pub first_seen: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Outcome of a single IOC search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IocSearchOutcome {
    Hits { threats: Vec<ThreatFoxEntry> },
    NoResult,
    OfflineMode,
    Error { message: String },
}

impl IocSearchOutcome {
    pub fn match_count(&self) -> usize {
        match self {
            IocSearchOutcome::Hits { threats } => threats.len(),
            _ => 0,
        }
    }
}

/// Search result plus the raw API exchange for manual verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IocSearch {
    pub indicator: Indicator,
    pub outcome: IocSearchOutcome,
    pub queried_at: DateTime<Utc>,
    pub query_parameters: serde_json::Value,
    pub raw_response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ThreatFoxResponse {
    #[serde(default)]
    query_status: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// abuse.ch ThreatFox API client.
pub struct ThreatFoxClient {
    config: ThreatFoxConfig,
    offline: bool,
    http: Client,
    last_request: Mutex<Option<Instant>>,
}

impl ThreatFoxClient {
    pub fn new(config: ThreatFoxConfig, offline: bool) -> Self {
        if config.api_key.is_empty() {
            info!("ThreatFox API: no key configured (limited functionality)");
        } else {
            info!(
                "ThreatFox API: using authentication with key ending in ...{}",
                redact(&config.api_key)
            );
        }
        Self {
            config,
            offline,
            http: Client::new(),
            last_request: Mutex::new(None),
        }
    }

    async fn rate_limit(&self) {
        let delay = Duration::from_secs_f64(self.config.rate_limit_delay);
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < delay {
                let wait = delay - elapsed;
                debug!("Rate limiting: waiting {:?} before next ThreatFox request", wait);
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Search for a specific IOC. Never fails: API errors become
    /// `IocSearchOutcome::Error`.
    pub async fn search_ioc(&self, indicator: &Indicator) -> IocSearch {
        let search_term = indicator.value.trim().to_string();
        let payload = json!({
            "query": "search_iocs",
            "search_term": search_term,
        });

        info!("ThreatFox API request - IOC: {}", search_term);
        debug!("ThreatFox API request - URL: {}/", self.config.base_url);

        if self.offline {
            warn!("Running in offline mode - returning seeded result");
            return self.offline_search(indicator, payload);
        }

        self.rate_limit().await;

        let outcome = self.post(&payload).await;
        let (outcome, raw) = match outcome {
            Ok((parsed, raw)) => (parsed, raw),
            Err(message) => {
                error!("ThreatFox API error: {}", message);
                (
                    IocSearchOutcome::Error {
                        message: message.clone(),
                    },
                    json!({ "query_status": "error", "error": message, "data": [] }),
                )
            }
        };

        IocSearch {
            indicator: indicator.clone(),
            outcome,
            queried_at: Utc::now(),
            query_parameters: payload,
            raw_response: raw,
        }
    }

    async fn post(
        &self,
        payload: &serde_json::Value,
    ) -> Result<(IocSearchOutcome, serde_json::Value), String> {
        let mut request = self
            .http
            .post(format!("{}/", self.config.base_url))
            .json(payload)
            .timeout(Duration::from_secs(10));
        if !self.config.api_key.is_empty() {
            request = request.header("Auth-Key", &self.config.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("ThreatFox request failed: {}", e))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err("ThreatFox API: Unauthorized - API key required for access".to_string());
        }
        if status.as_u16() == 403 {
            return Err("ThreatFox API: Forbidden - Invalid API key".to_string());
        }
        if !status.is_success() {
            return Err(format!("ThreatFox API HTTP error (Status: {})", status));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("ThreatFox response was not JSON: {}", e))?;
        let parsed: ThreatFoxResponse =
            serde_json::from_value(raw.clone()).unwrap_or(ThreatFoxResponse {
                query_status: "error".to_string(),
                data: serde_json::Value::Null,
            });

        debug!(
            "ThreatFox API response - query status: {}",
            parsed.query_status
        );

        let outcome = match parsed.query_status.as_str() {
            "ok" => {
                let threats: Vec<ThreatFoxEntry> =
                    serde_json::from_value(parsed.data).unwrap_or_default();
                info!("ThreatFox API response - data items: {}", threats.len());
                if threats.is_empty() {
                    IocSearchOutcome::NoResult
                } else {
                    IocSearchOutcome::Hits { threats }
                }
            }
            "no_result" => IocSearchOutcome::NoResult,
            other => IocSearchOutcome::Error {
                message: format!("Unexpected query status: {}", other),
            },
        };

        Ok((outcome, raw))
    }

    /// Deterministic offline result: indicators carrying a suspicious
    /// keyword yield a seeded malware hit so offline hunts exercise the
    /// full report path; everything else comes back clean.
    fn offline_search(&self, indicator: &Indicator, payload: serde_json::Value) -> IocSearch {
        let lower = indicator.value.to_lowercase();
        let flagged = ["malicious", "suspicious", "bad", "evil"]
            .iter()
            .any(|kw| lower.contains(kw));

        let (outcome, raw) = if flagged {
            let entry = ThreatFoxEntry {
                ioc: indicator.value.clone(),
                threat_type: "botnet_cc".to_string(),
                malware: "win.emotet".to_string(),
                malware_printable: "Emotet".to_string(),
                confidence_level: 75,
                first_seen: Some("2024-11-15".to_string()),
                last_seen: Some("2025-01-10".to_string()),
                tags: vec!["c2".to_string(), "botnet".to_string()],
            };
            let raw = json!({
                "query_status": "ok",
                "data": [serde_json::to_value(&entry).unwrap_or_default()],
            });
            (
                IocSearchOutcome::Hits {
                    threats: vec![entry],
                },
                raw,
            )
        } else {
            (
                IocSearchOutcome::OfflineMode,
                json!({ "query_status": "offline_mode", "data": [] }),
            )
        };

        IocSearch {
            indicator: indicator.clone(),
            outcome,
            queried_at: Utc::now(),
            query_parameters: payload,
            raw_response: raw,
        }
    }
}

fn redact(key: &str) -> &str {
    if key.len() >= 4 {
        &key[key.len() - 4..]
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioc::{IocKind, IocSource};

    fn offline_client() -> ThreatFoxClient {
        ThreatFoxClient::new(ThreatFoxConfig::default(), true)
    }

    #[tokio::test]
    async fn offline_keyword_indicator_yields_seeded_hit() {
        let client = offline_client();
        let indicator = Indicator::new("suspicious-c2.com", IocKind::Domain, IocSource::Extracted);
        let search = client.search_ioc(&indicator).await;
        assert_eq!(search.outcome.match_count(), 1);
        match &search.outcome {
            IocSearchOutcome::Hits { threats } => {
                assert_eq!(threats[0].malware_printable, "Emotet");
            }
            other => panic!("expected hits, got {:?}", other),
        }
        assert_eq!(search.raw_response["query_status"], "ok");
    }

    #[tokio::test]
    async fn offline_plain_indicator_reports_offline_status() {
        let client = offline_client();
        let indicator = Indicator::new("8.8.8.8", IocKind::Ip, IocSource::Provided);
        let search = client.search_ioc(&indicator).await;
        assert!(matches!(search.outcome, IocSearchOutcome::OfflineMode));
        assert_eq!(search.outcome.match_count(), 0);
    }

    #[test]
    fn key_redaction_keeps_last_four() {
        assert_eq!(redact("abcdef1234"), "1234");
        assert_eq!(redact("ab"), "ab");
    }
}
