//! VirusTotal v3 Client
//!
//! Queries the VirusTotal API for file hashes, URLs, IP addresses, and
//! domains. In offline mode (or when no API key is configured) it returns
//! the deterministic mock analyses used for demos and tests; the mock
//! arithmetic is part of the tool contract and must stay stable.

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::ReputationLookup;
use crate::config::VirusTotalConfig;
use crate::ioc::{DetectionResult, Indicator, IocKind};

/// Full analysis record for one indicator, as rendered into reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VtAnalysis {
    pub indicator: Indicator,
    pub malicious: u32,
    pub suspicious: u32,
    pub undetected: u32,
    pub harmless: u32,
    pub total_engines: u32,
    pub reputation: i64,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
    /// Known file names (hash lookups only).
    pub names: Vec<String>,
    pub threat_labels: Vec<String>,
    pub categories: Vec<String>,
    /// Geolocation context (IP lookups only).
    pub country: Option<String>,
    pub as_owner: Option<String>,
    pub network: Option<String>,
}

impl VtAnalysis {
    pub fn detection(&self) -> DetectionResult {
        DetectionResult::new(self.indicator.clone(), self.malicious, self.total_engines)
    }

    pub fn ratio_label(&self) -> String {
        format!("{}/{}", self.malicious, self.total_engines)
    }

    fn base(indicator: &Indicator, malicious: u32, suspicious: u32) -> Self {
        let total_engines: u32 = 70;
        Self {
            indicator: indicator.clone(),
            malicious,
            suspicious,
            undetected: total_engines.saturating_sub(malicious + suspicious),
            harmless: 0,
            total_engines,
            reputation: 0,
            first_seen: Some("2024-12-01".to_string()),
            last_seen: Some("2024-12-15".to_string()),
            names: Vec::new(),
            threat_labels: Vec::new(),
            categories: Vec::new(),
            country: None,
            as_owner: None,
            network: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VtResponse {
    data: VtData,
}

#[derive(Debug, Deserialize)]
struct VtData {
    #[serde(default)]
    attributes: serde_json::Value,
}

/// VirusTotal API client with rate limiting and offline fallback.
pub struct VirusTotalClient {
    config: VirusTotalConfig,
    offline: bool,
    http: Client,
    last_request: Mutex<Option<Instant>>,
}

impl VirusTotalClient {
    pub fn new(config: VirusTotalConfig, offline: bool) -> Self {
        Self {
            config,
            offline,
            http: Client::new(),
            last_request: Mutex::new(None),
        }
    }

    fn online(&self) -> bool {
        !self.offline && !self.config.api_key.is_empty()
    }

    /// Enforce the configured requests-per-minute budget.
    async fn rate_limit(&self) {
        let delay = Duration::from_secs_f64(60.0 / f64::from(self.config.rate_limit));
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < delay {
                let wait = delay - elapsed;
                debug!("Rate limiting: waiting {:?} before next VirusTotal request", wait);
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get(&self, endpoint: &str) -> crate::Result<serde_json::Value> {
        self.rate_limit().await;

        let url = format!("{}/{}", self.config.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .header("x-apikey", &self.config.api_key)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(crate::Error::Intel(format!(
                "VirusTotal request failed with status {}",
                response.status()
            )));
        }

        let parsed: VtResponse = response.json().await?;
        Ok(parsed.data.attributes)
    }

    /// Analyze any supported indicator kind, dispatching on its type.
    pub async fn analyze(&self, indicator: &Indicator) -> crate::Result<VtAnalysis> {
        match indicator.kind {
            IocKind::Md5 | IocKind::Sha1 | IocKind::Sha256 => self.analyze_hash(indicator).await,
            IocKind::Url => self.analyze_url(indicator).await,
            IocKind::Ip | IocKind::IpPort => self.analyze_ip(indicator).await,
            IocKind::Domain => self.analyze_domain(indicator).await,
            IocKind::Unknown => Err(crate::Error::Validation(format!(
                "Unsupported IOC type for VirusTotal lookup: {}",
                indicator.value
            ))),
        }
    }

    async fn analyze_hash(&self, indicator: &Indicator) -> crate::Result<VtAnalysis> {
        if !self.online() {
            return Ok(self.mock_hash(indicator));
        }

        match self.get(&format!("files/{}", indicator.value)).await {
            Ok(attrs) => Ok(self.from_attributes(indicator, &attrs)),
            Err(e) => {
                warn!("VirusTotal hash lookup failed, using mock data: {}", e);
                Ok(self.mock_hash(indicator))
            }
        }
    }

    async fn analyze_url(&self, indicator: &Indicator) -> crate::Result<VtAnalysis> {
        url::Url::parse(&indicator.value)
            .map_err(|e| crate::Error::Validation(format!("Invalid URL indicator: {}", e)))?;

        if !self.online() {
            return Ok(self.mock_url(indicator));
        }

        // VirusTotal addresses URLs by their unpadded urlsafe-base64 id.
        let url_id = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&indicator.value);
        match self.get(&format!("urls/{}", url_id)).await {
            Ok(attrs) => Ok(self.from_attributes(indicator, &attrs)),
            Err(e) => {
                warn!("VirusTotal URL lookup failed, using mock data: {}", e);
                Ok(self.mock_url(indicator))
            }
        }
    }

    async fn analyze_ip(&self, indicator: &Indicator) -> crate::Result<VtAnalysis> {
        if !self.online() {
            return Ok(self.mock_ip(indicator));
        }

        let address = indicator
            .value
            .split(':')
            .next()
            .unwrap_or(&indicator.value)
            .to_string();
        match self.get(&format!("ip_addresses/{}", address)).await {
            Ok(attrs) => {
                let mut analysis = self.from_attributes(indicator, &attrs);
                analysis.country = attrs
                    .get("country")
                    .and_then(|v| v.as_str())
                    .map(String::from);
                analysis.as_owner = attrs
                    .get("as_owner")
                    .and_then(|v| v.as_str())
                    .map(String::from);
                analysis.network = attrs
                    .get("network")
                    .and_then(|v| v.as_str())
                    .map(String::from);
                Ok(analysis)
            }
            Err(e) => {
                warn!("VirusTotal IP lookup failed, using mock data: {}", e);
                Ok(self.mock_ip(indicator))
            }
        }
    }

    async fn analyze_domain(&self, indicator: &Indicator) -> crate::Result<VtAnalysis> {
        if !self.online() {
            return Ok(self.mock_domain(indicator));
        }

        match self.get(&format!("domains/{}", indicator.value)).await {
            Ok(attrs) => Ok(self.from_attributes(indicator, &attrs)),
            Err(e) => {
                warn!("VirusTotal domain lookup failed, using mock data: {}", e);
                Ok(self.mock_domain(indicator))
            }
        }
    }

    /// Build an analysis from a live API response.
    fn from_attributes(&self, indicator: &Indicator, attrs: &serde_json::Value) -> VtAnalysis {
        let stats = attrs
            .get("last_analysis_stats")
            .cloned()
            .unwrap_or_default();
        let stat = |name: &str| -> u32 {
            stats
                .get(name)
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32
        };

        let malicious = stat("malicious");
        let suspicious = stat("suspicious");
        let undetected = stat("undetected");
        let harmless = stat("harmless");

        VtAnalysis {
            indicator: indicator.clone(),
            malicious,
            suspicious,
            undetected,
            harmless,
            total_engines: malicious + suspicious + undetected + harmless,
            reputation: attrs.get("reputation").and_then(|v| v.as_i64()).unwrap_or(0),
            first_seen: attrs
                .get("first_submission_date")
                .map(|v| v.to_string()),
            last_seen: attrs.get("last_analysis_date").map(|v| v.to_string()),
            names: attrs
                .get("names")
                .and_then(|v| v.as_array())
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default(),
            threat_labels: attrs
                .get("popular_threat_classification")
                .and_then(|v| v.get("suggested_threat_label"))
                .and_then(|v| v.as_str())
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            categories: attrs
                .get("categories")
                .and_then(|v| v.as_object())
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default(),
            country: None,
            as_owner: None,
            network: None,
        }
    }

    fn mock_hash(&self, indicator: &Indicator) -> VtAnalysis {
        let value = indicator.value.to_lowercase();
        let mut malicious = (indicator.value.len() % 70) as u32;
        if value.contains("backdoor") || value.contains("malware") {
            malicious = malicious.max(45);
        } else if value.contains("clean") {
            malicious = 0;
        }

        let mut analysis = VtAnalysis::base(indicator, malicious, 2);
        if malicious > 30 {
            analysis.reputation = -i64::from(malicious);
            analysis.names = vec!["suspicious.exe".to_string(), "malware.bin".to_string()];
            analysis.threat_labels = vec!["trojan".to_string(), "backdoor".to_string()];
        } else {
            analysis.names = vec!["document.pdf".to_string()];
        }
        analysis
    }

    fn mock_url(&self, indicator: &Indicator) -> VtAnalysis {
        let malicious = if indicator.value.to_lowercase().contains("malicious") {
            12
        } else {
            0
        };

        let mut analysis = VtAnalysis::base(indicator, malicious, 1);
        if malicious > 5 {
            analysis.reputation = -i64::from(malicious);
            analysis.categories = vec!["malware".to_string()];
            analysis.threat_labels = vec!["phishing".to_string(), "malware".to_string()];
        } else {
            analysis.categories = vec!["benign".to_string()];
        }
        analysis
    }

    fn mock_ip(&self, indicator: &Indicator) -> VtAnalysis {
        let seeded_bad = ["192.168.1.100", "203.0.113.100", "10.0.0.100"];
        let address = indicator.value.split(':').next().unwrap_or(&indicator.value);
        let malicious = if seeded_bad.contains(&address) { 15 } else { 0 };

        let mut analysis = VtAnalysis::base(indicator, malicious, 2);
        if malicious > 5 {
            analysis.reputation = -i64::from(malicious);
            analysis.country = Some("Unknown".to_string());
        } else {
            analysis.country = Some("US".to_string());
        }
        analysis.as_owner = Some("Example ISP".to_string());
        analysis.network = Some("203.0.113.0/24".to_string());
        analysis
    }

    fn mock_domain(&self, indicator: &Indicator) -> VtAnalysis {
        let value = indicator.value.to_lowercase();
        let malicious = if value.contains("malicious") || value.contains("suspicious") {
            8
        } else {
            0
        };

        let mut analysis = VtAnalysis::base(indicator, malicious, 1);
        if malicious > 3 {
            analysis.reputation = -i64::from(malicious);
            analysis.categories = vec!["malware".to_string()];
        } else {
            analysis.categories = vec!["benign".to_string()];
        }
        analysis
    }
}

#[async_trait]
impl ReputationLookup for VirusTotalClient {
    async fn lookup(&self, indicator: &Indicator) -> crate::Result<DetectionResult> {
        Ok(self.analyze(indicator).await?.detection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioc::{IocSource, ThreatLevel};

    fn offline_client() -> VirusTotalClient {
        VirusTotalClient::new(VirusTotalConfig::default(), true)
    }

    fn indicator(value: &str, kind: IocKind) -> Indicator {
        Indicator::new(value, kind, IocSource::Provided)
    }

    #[tokio::test]
    async fn offline_hash_analysis_is_deterministic() {
        let client = offline_client();
        let ind = indicator("deadbeefbackdoor", IocKind::Md5);
        let first = client.analyze(&ind).await.unwrap();
        let second = client.analyze(&ind).await.unwrap();
        assert_eq!(first.malicious, second.malicious);
        assert!(first.malicious >= 45);
        assert_eq!(first.total_engines, 70);
        assert_eq!(first.threat_labels, vec!["trojan", "backdoor"]);
    }

    #[tokio::test]
    async fn clean_hash_scores_clean() {
        let client = offline_client();
        let analysis = client
            .analyze(&indicator("cleanfilehash", IocKind::Md5))
            .await
            .unwrap();
        assert_eq!(analysis.malicious, 0);
        assert_eq!(
            crate::ioc::score(&analysis.detection()),
            ThreatLevel::Clean
        );
    }

    #[tokio::test]
    async fn seeded_bad_ips_are_flagged() {
        let client = offline_client();
        let flagged = client
            .analyze(&indicator("203.0.113.100", IocKind::Ip))
            .await
            .unwrap();
        assert_eq!(flagged.malicious, 15);

        let clean = client
            .analyze(&indicator("8.8.8.8", IocKind::Ip))
            .await
            .unwrap();
        assert_eq!(clean.malicious, 0);
        assert_eq!(clean.country.as_deref(), Some("US"));
    }

    #[tokio::test]
    async fn malicious_url_keyword_drives_mock_score() {
        let client = offline_client();
        let analysis = client
            .analyze(&indicator("http://malicious.example/payload", IocKind::Url))
            .await
            .unwrap();
        assert_eq!(analysis.malicious, 12);
        assert_eq!(analysis.undetected, 70 - 12 - 1);
    }

    #[tokio::test]
    async fn unknown_kind_is_rejected() {
        let client = offline_client();
        let result = client
            .analyze(&indicator("not-an-ioc", IocKind::Unknown))
            .await;
        assert!(matches!(result, Err(crate::Error::Validation(_))));
    }
}
