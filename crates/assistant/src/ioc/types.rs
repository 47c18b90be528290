//! Indicator Data Model
//!
//! Transient value types shared across extraction, scoring, and the
//! reputation clients. All of them are created per invocation and discarded
//! once the caller has rendered its report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an indicator of compromise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IocKind {
    Ip,
    #[serde(rename = "ip:port")]
    IpPort,
    Domain,
    Url,
    Md5,
    Sha1,
    Sha256,
    Unknown,
}

impl IocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IocKind::Ip => "ip",
            IocKind::IpPort => "ip:port",
            IocKind::Domain => "domain",
            IocKind::Url => "url",
            IocKind::Md5 => "md5",
            IocKind::Sha1 => "sha1",
            IocKind::Sha256 => "sha256",
            IocKind::Unknown => "unknown",
        }
    }

    /// True for the three file-hash kinds.
    pub fn is_hash(&self) -> bool {
        matches!(self, IocKind::Md5 | IocKind::Sha1 | IocKind::Sha256)
    }
}

impl fmt::Display for IocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an indicator was handed in by the caller or pulled out of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IocSource {
    Provided,
    Extracted,
}

/// A detected artifact: the raw matched text plus its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub value: String,
    pub kind: IocKind,
    pub source: IocSource,
}

impl Indicator {
    pub fn new(value: impl Into<String>, kind: IocKind, source: IocSource) -> Self {
        Self {
            value: value.into(),
            kind,
            source,
        }
    }

    /// Build an indicator from a bare string, inferring its kind.
    pub fn provided(value: impl Into<String>) -> Self {
        let value = value.into();
        let kind = super::detect::detect_type(&value);
        Self {
            value,
            kind,
            source: IocSource::Provided,
        }
    }
}

/// Per-indicator scan outcome from a reputation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub indicator: Indicator,
    pub malicious_count: u32,
    pub total_engines: u32,
}

impl DetectionResult {
    pub fn new(indicator: Indicator, malicious_count: u32, total_engines: u32) -> Self {
        Self {
            indicator,
            malicious_count,
            total_engines,
        }
    }

    /// Fraction of engines that flagged the indicator; 0 when no engine ran.
    pub fn detection_ratio(&self) -> f64 {
        if self.total_engines == 0 {
            0.0
        } else {
            f64::from(self.malicious_count) / f64::from(self.total_engines)
        }
    }

    /// "45/70" style ratio used in rendered reports.
    pub fn ratio_label(&self) -> String {
        format!("{}/{}", self.malicious_count, self.total_engines)
    }
}

/// Discrete severity band derived from a detection ratio.
///
/// `Unknown` sits outside the ordering: it means no engine produced data,
/// not that the indicator is worse than `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatLevel {
    Clean,
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Clean => "Clean",
            ThreatLevel::Low => "Low",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::High => "High",
            ThreatLevel::Critical => "Critical",
            ThreatLevel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_ratio_is_zero_without_engines() {
        let result = DetectionResult::new(
            Indicator::new("8.8.8.8", IocKind::Ip, IocSource::Provided),
            12,
            0,
        );
        assert_eq!(result.detection_ratio(), 0.0);
    }

    #[test]
    fn threat_levels_order_by_severity() {
        assert!(ThreatLevel::Clean < ThreatLevel::Low);
        assert!(ThreatLevel::High < ThreatLevel::Critical);
    }

    #[test]
    fn kind_serializes_to_lowercase() {
        let json = serde_json::to_string(&IocKind::Sha256).unwrap();
        assert_eq!(json, "\"sha256\"");
        let json = serde_json::to_string(&IocKind::IpPort).unwrap();
        assert_eq!(json, "\"ip:port\"");
    }
}
