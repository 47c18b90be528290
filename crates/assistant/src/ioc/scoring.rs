//! Threat Scoring
//!
//! Maps detection ratios onto discrete threat levels. The per-indicator and
//! per-incident banding tables are deliberately different and must stay
//! separate functions: one grades a single engine consensus, the other the
//! fraction of confirmed-malicious indicators across a whole incident.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{DetectionResult, ThreatLevel};

/// Grade a single indicator's engine consensus.
///
/// `total_engines == 0` yields `Unknown` rather than a division error,
/// regardless of the malicious count.
pub fn score(detection: &DetectionResult) -> ThreatLevel {
    if detection.total_engines == 0 {
        return ThreatLevel::Unknown;
    }

    let pct = detection.detection_ratio() * 100.0;

    if pct >= 70.0 {
        ThreatLevel::Critical
    } else if pct >= 30.0 {
        ThreatLevel::High
    } else if pct >= 10.0 {
        ThreatLevel::Medium
    } else if pct > 0.0 {
        ThreatLevel::Low
    } else {
        ThreatLevel::Clean
    }
}

/// Grade a whole incident from the fraction of indicators any engine
/// flagged. An empty slice scores `Low` (the 0/0 fraction lands in the
/// else-branch, matching the original report generator).
pub fn aggregate(results: &[DetectionResult]) -> ThreatLevel {
    let malicious = results.iter().filter(|r| r.malicious_count > 0).count();
    let pct = if results.is_empty() {
        0.0
    } else {
        malicious as f64 / results.len() as f64 * 100.0
    };

    if pct >= 75.0 {
        ThreatLevel::Critical
    } else if pct >= 50.0 {
        ThreatLevel::High
    } else if pct >= 25.0 {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

/// How much weight a verdict carries, based on engine coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence from analysis completeness: how many engines reported at all.
pub fn confidence(detection: &DetectionResult) -> Confidence {
    if detection.total_engines >= 60 {
        Confidence::High
    } else if detection.total_engines >= 30 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioc::types::{Indicator, IocKind, IocSource};

    fn detection(malicious: u32, total: u32) -> DetectionResult {
        DetectionResult::new(
            Indicator::new("203.0.113.5", IocKind::Ip, IocSource::Provided),
            malicious,
            total,
        )
    }

    #[test]
    fn per_indicator_bands() {
        assert_eq!(score(&detection(0, 70)), ThreatLevel::Clean);
        assert_eq!(score(&detection(1, 70)), ThreatLevel::Low); // ~1.4%
        assert_eq!(score(&detection(7, 70)), ThreatLevel::Medium); // 10%
        assert_eq!(score(&detection(21, 70)), ThreatLevel::High); // 30%
        assert_eq!(score(&detection(50, 70)), ThreatLevel::Critical); // ~71%
        assert_eq!(score(&detection(49, 70)), ThreatLevel::Critical); // 70% exactly
    }

    #[test]
    fn zero_engines_is_unknown_regardless_of_count() {
        assert_eq!(score(&detection(0, 0)), ThreatLevel::Unknown);
        assert_eq!(score(&detection(45, 0)), ThreatLevel::Unknown);
    }

    #[test]
    fn aggregate_of_empty_slice_is_low() {
        assert_eq!(aggregate(&[]), ThreatLevel::Low);
    }

    #[test]
    fn aggregate_bands_differ_from_per_indicator_bands() {
        // 3 of 4 malicious = 75% -> Critical under incident banding.
        let results = vec![
            detection(5, 70),
            detection(1, 70),
            detection(12, 70),
            detection(0, 70),
        ];
        assert_eq!(aggregate(&results), ThreatLevel::Critical);

        // 1 of 2 = 50% -> High.
        assert_eq!(aggregate(&[detection(3, 70), detection(0, 70)]), ThreatLevel::High);

        // 1 of 4 = 25% -> Medium.
        let results = vec![
            detection(3, 70),
            detection(0, 70),
            detection(0, 70),
            detection(0, 70),
        ];
        assert_eq!(aggregate(&results), ThreatLevel::Medium);

        // 0 of 1 -> Low.
        assert_eq!(aggregate(&[detection(0, 70)]), ThreatLevel::Low);
    }

    #[test]
    fn confidence_tracks_engine_coverage() {
        assert_eq!(confidence(&detection(0, 70)), Confidence::High);
        assert_eq!(confidence(&detection(0, 45)), Confidence::Medium);
        assert_eq!(confidence(&detection(0, 10)), Confidence::Low);
        assert_eq!(confidence(&detection(0, 0)), Confidence::Low);
    }
}
