//! Recommendation Mapper
//!
//! Fixed action lists keyed by threat level. Pure lookup, no computation;
//! callers render these into their report format.

use super::types::ThreatLevel;

/// Security actions for a given threat level, highest priority first.
///
/// Every level maps to a non-empty list; `Unknown` gets the
/// gather-more-intelligence set rather than an empty answer.
pub fn recommend(level: ThreatLevel) -> &'static [&'static str] {
    match level {
        ThreatLevel::Critical => &[
            "Immediately isolate affected systems",
            "Block IOC at network perimeter (firewall/proxy)",
            "Initiate incident response procedures",
            "Scan for lateral movement indicators",
        ],
        ThreatLevel::High => &[
            "Block IOC in security controls",
            "Monitor for related activity",
            "Review system logs for exposure",
            "Consider quarantining suspicious files",
        ],
        ThreatLevel::Medium => &[
            "Add IOC to watchlists for monitoring",
            "Review associated network activity",
            "Update security signatures",
            "Schedule deeper investigation",
        ],
        ThreatLevel::Low => &[
            "Monitor IOC activity",
            "Document for future reference",
            "Consider adding to low-priority watchlist",
        ],
        ThreatLevel::Clean => &[
            "No immediate action required",
            "Continue routine monitoring",
            "Remove from active investigation if applicable",
        ],
        ThreatLevel::Unknown => &[
            "Gather additional intelligence",
            "Submit for further analysis if suspicious",
            "Monitor for future activity",
        ],
    }
}

/// Render recommendations as a Markdown bullet list.
pub fn recommend_markdown(level: ThreatLevel) -> String {
    recommend(level)
        .iter()
        .map(|action| format!("- {}", action))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_level_has_actions() {
        for level in [
            ThreatLevel::Clean,
            ThreatLevel::Low,
            ThreatLevel::Medium,
            ThreatLevel::High,
            ThreatLevel::Critical,
            ThreatLevel::Unknown,
        ] {
            assert!(!recommend(level).is_empty());
        }
    }

    #[test]
    fn critical_leads_with_containment() {
        let first = recommend(ThreatLevel::Critical)[0].to_lowercase();
        assert!(first.contains("isolate"));
    }

    #[test]
    fn markdown_rendering_bullets_each_action() {
        let md = recommend_markdown(ThreatLevel::Low);
        assert_eq!(md.lines().count(), recommend(ThreatLevel::Low).len());
        assert!(md.lines().all(|l| l.starts_with("- ")));
    }
}
