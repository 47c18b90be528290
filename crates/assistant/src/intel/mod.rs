//! Reputation Intelligence Clients
//!
//! Capability interface over external reputation services plus the two
//! concrete clients (VirusTotal, ThreatFox). Both run fully offline with
//! deterministic mock data when offline mode is enabled; the scoring layer
//! only ever sees [`DetectionResult`] values, never a concrete client.

pub mod threatfox;
pub mod virustotal;

use async_trait::async_trait;

use crate::ioc::{DetectionResult, Indicator};

/// Looks up an indicator against a reputation service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReputationLookup: Send + Sync {
    async fn lookup(&self, indicator: &Indicator) -> crate::Result<DetectionResult>;
}

pub use threatfox::{IocSearch, IocSearchOutcome, ThreatFoxClient, ThreatFoxEntry};
pub use virustotal::{VirusTotalClient, VtAnalysis};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioc::{scoring, IocKind, IocSource, ThreatLevel};

    #[tokio::test]
    async fn scorer_consumes_the_capability_interface() {
        let mut lookup = MockReputationLookup::new();
        lookup.expect_lookup().returning(|indicator| {
            Ok(DetectionResult::new(indicator.clone(), 50, 70))
        });

        let indicator = Indicator::new(
            "5f4dcc3b5aa765d61d8327deb882cf99",
            IocKind::Md5,
            IocSource::Provided,
        );
        let detection = lookup.lookup(&indicator).await.unwrap();
        assert_eq!(scoring::score(&detection), ThreatLevel::Critical);
    }
}
