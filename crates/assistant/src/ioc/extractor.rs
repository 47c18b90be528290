//! IOC Extractor
//!
//! Scans free text for indicator patterns (hashes, URLs, IPv4 addresses,
//! domains), filters benign-looking domains, deduplicates, and caps the
//! result size. Matcher precedence is hash > URL > IP > domain: a span
//! claimed by an earlier matcher is never re-captured by a later one, but
//! the final output preserves left-to-right source order.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::types::{Indicator, IocKind, IocSource};

lazy_static! {
    static ref SHA256_RE: Regex = Regex::new(r"\b[a-fA-F0-9]{64}\b").unwrap();
    static ref SHA1_RE: Regex = Regex::new(r"\b[a-fA-F0-9]{40}\b").unwrap();
    static ref MD5_RE: Regex = Regex::new(r"\b[a-fA-F0-9]{32}\b").unwrap();
    static ref URL_RE: Regex =
        Regex::new(r#"(?:https?|ftp)://[^\s<>"'{}|\\^`\[\]]+"#).unwrap();
    static ref IPV4_RE: Regex = Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap();
    static ref DOMAIN_RE: Regex =
        Regex::new(r"\b(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}\b")
            .unwrap();
}

fn default_benign_tlds() -> HashSet<String> {
    ["com", "org", "net", "local", "internal"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_suspicious_keywords() -> HashSet<String> {
    ["suspicious", "malicious", "bad"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_results() -> usize {
    10
}

/// Configuration for the extractor's false-positive filter and output cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// TLDs (without the leading dot) whose domains are dropped unless a
    /// suspicious keyword appears in the matched domain.
    #[serde(default = "default_benign_tlds")]
    pub benign_tlds: HashSet<String>,
    /// Keywords that override the benign-TLD filter, matched
    /// case-insensitively against the domain text.
    #[serde(default = "default_suspicious_keywords")]
    pub suspicious_keywords: HashSet<String>,
    /// Hard cap on the number of indicators returned.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            benign_tlds: default_benign_tlds(),
            suspicious_keywords: default_suspicious_keywords(),
            max_results: default_max_results(),
        }
    }
}

/// Regex-driven indicator extractor.
///
/// The domain filter is a heuristic carried over from the original rule
/// set: it produces false negatives for benign-looking malicious domains
/// and false positives for legitimate names containing a keyword as a
/// substring. Tune `ExtractorConfig` rather than the matchers.
#[derive(Debug, Clone, Default)]
pub struct IocExtractor {
    config: ExtractorConfig,
}

impl IocExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract indicators from arbitrary text.
    ///
    /// Returns at most `config.max_results` indicators, deduplicated by
    /// `(value, kind)`, ordered by first occurrence in the text. Running
    /// twice over the same text yields identical output.
    pub fn extract(&self, text: &str) -> Vec<Indicator> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // (start, end) spans already claimed by a higher-precedence matcher.
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut found: Vec<(usize, Indicator)> = Vec::new();

        let passes: [(&Regex, IocKind); 6] = [
            (&SHA256_RE, IocKind::Sha256),
            (&SHA1_RE, IocKind::Sha1),
            (&MD5_RE, IocKind::Md5),
            (&URL_RE, IocKind::Url),
            (&IPV4_RE, IocKind::Ip),
            (&DOMAIN_RE, IocKind::Domain),
        ];

        for (re, kind) in passes {
            for m in re.find_iter(text) {
                let mut value = m.as_str();
                let mut end = m.end();
                // Trailing sentence punctuation is not part of a URL.
                if kind == IocKind::Url {
                    let trimmed = value.trim_end_matches(['.', ',', ';', '!', '?']);
                    end -= value.len() - trimmed.len();
                    value = trimmed;
                }

                if claimed.iter().any(|&(s, e)| m.start() < e && end > s) {
                    continue;
                }

                if kind == IocKind::Domain && !self.keep_domain(value) {
                    continue;
                }

                claimed.push((m.start(), end));
                found.push((
                    m.start(),
                    Indicator::new(value, kind, IocSource::Extracted),
                ));
            }
        }

        found.sort_by_key(|(start, _)| *start);

        let mut seen: HashSet<(String, IocKind)> = HashSet::new();
        let mut indicators: Vec<Indicator> = Vec::new();
        for (_, indicator) in found {
            if indicators.len() >= self.config.max_results {
                break;
            }
            if seen.insert((indicator.value.clone(), indicator.kind)) {
                indicators.push(indicator);
            }
        }

        debug!(
            count = indicators.len(),
            "IOC extraction found: {:?}",
            indicators.iter().map(|i| &i.value).collect::<Vec<_>>()
        );

        indicators
    }

    /// Benign-TLD filter with a suspicious-keyword override.
    fn keep_domain(&self, domain: &str) -> bool {
        let lower = domain.to_lowercase();
        let tld = lower.rsplit('.').next().unwrap_or("");
        if !self.config.benign_tlds.contains(tld) {
            return true;
        }
        self.config
            .suspicious_keywords
            .iter()
            .any(|kw| lower.contains(kw))
    }
}
