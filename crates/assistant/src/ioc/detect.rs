//! IOC Type Detection
//!
//! Pure classification of a single indicator string. No network lookups;
//! callers combine this with extraction or a reputation query themselves.

use super::types::IocKind;
use std::net::Ipv4Addr;

/// Infer the kind of a bare indicator value.
///
/// Rules are checked in order: hash length/charset, URL scheme, IPv4
/// (optionally with a `:port` suffix), then domain. Anything else is
/// `Unknown`. Total function: never fails, even on empty input.
pub fn detect_type(value: &str) -> IocKind {
    let value = value.trim();

    if matches!(value.len(), 32 | 40 | 64) && value.chars().all(|c| c.is_ascii_hexdigit()) {
        return match value.len() {
            64 => IocKind::Sha256,
            40 => IocKind::Sha1,
            _ => IocKind::Md5,
        };
    }

    if value.starts_with("http://") || value.starts_with("https://") || value.starts_with("ftp://")
    {
        return IocKind::Url;
    }

    if let Some(host) = value.split(':').next() {
        if host.parse::<Ipv4Addr>().is_ok() {
            return if value.contains(':') {
                IocKind::IpPort
            } else {
                IocKind::Ip
            };
        }
    }

    if value.contains('.') {
        return IocKind::Domain;
    }

    IocKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_hashes_by_length() {
        assert_eq!(detect_type(&"a".repeat(32)), IocKind::Md5);
        assert_eq!(detect_type(&"b".repeat(40)), IocKind::Sha1);
        assert_eq!(detect_type(&"0".repeat(64)), IocKind::Sha256);
        // Right length but not hex falls through.
        assert_eq!(detect_type(&"z".repeat(32)), IocKind::Unknown);
    }

    #[test]
    fn classifies_urls_by_scheme() {
        assert_eq!(detect_type("https://evil.test/a"), IocKind::Url);
        assert_eq!(detect_type("http://203.0.113.5/payload"), IocKind::Url);
        assert_eq!(detect_type("ftp://drop.example"), IocKind::Url);
    }

    #[test]
    fn classifies_ipv4_with_and_without_port() {
        assert_eq!(detect_type("8.8.8.8"), IocKind::Ip);
        assert_eq!(detect_type("203.0.113.5:4444"), IocKind::IpPort);
        // Out-of-range octets are not a valid address, but still dotted.
        assert_eq!(detect_type("999.1.1.1"), IocKind::Domain);
    }

    #[test]
    fn classifies_domains_and_unknowns() {
        assert_eq!(detect_type("suspicious-c2.com"), IocKind::Domain);
        assert_eq!(detect_type("not-an-ioc"), IocKind::Unknown);
        assert_eq!(detect_type(""), IocKind::Unknown);
        assert_eq!(detect_type("   "), IocKind::Unknown);
    }
}
