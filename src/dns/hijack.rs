//! DNS hijack heuristics.
//!
//! A resolution is suspicious when it returns:
//! - a known sinkhole / block-page / null-route address,
//! - a loopback address for a hostname that isn't itself a loopback name,
//! - a private-range address for a domain known to be publicly hosted.
//!
//! These checks run on every resolution, cached or fresh.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

/// Sinkhole, filtering block-page and null-route addresses returned by
/// tampering resolvers.
const SINKHOLE_ADDRESSES: &[&str] = &[
    "0.0.0.0",
    "::",
    // Iranian national filtering block page
    "10.10.34.34",
    "10.10.34.35",
    "10.10.34.36",
    // Cisco Umbrella / OpenDNS block pages
    "146.112.61.104",
    "146.112.61.105",
    "146.112.61.106",
    "146.112.61.107",
    "146.112.61.108",
    "146.112.61.110",
    // Turkish court-order block page
    "195.175.254.2",
    // Common ISP NXDOMAIN-redirect landing pages
    "92.242.132.24",
    "198.105.244.11",
    "198.105.254.11",
];

/// Domains whose records are always public; a private answer for any of them
/// (or their subdomains) means the resolver lied.
const KNOWN_PUBLIC_DOMAINS: &[&str] = &[
    "google.com",
    "youtube.com",
    "facebook.com",
    "instagram.com",
    "whatsapp.com",
    "twitter.com",
    "x.com",
    "wikipedia.org",
    "amazon.com",
    "apple.com",
    "microsoft.com",
    "cloudflare.com",
    "github.com",
    "netflix.com",
    "linkedin.com",
    "reddit.com",
    "telegram.org",
    "bbc.co.uk",
    "nytimes.com",
    "yahoo.com",
];

static SINKHOLES: LazyLock<HashSet<IpAddr>> = LazyLock::new(|| {
    SINKHOLE_ADDRESSES
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect()
});

/// Returns a reason string when the answer for `hostname` looks hijacked.
pub fn detect_hijack(hostname: &str, ips: &[IpAddr]) -> Option<String> {
    for ip in ips {
        if SINKHOLES.contains(ip) {
            return Some(format!(
                "{hostname} resolved to known sinkhole address {ip}"
            ));
        }
    }

    if !is_loopback_name(hostname) {
        if let Some(ip) = ips.iter().find(|ip| ip.is_loopback()) {
            return Some(format!(
                "{hostname} resolved to loopback address {ip}"
            ));
        }
    }

    if is_known_public_domain(hostname) {
        if let Some(ip) = ips.iter().find(|ip| !is_public_ip(**ip)) {
            return Some(format!(
                "{hostname} is a public domain but resolved to private address {ip}"
            ));
        }
    }

    None
}

fn is_loopback_name(hostname: &str) -> bool {
    hostname == "localhost"
        || hostname.ends_with(".localhost")
        || hostname == "localhost.localdomain"
}

fn is_known_public_domain(hostname: &str) -> bool {
    KNOWN_PUBLIC_DOMAINS.iter().any(|domain| {
        hostname == *domain
            || hostname
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_ipv4(v4),
        IpAddr::V6(v6) => is_public_ipv6(v6),
    }
}

fn is_public_ipv4(ip: Ipv4Addr) -> bool {
    let o = ip.octets();
    // Loopback 127.0.0.0/8
    if o[0] == 127 {
        return false;
    }
    // Private 10.0.0.0/8
    if o[0] == 10 {
        return false;
    }
    // Private 172.16.0.0/12
    if o[0] == 172 && (16..=31).contains(&o[1]) {
        return false;
    }
    // Private 192.168.0.0/16
    if o[0] == 192 && o[1] == 168 {
        return false;
    }
    // Carrier-grade NAT 100.64.0.0/10
    if o[0] == 100 && (64..=127).contains(&o[1]) {
        return false;
    }
    // Link-local 169.254.0.0/16
    if o[0] == 169 && o[1] == 254 {
        return false;
    }
    // This-network 0.0.0.0/8
    if o[0] == 0 {
        return false;
    }
    // Multicast 224.0.0.0/4 and reserved 240.0.0.0/4
    if o[0] >= 224 {
        return false;
    }
    true
}

fn is_public_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_ipv4(v4);
    }
    let s = ip.segments();
    // ::1 loopback and :: unspecified
    if ip.is_loopback() || ip.is_unspecified() {
        return false;
    }
    // fc00::/7 unique-local
    if (s[0] & 0xfe00) == 0xfc00 {
        return false;
    }
    // fe80::/10 link-local
    if (s[0] & 0xffc0) == 0xfe80 {
        return false;
    }
    // ff00::/8 multicast
    if s[0] & 0xff00 == 0xff00 {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ips(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_sinkhole_addresses_are_flagged() {
        for addr in ["0.0.0.0", "146.112.61.104", "10.10.34.35"] {
            let reason = detect_hijack("example.org", &ips(&[addr]));
            assert!(reason.is_some(), "{addr} should be flagged");
            assert!(reason.unwrap().contains("sinkhole"));
        }
    }

    #[test]
    fn test_sinkhole_among_valid_addresses_is_flagged() {
        let reason = detect_hijack("example.org", &ips(&["93.184.216.34", "0.0.0.0"]));
        assert!(reason.is_some());
    }

    #[test]
    fn test_loopback_for_regular_host_is_flagged() {
        let reason = detect_hijack("shop.example.org", &ips(&["127.0.0.1"]));
        assert!(reason.unwrap().contains("loopback"));

        let reason = detect_hijack("shop.example.org", &ips(&["::1"]));
        assert!(reason.is_some());
    }

    #[test]
    fn test_loopback_for_localhost_is_fine() {
        assert!(detect_hijack("localhost", &ips(&["127.0.0.1"])).is_none());
        assert!(detect_hijack("api.localhost", &ips(&["127.0.0.1"])).is_none());
    }

    #[test]
    fn test_private_address_for_public_domain_is_flagged() {
        let reason = detect_hijack("www.google.com", &ips(&["192.168.1.10"]));
        assert!(reason.unwrap().contains("private"));
        assert!(detect_hijack("google.com", &ips(&["10.0.0.1"])).is_some());
    }

    #[test]
    fn test_private_address_for_unknown_domain_is_allowed() {
        // Internal hosts legitimately resolve to RFC1918 space
        assert!(detect_hijack("intranet.corp.example", &ips(&["10.1.2.3"])).is_none());
    }

    #[test]
    fn test_suffix_match_requires_label_boundary() {
        // "notgoogle.com" is not a subdomain of google.com
        assert!(detect_hijack("notgoogle.com", &ips(&["192.168.1.1"])).is_none());
    }

    #[test]
    fn test_public_answers_pass() {
        assert!(detect_hijack("google.com", &ips(&["142.250.80.46"])).is_none());
        assert!(detect_hijack("example.com", &ips(&["2606:2800:220:1::248"])).is_none());
    }

    #[test]
    fn test_private_ipv4() {
        assert!(!is_public_ipv4(Ipv4Addr::new(127, 0, 0, 1)));
        assert!(!is_public_ipv4(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(!is_public_ipv4(Ipv4Addr::new(172, 16, 0, 1)));
        assert!(!is_public_ipv4(Ipv4Addr::new(192, 168, 1, 1)));
        assert!(!is_public_ipv4(Ipv4Addr::new(100, 64, 0, 1)));
        assert!(!is_public_ipv4(Ipv4Addr::new(169, 254, 1, 1)));
        assert!(is_public_ipv4(Ipv4Addr::new(8, 8, 8, 8)));
        assert!(is_public_ipv4(Ipv4Addr::new(172, 32, 0, 1)));
    }

    #[test]
    fn test_private_ipv6() {
        assert!(!is_public_ipv6(Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 1)));
        assert!(!is_public_ipv6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1)));
        assert!(!is_public_ipv6("::ffff:192.168.0.1".parse().unwrap()));
        assert!(is_public_ipv6(Ipv6Addr::new(0x2001, 0x4860, 0, 0, 0, 0, 0, 0x8888)));
    }
}
