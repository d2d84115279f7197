//! WAF vendor classification.

use super::types::{ResponseFacts, Verdict, WafMatch};

/// Vendor → signature substrings, matched against the lowercased body and
/// `name: value` header lines. Table order is match priority.
const WAF_SIGNATURES: &[(&str, &[&str])] = &[
    (
        "sucuri",
        &[
            "sucuri website firewall",
            "sucuri/cloudproxy",
            "x-sucuri-id",
            "x-sucuri-block",
            "sucuri.net",
        ],
    ),
    (
        "imperva",
        &[
            "incapsula incident id",
            "_incapsula_resource",
            "x-iinfo",
            "visid_incap",
            "incap_ses",
            "imperva",
        ],
    ),
    (
        "aws_waf",
        &["x-amzn-waf", "aws waf", "awswaf", "x-amzn-errortype: forbiddenexception"],
    ),
    (
        "akamai",
        &["akamaighost", "edgesuite.net", "akamai reference"],
    ),
    (
        "f5_bigip",
        &[
            "the requested url was rejected. please consult with your administrator",
            "bigipserver",
            "x-wa-info",
            "f5 networks",
        ],
    ),
    (
        "modsecurity",
        &[
            "mod_security",
            "modsecurity",
            "not acceptable! an appropriate representation",
        ],
    ),
    (
        "wordfence",
        &["generated by wordfence", "wordfence", "wfwaf-"],
    ),
    ("barracuda", &["barracuda", "barra_counter_session"]),
    ("fortiweb", &["fortiweb", "fortigate", "fgd_icon"]),
    ("citrix_netscaler", &["ns_af=", "citrix_ns_id", "netscaler"]),
    ("stackpath", &["stackpath", "sp-waf"]),
];

/// WAF classifier. Only evaluated for blocking status codes.
pub fn classify(facts: &ResponseFacts) -> Option<Verdict> {
    if !facts.is_blocking_status() {
        return None;
    }

    let header_lines: Vec<String> = facts
        .headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();

    for (vendor, signatures) in WAF_SIGNATURES {
        for signature in *signatures {
            let hit = facts.body.contains(signature)
                || header_lines.iter().any(|line| line.contains(signature));
            if hit {
                return Some(Verdict::Waf(WafMatch {
                    vendor: vendor.to_string(),
                    signature: signature.to_string(),
                    reason: format!(
                        "Blocked by {vendor} WAF (HTTP {}, signature {signature:?})",
                        facts.status
                    ),
                }));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_sucuri_body_signature() {
        let facts = ResponseFacts::new(
            403,
            HashMap::new(),
            "Access Denied - Sucuri Website Firewall",
            40,
        );
        match classify(&facts) {
            Some(Verdict::Waf(m)) => assert_eq!(m.vendor, "sucuri"),
            other => panic!("expected sucuri, got {other:?}"),
        }
    }

    #[test]
    fn test_header_signature() {
        let headers = HashMap::from([("x-iinfo".to_string(), "12-345-0 nnny".to_string())]);
        let facts = ResponseFacts::new(403, headers, "", 40);
        match classify(&facts) {
            Some(Verdict::Waf(m)) => assert_eq!(m.vendor, "imperva"),
            other => panic!("expected imperva, got {other:?}"),
        }
    }

    #[test]
    fn test_not_evaluated_for_success() {
        let facts = ResponseFacts::new(200, HashMap::new(), "protected by wordfence", 40);
        assert!(classify(&facts).is_none());
    }

    #[test]
    fn test_generic_403_no_match() {
        let facts = ResponseFacts::new(403, HashMap::new(), "<h1>Forbidden</h1>", 40);
        assert!(classify(&facts).is_none());
    }
}
