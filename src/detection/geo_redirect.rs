//! Geo-redirect classification over a redirect chain's `Location` values.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::types::{GeoRedirectHit, Verdict};
use crate::fetch::Hop;

/// Query parameters that select a locale or country.
const LOCALE_QUERY_PARAMS: &[&str] = &[
    "country", "lang", "language", "locale", "region", "hl", "gl", "cc", "setlang", "market",
];

/// Two-letter language and country codes seen in locale path segments.
const LOCALE_CODES: &[&str] = &[
    "ar", "at", "au", "be", "bg", "br", "ca", "ch", "cl", "cn", "co", "cs", "cz", "da", "de", "dk",
    "el", "en", "es", "et", "eu", "fi", "fr", "gb", "gr", "he", "hk", "hr", "hu", "id", "ie", "il",
    "in", "it", "ja", "jp", "ko", "kr", "lt", "lv", "mx", "my", "nl", "no", "nz", "pe", "ph", "pl",
    "pt", "ro", "ru", "se", "sg", "sk", "sl", "sv", "th", "tr", "tw", "ua", "uk", "us", "vi", "vn",
    "za", "zh",
];

/// Codes that are also common path words (`/my/account`, `/id/123`). These
/// only count with a region suffix, as in `en-in` or `no-no`.
const AMBIGUOUS_CODES: &[&str] = &["co", "id", "in", "my", "no"];

static LOCALE_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| LOCALE_CODES.iter().copied().collect());

/// `de`, `en-us`, `pt_br`
static LOCALE_SEGMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([a-z]{2})(?:[-_]([a-z]{2}))?$").ok());

fn locale_from_segment(segment: &str) -> Option<String> {
    let segment = segment.to_ascii_lowercase();
    let caps = LOCALE_SEGMENT.as_ref()?.captures(&segment)?;
    let lang = caps.get(1)?.as_str();
    let region = caps.get(2).map(|m| m.as_str());
    if !LOCALE_SET.contains(lang) {
        return None;
    }
    if AMBIGUOUS_CODES.contains(&lang) && region.is_none_or(|r| !LOCALE_SET.contains(r)) {
        return None;
    }
    Some(segment.clone())
}

fn locale_in_location(location: &str, base: &str) -> Option<String> {
    let url = Url::parse(base).ok()?.join(location).ok()?;

    if let Some(first) = url.path_segments().and_then(|mut s| s.next()) {
        if let Some(locale) = locale_from_segment(first) {
            return Some(locale);
        }
    }

    url.query_pairs().find_map(|(key, value)| {
        let key = key.to_ascii_lowercase();
        (LOCALE_QUERY_PARAMS.contains(&key.as_str()) && !value.is_empty())
            .then(|| format!("{key}={value}"))
    })
}

/// Reports the first hop whose `Location` points at a locale-specific URL.
pub fn classify(hops: &[Hop]) -> Option<Verdict> {
    hops.iter().enumerate().find_map(|(idx, hop)| {
        let location = hop.location.as_deref()?;
        let locale = locale_in_location(location, &hop.url)?;
        Some(Verdict::GeoRedirect(GeoRedirectHit {
            hop_index: idx,
            location: location.to_string(),
            reason: format!("Redirected to locale-specific URL ({locale}) at hop {}", idx + 1),
            locale,
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn hop(url: &str, status: u16, location: Option<&str>) -> Hop {
        Hop {
            url: url.to_string(),
            status,
            location: location.map(str::to_string),
            headers: HashMap::new(),
            latency_ms: 5,
        }
    }

    #[test]
    fn test_locale_path_segment() {
        let hops = vec![
            hop("https://shop.example/", 302, Some("/de-de/")),
            hop("https://shop.example/de-de/", 200, None),
        ];
        match classify(&hops) {
            Some(Verdict::GeoRedirect(hit)) => {
                assert_eq!(hit.hop_index, 0);
                assert_eq!(hit.locale, "de-de");
            }
            other => panic!("expected geo redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_query_parameter() {
        let hops = vec![hop(
            "https://example.com/",
            302,
            Some("https://example.com/home?country=FR"),
        )];
        match classify(&hops) {
            Some(Verdict::GeoRedirect(hit)) => assert_eq!(hit.locale, "country=FR"),
            other => panic!("expected geo redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_first_matching_hop_reported() {
        let hops = vec![
            hop("http://example.com/", 301, Some("https://example.com/")),
            hop("https://example.com/", 302, Some("/fr/")),
            hop("https://example.com/fr/", 302, Some("/fr/accueil?lang=fr")),
        ];
        match classify(&hops) {
            Some(Verdict::GeoRedirect(hit)) => assert_eq!(hit.hop_index, 1),
            other => panic!("expected geo redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_redirects_not_flagged() {
        let hops = vec![
            hop("http://example.com/", 301, Some("https://example.com/")),
            hop("https://example.com/", 302, Some("/login")),
            hop("https://example.com/login", 302, Some("/ab/")),
        ];
        assert!(classify(&hops).is_none());
    }

    #[test]
    fn test_ambiguous_codes_need_region_suffix() {
        for location in ["/my/account", "/id/123", "/in/", "/no/thanks", "/co/op"] {
            let hops = vec![hop("https://example.com/", 302, Some(location))];
            assert!(classify(&hops).is_none(), "{location} flagged");
        }

        let hops = vec![hop("https://example.com/", 302, Some("/en-in/"))];
        assert!(classify(&hops).is_some());
        let hops = vec![hop("https://example.com/", 302, Some("/my-my/"))];
        assert!(classify(&hops).is_some());
    }
}
