//! Per-monitor cookie persistence.
//!
//! A monitor that opts into cookies gets its own jar, keyed by monitor id.
//! Cookies set on any hop are replayed on later hops and later checks for the
//! same monitor, which lets challenge and consent flows that rely on a cookie
//! round-trip settle into a steady state.
//!
//! Jars idle past the store's TTL are discarded lazily on access and in bulk
//! by [`CookieStore::sweep`].

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDateTime, Utc};
use url::Url;

/// A single parsed `Set-Cookie` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cookie {
    name: String,
    value: String,
    domain: String,
    host_only: bool,
    path: String,
    expires: Option<DateTime<Utc>>,
    secure: bool,
}

impl Cookie {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }

    fn matches(&self, url: &Url, now: DateTime<Utc>) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(&host, &self.domain)
        };
        domain_ok
            && path_matches(url.path(), &self.path)
            && (!self.secure || url.scheme() == "https")
            && !self.is_expired(now)
    }
}

struct CookieJar {
    cookies: Vec<Cookie>,
    last_used: Instant,
}

impl CookieJar {
    fn new() -> Self {
        Self {
            cookies: Vec::new(),
            last_used: Instant::now(),
        }
    }

    fn upsert(&mut self, cookie: Cookie, now: DateTime<Utc>) {
        self.cookies.retain(|c| {
            !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path)
        });
        // An already-expired cookie is how servers delete one
        if !cookie.is_expired(now) {
            self.cookies.push(cookie);
        }
    }
}

/// Concurrency-safe store of cookie jars, one per monitor.
pub struct CookieStore {
    jars: RwLock<HashMap<String, CookieJar>>,
    ttl: Duration,
}

impl CookieStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            jars: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Builds the `Cookie` request header for `url`, if the monitor has any
    /// applicable cookies.
    pub fn cookie_header(&self, monitor_id: &str, url: &Url) -> Option<String> {
        let now = Utc::now();
        let mut jars = self.jars.write().unwrap_or_else(|e| e.into_inner());
        let jar = self.live_jar(&mut jars, monitor_id)?;
        jar.last_used = Instant::now();
        jar.cookies.retain(|c| !c.is_expired(now));

        let pairs: Vec<String> = jar
            .cookies
            .iter()
            .filter(|c| c.matches(url, now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Records every `Set-Cookie` value received from `url` into the monitor's jar.
    pub fn store<'a>(
        &self,
        monitor_id: &str,
        url: &Url,
        set_cookies: impl IntoIterator<Item = &'a str>,
    ) {
        let now = Utc::now();
        let parsed: Vec<Cookie> = set_cookies
            .into_iter()
            .filter_map(|raw| parse_set_cookie(raw, url, now))
            .collect();
        if parsed.is_empty() {
            return;
        }

        let mut jars = self.jars.write().unwrap_or_else(|e| e.into_inner());
        if self.live_jar(&mut jars, monitor_id).is_none() {
            jars.insert(monitor_id.to_string(), CookieJar::new());
        }
        if let Some(jar) = jars.get_mut(monitor_id) {
            jar.last_used = Instant::now();
            for cookie in parsed {
                jar.upsert(cookie, now);
            }
        }
    }

    /// Drops jars idle for longer than the TTL. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut jars = self.jars.write().unwrap_or_else(|e| e.into_inner());
        let before = jars.len();
        jars.retain(|_, jar| jar.last_used.elapsed() <= self.ttl);
        before - jars.len()
    }

    pub fn clear(&self, monitor_id: &str) {
        let mut jars = self.jars.write().unwrap_or_else(|e| e.into_inner());
        jars.remove(monitor_id);
    }

    /// Number of jars currently held.
    pub fn len(&self) -> usize {
        self.jars.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the jar for `monitor_id`, evicting it first if it went idle.
    fn live_jar<'j>(
        &self,
        jars: &'j mut HashMap<String, CookieJar>,
        monitor_id: &str,
    ) -> Option<&'j mut CookieJar> {
        let idle = jars
            .get(monitor_id)
            .map(|jar| jar.last_used.elapsed() > self.ttl)?;
        if idle {
            jars.remove(monitor_id);
            log::debug!("Evicted idle cookie jar for monitor {monitor_id}");
            return None;
        }
        jars.get_mut(monitor_id)
    }
}

fn parse_set_cookie(raw: &str, url: &Url, now: DateTime<Utc>) -> Option<Cookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let request_host = url.host_str()?.to_ascii_lowercase();

    let mut cookie = Cookie {
        name: name.to_string(),
        value: value.trim().trim_matches('"').to_string(),
        domain: request_host.clone(),
        host_only: true,
        path: default_path(url.path()),
        expires: None,
        secure: false,
    };
    let mut max_age: Option<i64> = None;

    for attr in parts {
        let (key, val) = match attr.split_once('=') {
            Some((k, v)) => (k.trim().to_ascii_lowercase(), v.trim()),
            None => (attr.trim().to_ascii_lowercase(), ""),
        };
        match key.as_str() {
            "max-age" => max_age = val.parse().ok(),
            "expires" => {
                if cookie.expires.is_none() {
                    cookie.expires = parse_cookie_date(val);
                }
            }
            "domain" => {
                let domain = val.trim_start_matches('.').to_ascii_lowercase();
                if domain.is_empty() {
                    continue;
                }
                if !domain_matches(&request_host, &domain) {
                    log::debug!("Rejecting cookie {name}: domain {domain} does not match {request_host}");
                    return None;
                }
                cookie.domain = domain;
                cookie.host_only = false;
            }
            "path" if val.starts_with('/') => cookie.path = val.to_string(),
            "secure" => cookie.secure = true,
            _ => {}
        }
    }

    // Max-Age wins over Expires
    if let Some(secs) = max_age {
        cookie.expires = Some(if secs <= 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            now + chrono::Duration::seconds(secs)
        });
    }

    Some(cookie)
}

fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    // Netscape-style dashes: "Wed, 21-Oct-2026 07:28:00 GMT"
    NaiveDateTime::parse_from_str(value, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|naive| naive.and_utc())
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}
