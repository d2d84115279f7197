//! User-Agent rotation.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Current desktop browser User-Agent strings.
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// Round-robin pool of User-Agent strings shared by all checks.
pub struct UserAgentPool {
    agents: Vec<String>,
    next: AtomicUsize,
}

impl UserAgentPool {
    /// Creates a pool from `agents`, falling back to the built-in list when empty.
    pub fn new(agents: Vec<String>) -> Self {
        let agents = if agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            agents
        };
        Self {
            agents,
            next: AtomicUsize::new(0),
        }
    }

    pub fn next_agent(&self) -> &str {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        &self.agents[idx]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotates_round_robin() {
        let pool = UserAgentPool::new(vec!["a".into(), "b".into()]);
        assert_eq!(pool.next_agent(), "a");
        assert_eq!(pool.next_agent(), "b");
        assert_eq!(pool.next_agent(), "a");
    }

    #[test]
    fn test_default_pool_uses_browser_agents() {
        let pool = UserAgentPool::default();
        assert_eq!(pool.len(), DEFAULT_USER_AGENTS.len());
        assert!(pool.next_agent().starts_with("Mozilla/5.0"));
    }
}
