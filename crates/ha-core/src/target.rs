//! Effective upstream target resolution.
//!
//! The agent talks to exactly one controller endpoint for its entire
//! lifetime. Which (token, base URL) pair it uses is decided once at
//! startup from the credential snapshot, never per request.

use crate::config::Credentials;

/// Internal proxy address valid only with a supervisor token. The `/core`
/// path component is part of the base URL and must survive URL joining.
pub const SUPERVISOR_PROXY_URL: &str = "http://supervisor/core";

/// Direct controller address used when no explicit override is given.
pub const DEFAULT_BASE_URL: &str = "http://homeassistant.local:8123";

/// Which credential won the precedence rule. Logged at startup; the token
/// itself never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Supervisor,
    LongLived,
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Supervisor => write!(f, "supervisor"),
            TokenSource::LongLived => write!(f, "long-lived"),
        }
    }
}

/// The resolved (token, base URL) pair used for all outbound calls.
#[derive(Clone)]
pub struct UpstreamTarget {
    pub token: String,
    /// Base URL with any trailing slashes stripped, so paths can be
    /// appended by plain concatenation.
    pub base_url: String,
    pub source: TokenSource,
}

impl UpstreamTarget {
    /// Apply the precedence rule:
    ///
    /// 1. supervisor token → internal proxy address, overrides ignored;
    /// 2. long-lived token → explicit override, else the default direct
    ///    address;
    /// 3. neither → `None`; callers must fail fast without a network
    ///    attempt.
    pub fn resolve(creds: &Credentials) -> Option<Self> {
        if let Some(token) = &creds.supervisor_token {
            return Some(Self {
                token: token.clone(),
                base_url: SUPERVISOR_PROXY_URL.to_string(),
                source: TokenSource::Supervisor,
            });
        }
        let token = creds.long_lived_token.as_ref()?;
        let base_url = creds
            .base_url_override
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL);
        Some(Self {
            token: token.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            source: TokenSource::LongLived,
        })
    }
}

// Redact the token; base URL and source are fine to print.
impl std::fmt::Debug for UpstreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamTarget")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("source", &self.source)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(
        supervisor: Option<&str>,
        long_lived: Option<&str>,
        override_url: Option<&str>,
    ) -> Credentials {
        Credentials {
            api_key: None,
            supervisor_token: supervisor.map(String::from),
            long_lived_token: long_lived.map(String::from),
            base_url_override: override_url.map(String::from),
        }
    }

    #[test]
    fn supervisor_token_wins_even_with_override() {
        let target = UpstreamTarget::resolve(&creds(
            Some("sup-token"),
            Some("ll-token"),
            Some("http://elsewhere:8123"),
        ))
        .unwrap();
        assert_eq!(target.token, "sup-token");
        assert_eq!(target.base_url, SUPERVISOR_PROXY_URL);
        assert_eq!(target.source, TokenSource::Supervisor);
    }

    #[test]
    fn long_lived_uses_override_verbatim() {
        let target =
            UpstreamTarget::resolve(&creds(None, Some("ll-token"), Some("http://ha.lan:8123")))
                .unwrap();
        assert_eq!(target.token, "ll-token");
        assert_eq!(target.base_url, "http://ha.lan:8123");
        assert_eq!(target.source, TokenSource::LongLived);
    }

    #[test]
    fn override_trailing_slash_stripped() {
        let target =
            UpstreamTarget::resolve(&creds(None, Some("t"), Some("http://ha.lan:8123/"))).unwrap();
        assert_eq!(target.base_url, "http://ha.lan:8123");
    }

    #[test]
    fn long_lived_falls_back_to_default_address() {
        let target = UpstreamTarget::resolve(&creds(None, Some("t"), None)).unwrap();
        assert_eq!(target.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn no_tokens_resolves_to_none() {
        assert!(UpstreamTarget::resolve(&creds(None, None, Some("http://ha.lan"))).is_none());
    }

    #[test]
    fn debug_never_prints_token() {
        let target = UpstreamTarget::resolve(&creds(Some("sup-token"), None, None)).unwrap();
        let debug = format!("{target:?}");
        assert!(!debug.contains("sup-token"));
        assert!(debug.contains(SUPERVISOR_PROXY_URL));
    }
}
