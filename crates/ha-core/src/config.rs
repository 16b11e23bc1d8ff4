use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration loaded from `~/.ha-agent/config.toml`.
///
/// **Security**: This struct NEVER stores API keys, tokens, or secrets.
/// All credentials are read from environment variables at runtime.
/// See [`CredentialProvider`] for the env-var-based credential model.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub tunnel: TunnelSection,
}

impl AgentConfig {
    /// Load config from `~/.ha-agent/config.toml`, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            let cfg = AgentConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let cfg: AgentConfig =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Semantic validation for settings that are not expressible via types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.port == 0 {
            return Err(ConfigError::Invalid("agent.port must be non-zero".into()));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// `~/.ha-agent/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ha-agent")
            .join("config.toml")
    }
}

/// `[agent]` — inbound listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Port the HTTP API listens on (overridable via `HA_AGENT_PORT`).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    8099
}

/// `[upstream]` — outbound call tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSection {
    /// Budget for a single upstream call, from dispatch to full body read.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

/// `[tunnel]` — optional sibling process that publishes the agent.
///
/// The daemon only starts this process; it never restarts or otherwise
/// manages it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TunnelSection {
    /// Executable to spawn (e.g. `cloudflared`). `None` disables the tunnel.
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments passed to the tunnel executable.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Reads credentials from environment variables at runtime.
///
/// Empty values are treated as unset so that `VAR=` in a unit file or
/// compose manifest does not count as a configured credential.
pub struct CredentialProvider;

impl CredentialProvider {
    /// Inbound API key from `HA_AGENT_API_KEY`. `None` = open mode.
    pub fn agent_api_key() -> Option<String> {
        Self::non_empty("HA_AGENT_API_KEY")
    }

    /// Supervisor-injected token from `SUPERVISOR_TOKEN`.
    pub fn supervisor_token() -> Option<String> {
        Self::non_empty("SUPERVISOR_TOKEN")
    }

    /// Manually issued long-lived token from `HA_TOKEN`.
    pub fn long_lived_token() -> Option<String> {
        Self::non_empty("HA_TOKEN")
    }

    /// Explicit controller base URL from `HA_BASE_URL`.
    pub fn base_url_override() -> Option<String> {
        Self::non_empty("HA_BASE_URL")
    }

    fn non_empty(var: &str) -> Option<String> {
        std::env::var(var).ok().filter(|s| !s.is_empty())
    }
}

/// A snapshot of all environment credentials, taken once at startup.
///
/// Resolution and the HTTP layer work from this value rather than the
/// process environment so the effective credentials cannot change while
/// the daemon is serving.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub supervisor_token: Option<String>,
    pub long_lived_token: Option<String>,
    pub base_url_override: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            api_key: CredentialProvider::agent_api_key(),
            supervisor_token: CredentialProvider::supervisor_token(),
            long_lived_token: CredentialProvider::long_lived_token(),
            base_url_override: CredentialProvider::base_url_override(),
        }
    }
}

// Token material must never end up in logs via `{:?}`.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field(
                "supervisor_token",
                &self.supervisor_token.as_ref().map(|_| "<set>"),
            )
            .field(
                "long_lived_token",
                &self.long_lived_token.as_ref().map(|_| "<set>"),
            )
            .field("base_url_override", &self.base_url_override)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.agent.port, 8099);
        assert_eq!(cfg.upstream.timeout_secs, 15);
        assert!(cfg.tunnel.command.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn parse_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[agent]
port = 9123

[tunnel]
command = "cloudflared"
args = ["tunnel", "run"]
"#
        )
        .unwrap();

        let cfg = AgentConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.agent.port, 9123);
        // Unspecified sections keep their defaults.
        assert_eq!(cfg.upstream.timeout_secs, 15);
        assert_eq!(cfg.tunnel.command.as_deref(), Some("cloudflared"));
        assert_eq!(cfg.tunnel.args, vec!["tunnel", "run"]);
    }

    #[test]
    fn zero_timeout_rejected() {
        let cfg: AgentConfig = toml::from_str("[upstream]\ntimeout_secs = 0\n").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn credentials_debug_redacts_tokens() {
        let creds = Credentials {
            api_key: Some("inbound-secret".into()),
            supervisor_token: Some("super-secret".into()),
            long_lived_token: None,
            base_url_override: Some("http://ha.local:8123".into()),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("inbound-secret"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("http://ha.local:8123"));
    }
}
