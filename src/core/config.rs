//! Configuration management for the tool server.
//!
//! Configuration is read once at startup from a mapping of variable names to
//! values. [`Config::from_env`] feeds it the process environment (after
//! loading `.env`), tests feed it an explicit map through
//! [`Config::from_vars`]. Nothing is reconfigured at runtime.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{Error, Result};
use super::transport::TransportConfig;
use crate::domains::tools::UnknownToolPolicy;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1";
pub const DEFAULT_VERCEL_API_URL: &str = "https://api.vercel.com";
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub transport: TransportConfig,

    /// The single toolset this process serves.
    pub toolset: Toolset,

    pub dispatch: DispatchConfig,
    pub upstream: UpstreamConfig,
    pub credentials: CredentialsConfig,
    pub security: SecurityConfig,
}

/// Server identification reported to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "tool-dispatch-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// The family of tools a server exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toolset {
    Github,
    BraveSearch,
    #[default]
    Fetch,
    Filesystem,
    Vercel,
}

impl Toolset {
    pub const ALL: [Toolset; 5] = [
        Toolset::Github,
        Toolset::BraveSearch,
        Toolset::Fetch,
        Toolset::Filesystem,
        Toolset::Vercel,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "github" => Some(Self::Github),
            "brave_search" | "brave" => Some(Self::BraveSearch),
            "fetch" => Some(Self::Fetch),
            "filesystem" | "fs" => Some(Self::Filesystem),
            "vercel" => Some(Self::Vercel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::BraveSearch => "brave_search",
            Self::Fetch => "fetch",
            Self::Filesystem => "filesystem",
            Self::Vercel => "vercel",
        }
    }
}

impl fmt::Display for Toolset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub unknown_tool_policy: UnknownToolPolicy,
}

/// Where upstream APIs live and how long a call may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
    pub github_api_url: String,
    pub brave_api_url: String,
    pub vercel_api_url: String,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_UPSTREAM_TIMEOUT_MS,
            user_agent: format!("tool-dispatch-server/{}", env!("CARGO_PKG_VERSION")),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            brave_api_url: DEFAULT_BRAVE_API_URL.to_string(),
            vercel_api_url: DEFAULT_VERCEL_API_URL.to_string(),
        }
    }
}

/// API credentials, resolved once at startup.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub github_token: Option<String>,
    pub brave_api_key: Option<String>,
    pub vercel_token: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("CredentialsConfig")
            .field("github_token", &redact(&self.github_token))
            .field("brave_api_key", &redact(&self.brave_api_key))
            .field("vercel_token", &redact(&self.vercel_token))
            .finish()
    }
}

/// Filesystem access policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Directories filesystem tools may touch. Empty means the current
    /// working directory.
    pub allowed_dirs: Vec<PathBuf>,

    /// Whether symlinks resolving inside an allowed directory are accepted.
    pub allow_symlinks: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_dirs: Vec::new(),
            allow_symlinks: true,
        }
    }
}

fn non_empty(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env`, then build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build the configuration from an explicit name to value mapping.
    ///
    /// Malformed values for the toolset, the unknown-tool policy, the
    /// upstream timeout or the symlink flag are rejected rather than
    /// silently defaulted.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(name) = non_empty(vars, "MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = non_empty(vars, "MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_vars(vars);

        if let Some(toolset) = non_empty(vars, "MCP_TOOLSET") {
            config.toolset = Toolset::parse(&toolset)
                .ok_or_else(|| Error::config(format!("unknown toolset '{toolset}'")))?;
        }

        if let Some(policy) = non_empty(vars, "MCP_UNKNOWN_TOOL_POLICY") {
            config.dispatch.unknown_tool_policy = UnknownToolPolicy::parse(&policy).ok_or_else(
                || Error::config(format!("unknown tool policy '{policy}' (expected envelope or fault)")),
            )?;
        }

        if let Some(timeout) = non_empty(vars, "MCP_UPSTREAM_TIMEOUT_MS") {
            config.upstream.timeout_ms = timeout
                .parse()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| Error::config(format!("invalid MCP_UPSTREAM_TIMEOUT_MS '{timeout}'")))?;
        }

        if let Some(url) = non_empty(vars, "MCP_GITHUB_API_URL") {
            config.upstream.github_api_url = url;
        }
        if let Some(url) = non_empty(vars, "MCP_BRAVE_API_URL") {
            config.upstream.brave_api_url = url;
        }
        if let Some(url) = non_empty(vars, "MCP_VERCEL_API_URL") {
            config.upstream.vercel_api_url = url;
        }

        config.credentials.github_token = non_empty(vars, "GITHUB_PERSONAL_ACCESS_TOKEN")
            .or_else(|| non_empty(vars, "GITHUB_API_TOKEN"));
        config.credentials.brave_api_key = non_empty(vars, "BRAVE_SEARCH_API_KEY");
        config.credentials.vercel_token = non_empty(vars, "VERCEL_API_TOKEN");

        if let Some(dirs) = non_empty(vars, "FILESYSTEM_BASE_DIRS") {
            config.security.allowed_dirs = dirs
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(PathBuf::from)
                .collect();
        }

        if let Some(flag) = non_empty(vars, "MCP_ALLOW_SYMLINKS") {
            config.security.allow_symlinks = parse_flag(&flag)
                .ok_or_else(|| Error::config(format!("invalid MCP_ALLOW_SYMLINKS '{flag}'")))?;
        }

        Ok(config)
    }

    /// Log the effective setup. Call once logging is initialized.
    pub fn log_summary(&self) {
        info!(
            "Toolset {} with unknown-tool policy {:?}",
            self.toolset, self.dispatch.unknown_tool_policy
        );

        match self.toolset {
            Toolset::Github if self.credentials.github_token.is_none() => {
                warn!("GITHUB_PERSONAL_ACCESS_TOKEN not set; the github toolset will refuse to start")
            }
            Toolset::BraveSearch if self.credentials.brave_api_key.is_none() => {
                warn!("BRAVE_SEARCH_API_KEY not set; search calls will be rejected as unauthorized")
            }
            Toolset::Vercel if self.credentials.vercel_token.is_none() => {
                warn!("VERCEL_API_TOKEN not set; Vercel calls will be rejected as unauthorized")
            }
            Toolset::Filesystem if self.security.allowed_dirs.is_empty() => {
                warn!("FILESYSTEM_BASE_DIRS not set; filesystem tools are confined to the working directory")
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_from_empty_mapping() {
        let config = Config::from_vars(&vars(&[])).unwrap();
        assert_eq!(config.toolset, Toolset::Fetch);
        assert_eq!(config.dispatch.unknown_tool_policy, UnknownToolPolicy::Envelope);
        assert_eq!(config.upstream.timeout_ms, DEFAULT_UPSTREAM_TIMEOUT_MS);
        assert_eq!(config.upstream.github_api_url, DEFAULT_GITHUB_API_URL);
        assert!(config.credentials.github_token.is_none());
        assert!(config.security.allowed_dirs.is_empty());
        assert!(config.security.allow_symlinks);
    }

    #[test]
    fn test_from_vars_reads_every_section() {
        let config = Config::from_vars(&vars(&[
            ("MCP_SERVER_NAME", "github-tools"),
            ("MCP_LOG_LEVEL", "debug"),
            ("MCP_TOOLSET", "github"),
            ("MCP_UNKNOWN_TOOL_POLICY", "fault"),
            ("MCP_UPSTREAM_TIMEOUT_MS", "2500"),
            ("MCP_GITHUB_API_URL", "http://127.0.0.1:9999"),
            ("GITHUB_API_TOKEN", "ghp_alias"),
            ("BRAVE_SEARCH_API_KEY", "brave"),
            ("FILESYSTEM_BASE_DIRS", "/srv/data, /tmp/scratch ,"),
            ("MCP_ALLOW_SYMLINKS", "no"),
        ]))
        .unwrap();

        assert_eq!(config.server.name, "github-tools");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.toolset, Toolset::Github);
        assert_eq!(config.dispatch.unknown_tool_policy, UnknownToolPolicy::Fault);
        assert_eq!(config.upstream.timeout(), Duration::from_millis(2500));
        assert_eq!(config.upstream.github_api_url, "http://127.0.0.1:9999");
        assert_eq!(config.credentials.github_token.as_deref(), Some("ghp_alias"));
        assert_eq!(config.credentials.brave_api_key.as_deref(), Some("brave"));
        assert_eq!(
            config.security.allowed_dirs,
            vec![PathBuf::from("/srv/data"), PathBuf::from("/tmp/scratch")]
        );
        assert!(!config.security.allow_symlinks);
    }

    #[test]
    fn test_personal_access_token_wins_over_alias() {
        let config = Config::from_vars(&vars(&[
            ("GITHUB_PERSONAL_ACCESS_TOKEN", "ghp_primary"),
            ("GITHUB_API_TOKEN", "ghp_alias"),
        ]))
        .unwrap();
        assert_eq!(config.credentials.github_token.as_deref(), Some("ghp_primary"));
    }

    #[test]
    fn test_blank_credentials_are_absent() {
        let config = Config::from_vars(&vars(&[("VERCEL_API_TOKEN", "   ")])).unwrap();
        assert!(config.credentials.vercel_token.is_none());
    }

    #[test]
    fn test_malformed_values_rejected() {
        for (name, value) in [
            ("MCP_TOOLSET", "mindmap"),
            ("MCP_UNKNOWN_TOOL_POLICY", "raise"),
            ("MCP_UPSTREAM_TIMEOUT_MS", "soon"),
            ("MCP_UPSTREAM_TIMEOUT_MS", "0"),
            ("MCP_ALLOW_SYMLINKS", "maybe"),
        ] {
            let err = Config::from_vars(&vars(&[(name, value)])).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{name}={value}");
        }
    }

    #[test]
    fn test_toolset_parse_accepts_aliases() {
        assert_eq!(Toolset::parse("Brave-Search"), Some(Toolset::BraveSearch));
        assert_eq!(Toolset::parse("fs"), Some(Toolset::Filesystem));
        for toolset in Toolset::ALL {
            assert_eq!(Toolset::parse(toolset.as_str()), Some(toolset));
        }
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsConfig {
            github_token: Some("ghp_super_secret".to_string()),
            brave_api_key: None,
            vercel_token: Some("vercel_secret".to_string()),
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("ghp_super_secret"));
        assert!(!debug_str.contains("vercel_secret"));
    }
}
