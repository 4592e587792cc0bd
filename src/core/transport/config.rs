//! Transport configuration types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which channel carries invocations to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Line-delimited JSON-RPC over stdin/stdout.
    #[cfg(feature = "stdio")]
    Stdio,

    /// One rmcp session per accepted TCP connection.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// JSON-RPC over HTTP POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

#[cfg(feature = "tcp")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Path of the JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Answer browser preflight requests.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn port_var(vars: &HashMap<String, String>, name: &str, fallback: u16) -> u16 {
    vars.get(name)
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(fallback)
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            Self::Stdio
        }

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        {
            Self::Tcp(TcpConfig::default())
        }

        #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
        {
            Self::Http(HttpConfig::default())
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Select and configure the transport from `MCP_TRANSPORT` and friends.
    ///
    /// Unknown or disabled transports fall back to the default one.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let transport = vars
            .get("MCP_TRANSPORT")
            .map(|t| t.trim().to_lowercase())
            .unwrap_or_default();

        match transport.as_str() {
            #[cfg(feature = "tcp")]
            "tcp" => Self::Tcp(TcpConfig {
                port: port_var(vars, "MCP_TCP_PORT", 3000),
                host: vars
                    .get("MCP_TCP_HOST")
                    .cloned()
                    .unwrap_or_else(default_host),
            }),
            #[cfg(feature = "http")]
            "http" => Self::Http(HttpConfig {
                port: port_var(vars, "MCP_HTTP_PORT", 8080),
                host: vars
                    .get("MCP_HTTP_HOST")
                    .cloned()
                    .unwrap_or_else(default_host),
                rpc_path: vars
                    .get("MCP_HTTP_PATH")
                    .cloned()
                    .unwrap_or_else(default_rpc_path),
                enable_cors: vars
                    .get("MCP_HTTP_CORS")
                    .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
                    .unwrap_or_else(default_cors),
            }),
            _ => Self::default(),
        }
    }

    /// Human-readable description for startup logs.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{}", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }

    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
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
    fn test_unset_transport_uses_default() {
        assert_eq!(TransportConfig::from_vars(&vars(&[])), TransportConfig::default());
        assert_eq!(
            TransportConfig::from_vars(&vars(&[("MCP_TRANSPORT", "carrier-pigeon")])),
            TransportConfig::default()
        );
    }

    #[cfg(feature = "stdio")]
    #[test]
    fn test_stdio_is_default() {
        assert!(TransportConfig::default().is_stdio());
        assert_eq!(TransportConfig::default().description(), "STDIO");
    }

    #[cfg(feature = "tcp")]
    #[test]
    fn test_tcp_from_vars() {
        let config = TransportConfig::from_vars(&vars(&[
            ("MCP_TRANSPORT", "TCP"),
            ("MCP_TCP_PORT", "4100"),
            ("MCP_TCP_HOST", "0.0.0.0"),
        ]));
        assert_eq!(
            config,
            TransportConfig::Tcp(TcpConfig {
                port: 4100,
                host: "0.0.0.0".into()
            })
        );
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_from_vars() {
        let config = TransportConfig::from_vars(&vars(&[
            ("MCP_TRANSPORT", "http"),
            ("MCP_HTTP_PORT", "not-a-port"),
            ("MCP_HTTP_CORS", "false"),
        ]));
        let TransportConfig::Http(http) = config else {
            panic!("expected http transport");
        };
        assert_eq!(http.port, 8080);
        assert_eq!(http.rpc_path, "/mcp");
        assert!(!http.enable_cors);
    }
}
