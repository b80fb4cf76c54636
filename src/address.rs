// ABOUTME: Server address parsing: validates the configured base URL for the AI-DM backend.
// ABOUTME: Derives REST endpoints and the Socket.IO websocket endpoint from one address.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Engine.IO handshake query appended to the socket endpoint.
const ENGINE_IO_QUERY: &str = "EIO=4&transport=websocket";

/// Reasons a server address is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    #[error("server URL cannot be empty")]
    Empty,
    #[error("invalid server URL '{0}': {1}")]
    Invalid(String, String),
    #[error("unsupported scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    #[error("server URL '{0}' has no host")]
    MissingHost(String),
}

/// A validated base address of the backend, e.g. `http://localhost:5000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    url: Url,
}

impl ServerAddress {
    /// Parse and validate a server address.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        let url = Url::parse(trimmed)
            .map_err(|e| AddressError::Invalid(trimmed.to_string(), e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(AddressError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(AddressError::MissingHost(trimmed.to_string()));
        }
        Ok(Self { url })
    }

    /// Base URL with any trailing slash removed.
    pub fn base(&self) -> String {
        let mut base = format!("{}{}", self.url.origin().ascii_serialization(), self.url.path());
        while base.ends_with('/') {
            base.pop();
        }
        base
    }

    /// Build a REST endpoint URL under this address. `path` must start with '/'.
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}{}", self.base(), path)
    }

    /// Build the Socket.IO websocket endpoint for the given mount path.
    /// Only the host is kept: a base path such as `/realm` scopes REST calls,
    /// while the socket always joins the default `/` namespace.
    pub fn socket_url(&self, socket_path: &str) -> String {
        let scheme = if self.url.scheme() == "https" { "wss" } else { "ws" };
        let host = self.url.host_str().unwrap_or_default();
        let authority = match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let path = socket_path.trim_end_matches('/');
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        format!("{scheme}://{authority}{path}/?{ENGINE_IO_QUERY}")
    }
}

impl FromStr for ServerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_empty_and_blank() {
        assert_eq!(ServerAddress::parse(""), Err(AddressError::Empty));
        assert_eq!(ServerAddress::parse("   "), Err(AddressError::Empty));
    }

    #[test]
    fn parse_rejects_non_http_schemes() {
        assert!(matches!(
            ServerAddress::parse("ftp://example.com"),
            Err(AddressError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            ServerAddress::parse("not a url"),
            Err(AddressError::Invalid(..))
        ));
    }

    #[test]
    fn rest_url_strips_trailing_slash() {
        let addr = ServerAddress::parse("http://localhost:5000/").unwrap();
        assert_eq!(addr.rest_url("/api/players/3"), "http://localhost:5000/api/players/3");
    }

    #[test]
    fn rest_url_keeps_base_path() {
        let addr = ServerAddress::parse("https://dm.example.com/realm/").unwrap();
        assert_eq!(
            addr.rest_url("/sessions/9/end"),
            "https://dm.example.com/realm/sessions/9/end"
        );
    }

    #[test]
    fn socket_url_switches_scheme_and_adds_query() {
        let addr = ServerAddress::parse("http://localhost:5000").unwrap();
        assert_eq!(
            addr.socket_url("/socket.io"),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );

        let secure = ServerAddress::parse("https://dm.example.com").unwrap();
        assert_eq!(
            secure.socket_url("socket.io/"),
            "wss://dm.example.com/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn socket_url_ignores_rest_base_path() {
        let addr = ServerAddress::parse("https://dm.example.com:8443/realm/").unwrap();
        assert_eq!(
            addr.socket_url("/socket.io"),
            "wss://dm.example.com:8443/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn display_uses_trimmed_base() {
        let addr = ServerAddress::parse("http://127.0.0.1:5000/").unwrap();
        assert_eq!(addr.to_string(), "http://127.0.0.1:5000");
    }
}
