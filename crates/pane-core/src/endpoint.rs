//! `host[:port]` endpoint descriptors.

use std::fmt;
use std::str::FromStr;

use crate::codec::lenient_int;
use crate::error::{PaneError, PaneResult};
use crate::messages::DEFAULT_PORT;

/// A parsed remote application endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host[:port]`, falling back to [`DEFAULT_PORT`].
    pub fn parse(raw: &str) -> PaneResult<Self> {
        Self::parse_with_default(raw, DEFAULT_PORT)
    }

    /// Parse `host[:port]`, falling back to `default_port`.
    ///
    /// The port is split off at the first `:` and coerced leniently, so
    /// `host:80x` means port 80. A port that coerces outside `1..=65535`
    /// is rejected.
    pub fn parse_with_default(raw: &str, default_port: u16) -> PaneResult<Self> {
        let raw = raw.trim();
        let (host, port) = match raw.split_once(':') {
            Some((host, port)) => {
                let value = lenient_int(port);
                let port = u16::try_from(value)
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| {
                        PaneError::InvalidEndpoint(format!("bad port in '{raw}'"))
                    })?;
                (host, port)
            }
            None => (raw, default_port),
        };

        if host.is_empty() {
            return Err(PaneError::InvalidEndpoint(format!("empty host in '{raw}'")));
        }

        Ok(Self::new(host, port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for Endpoint {
    type Err = PaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_host_and_port() {
        let ep = Endpoint::parse("host.example:9000").unwrap();
        assert_eq!(ep.host(), "host.example");
        assert_eq!(ep.port(), 9000);
    }

    #[test]
    fn parse_host_only_uses_default_port() {
        let ep = Endpoint::parse("host.example").unwrap();
        assert_eq!(ep.host(), "host.example");
        assert_eq!(ep.port(), 25279);
    }

    #[test]
    fn parse_custom_default() {
        let ep = Endpoint::parse_with_default("localhost", 4000).unwrap();
        assert_eq!(ep.port(), 4000);
    }

    #[test]
    fn parse_trims_whitespace() {
        let ep: Endpoint = "  apps.local:81 \r\n".parse().unwrap();
        assert_eq!(ep, Endpoint::new("apps.local", 81));
        assert_eq!(ep.to_string(), "apps.local:81");
    }

    #[test]
    fn parse_lenient_port() {
        let ep = Endpoint::parse("h:8080/path").unwrap();
        assert_eq!(ep.port(), 8080);
    }

    #[test]
    fn parse_rejects_bad_ports() {
        assert!(Endpoint::parse("h:").is_err());
        assert!(Endpoint::parse("h:abc").is_err());
        assert!(Endpoint::parse("h:0").is_err());
        assert!(Endpoint::parse("h:70000").is_err());
        assert!(Endpoint::parse("h:-1").is_err());
    }

    #[test]
    fn parse_rejects_empty_host() {
        assert!(Endpoint::parse("").is_err());
        assert!(Endpoint::parse(":9000").is_err());
    }
}
