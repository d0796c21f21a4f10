//! Server locations.
//!
//! A server is addressed as `scheme://host:port`. The scheme picks the
//! transport; see [`connect`](crate::connect).

use std::fmt;
use std::str::FromStr;

use crate::error::{CommsError, Result};

/// The transports a server can be reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Raw TCP stream. One envelope each way, then close.
    File,
    Ws,
    Wss,
    Http,
    Https,
}

impl Scheme {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(Scheme::File),
            "ws" => Some(Scheme::Ws),
            "wss" => Some(Scheme::Wss),
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Scheme::File => "file",
            Scheme::Ws => "ws",
            Scheme::Wss => "wss",
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// A server location. The scheme is kept as given so that an unsupported
/// one can be reported when a transport is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerUrl {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl ServerUrl {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// The scheme, if it names a supported transport.
    pub fn supported_scheme(&self) -> Result<Scheme> {
        Scheme::parse(&self.scheme).ok_or_else(|| CommsError::UnsupportedScheme(self.scheme.clone()))
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority())
    }
}

impl FromStr for ServerUrl {
    type Err = CommsError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CommsError::InvalidUrl(s.to_string());
        let (scheme, rest) = s.split_once("://").ok_or_else(invalid)?;
        let authority = rest.strip_suffix('/').unwrap_or(rest);
        let (host, port) = authority.rsplit_once(':').ok_or_else(invalid)?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let port: u16 = port.parse().map_err(|_| invalid())?;
        if scheme.is_empty() || host.is_empty() || host.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(scheme, host, port))
    }
}
