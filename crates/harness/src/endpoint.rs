//! Address of the service under test

use std::fmt;

/// Where the todo manager is (or will be) listening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let base_url = if host.contains(':') && !host.starts_with('[') {
            // Bare IPv6 literal
            format!("http://[{}]:{}", host, port)
        } else {
            format!("http://{}:{}", host, port)
        };
        Self {
            host,
            port,
            base_url,
        }
    }

    /// Join an absolute API path (e.g. `/todos/3`) onto the base URL
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}
