use std::time::Duration;

use crate::codec::ParserLimits;

/// Per-connection settings shared by every connection of a [`Server`](crate::server::Server).
///
/// ```
/// use std::time::Duration;
/// use micro_h1::server::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .max_body_bytes(1024 * 1024)
///     .read_timeout(Some(Duration::from_secs(5)))
///     .reply_bad_request(true)
///     .build();
///
/// assert_eq!(config.max_headers(), 64);
/// assert!(config.reply_bad_request());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    read_buffer_size: usize,
    max_header_bytes: usize,
    max_headers: usize,
    max_body_bytes: u64,
    read_timeout: Option<Duration>,
    reply_bad_request: bool,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Capacity reserved for every socket read.
    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    pub fn max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    pub fn max_headers(&self) -> usize {
        self.max_headers
    }

    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_bytes
    }

    /// How long a connection may wait for the next bytes, `None` waits forever.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Whether a malformed request is answered with `400 Bad Request` before
    /// the connection is closed.
    pub fn reply_bad_request(&self) -> bool {
        self.reply_bad_request
    }

    pub fn parser_limits(&self) -> ParserLimits {
        ParserLimits {
            max_header_bytes: self.max_header_bytes,
            max_headers: self.max_headers,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let limits = ParserLimits::default();
        Self {
            read_buffer_size: 8 * 1024,
            max_header_bytes: limits.max_header_bytes,
            max_headers: limits.max_headers,
            max_body_bytes: limits.max_body_bytes,
            read_timeout: Some(Duration::from_secs(60)),
            reply_bad_request: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    fn new() -> Self {
        Self { config: ServerConfig::default() }
    }

    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size.max(1);
        self
    }

    pub fn max_header_bytes(mut self, max: usize) -> Self {
        self.config.max_header_bytes = max;
        self
    }

    pub fn max_headers(mut self, max: usize) -> Self {
        self.config.max_headers = max;
        self
    }

    pub fn max_body_bytes(mut self, max: u64) -> Self {
        self.config.max_body_bytes = max;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn reply_bad_request(mut self, reply: bool) -> Self {
        self.config.reply_bad_request = reply;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.read_buffer_size(), 8 * 1024);
        assert_eq!(config.max_header_bytes(), 8 * 1024);
        assert_eq!(config.max_headers(), 64);
        assert_eq!(config.max_body_bytes(), 8 * 1024 * 1024);
        assert_eq!(config.read_timeout(), Some(Duration::from_secs(60)));
        assert!(!config.reply_bad_request());
        assert_eq!(config, ServerConfig::builder().build());
    }

    #[test]
    fn builder_overrides() {
        let config = ServerConfig::builder()
            .read_buffer_size(0)
            .max_header_bytes(1024)
            .max_headers(8)
            .max_body_bytes(16)
            .read_timeout(None)
            .build();

        assert_eq!(config.read_buffer_size(), 1);
        assert_eq!(
            config.parser_limits(),
            ParserLimits { max_header_bytes: 1024, max_headers: 8, max_body_bytes: 16 }
        );
        assert_eq!(config.read_timeout(), None);
    }
}
