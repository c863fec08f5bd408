//! Codec configuration.
//!
//! Settings that change how packets are framed and columns are decoded.
//! Built with the usual chained setters:
//!
//! ```
//! use sqlbind_mysql::CodecConfig;
//!
//! let config = CodecConfig::new().json_enabled(false).max_payload_len(1 << 20);
//! assert!(!config.json_enabled);
//! ```

use crate::protocol::MAX_PAYLOAD_LEN;

/// Codec configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Parse JSON columns into structured values (otherwise they decode as text)
    pub json_enabled: bool,
    /// Largest payload accepted by the framer (capped at 16MB - 2)
    pub max_payload_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            json_enabled: true,
            max_payload_len: MAX_PAYLOAD_LEN,
        }
    }
}

impl CodecConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable structured JSON column decoding.
    pub fn json_enabled(mut self, enabled: bool) -> Self {
        self.json_enabled = enabled;
        self
    }

    /// Set the largest accepted payload.
    pub fn max_payload_len(mut self, len: usize) -> Self {
        self.max_payload_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::new();
        assert!(config.json_enabled);
        assert_eq!(config.max_payload_len, 0xFF_FFFE);
    }

    #[test]
    fn test_builder() {
        let config = CodecConfig::new().json_enabled(false).max_payload_len(1024);
        assert!(!config.json_enabled);
        assert_eq!(config.max_payload_len, 1024);
    }
}
