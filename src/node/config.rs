use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a coin exchanger node
#[derive(Clone, Debug)]
pub struct ExchangerConfig {
    /// Inbound packets larger than this are dropped undecoded
    pub max_message_bytes: usize,
    /// How long shutdown waits for the receive loop before aborting it
    pub shutdown_timeout_ms: u64,
    /// Memo stamped on coins built by `send_coin`
    pub default_memo: String,
}

impl Default for ExchangerConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: 64 * 1024,
            shutdown_timeout_ms: 1000,
            default_memo: String::new(),
        }
    }
}

impl ExchangerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_message_bytes(mut self, bytes: usize) -> Self {
        self.max_message_bytes = bytes;
        self
    }

    pub fn with_shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.shutdown_timeout_ms = ms;
        self
    }

    pub fn with_default_memo(mut self, memo: &str) -> Self {
        self.default_memo = memo.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_bytes == 0 {
            return Err(ConfigError::Invalid("max_message_bytes cannot be 0".to_string()));
        }
        if self.shutdown_timeout_ms == 0 {
            return Err(ConfigError::Invalid("shutdown_timeout_ms cannot be 0".to_string()));
        }
        Ok(())
    }
}
