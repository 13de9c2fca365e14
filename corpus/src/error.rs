use thiserror::Error;

/// A raw record that cannot be turned into a message. Fatal for the run:
/// upstream logs are expected to be well formed.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record id {0} is not an integer")]
    InvalidId(String),
    #[error("invalid timestamp '{raw}': {source}")]
    InvalidTimestamp {
        raw: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("reply marker @{0} does not fit a message id")]
    InvalidParentId(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown script '{0}' (expected cyrillic, latin or greek)")]
    UnknownScript(String),
    #[error("unknown window mode '{0}' (expected replies or sequential)")]
    UnknownWindowMode(String),
    #[error("context_len must be at least 1")]
    ZeroContextLen,
    #[error("context_len {0} exceeds the maximum of {max}", max = crate::config::MAX_CONTEXT_LEN)]
    ContextLenTooLarge(usize),
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
}
