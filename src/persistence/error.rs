//! Persistence error types.

/// Errors raised while reading, writing or validating stored records.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Underlying storage failed.
    #[error("storage I/O failed for '{record}': {source}")]
    Io {
        record: String,
        #[source]
        source: std::io::Error,
    },

    /// Record could not be encoded or decoded.
    #[error("malformed '{record}' record: {source}")]
    Json {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Stored checksum does not match the record contents.
    #[error("checksum mismatch: data may be corrupted")]
    ChecksumMismatch,

    /// A numeric field is outside its allowed range.
    #[error("invalid {field}: {value}")]
    OutOfBounds { field: String, value: u64 },

    /// Lifetime coin count below the current balance.
    #[error("lifetime coins ({lifetime}) cannot be less than current coins ({coins})")]
    LifetimeBelowBalance { coins: u64, lifetime: u64 },

    /// Upgrade key not in the shop catalogue.
    #[error("unknown upgrade key: {0}")]
    UnknownUpgrade(String),
}
