//! Conversion error types.

/// Errors that can occur while converting a record for display.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A stored value's field id does not match the header it was paired with.
    #[error("record value convert error: header id {header_id} does not match value field id {field_id}")]
    HeaderIdMismatch {
        /// The value's field id.
        field_id: String,
        /// The header id it was paired with.
        header_id: String,
    },

    /// A value could not be serialized into the output payload.
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A timezone string was not of the form `+HHMM` / `-HHMM`.
    #[error("invalid timezone offset: {input:?} (expected e.g. \"+0800\")")]
    InvalidTimezone {
        /// The rejected input.
        input: String,
    },
}
