//! Dictionary error types.

use thiserror::Error;

/// Errors that can occur while looking up a term.
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// The query was empty or whitespace.
    #[error("Query parameter \"q\" is required")]
    MissingQuery,

    /// The signed API was needed but no credentials are configured.
    #[error("Youdao API credentials not configured")]
    NotConfigured,

    /// The provider answered with a non-zero error code.
    #[error("{message}")]
    Api { code: String, message: String },

    /// The provider answered with an HTTP error or an unreadable body.
    #[error("dictionary HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// The request timed out.
    #[error("dictionary request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// Neither a translation nor a definition came back.
    #[error("No definition found for this word")]
    NoResult,
}

impl DictionaryError {
    /// Whether the caller's input, not the provider, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DictionaryError::MissingQuery | DictionaryError::NoResult)
    }
}

/// Human-readable message for a provider error code.
pub fn error_code_message(code: &str) -> String {
    let msg = match code {
        "101" => "Missing required parameters",
        "102" => "Unsupported language type",
        "103" => "Translation text too long",
        "104" => "Unsupported API type",
        "105" => "Unsupported signature type",
        "106" => "Unsupported response type",
        "107" => "Unsupported transport encryption",
        "108" => "Invalid app key",
        "109" => "Invalid batchLog format",
        "110" => "No valid app for related service",
        "111" => "Invalid developer account",
        "112" => "Invalid request service",
        "113" => "Query content cannot be empty",
        "114" => "Unsupported image format",
        "116" => "Invalid strict field value",
        "201" => "Decryption failed",
        "202" => "Signature verification failed",
        "203" => "Access IP not in whitelist",
        "205" => "Requested interface inconsistent with app platform",
        "206" => "Signature verification failed due to invalid timestamp",
        "207" => "Replay request",
        "301" => "Dictionary query failed",
        "302" => "Translation query failed",
        "303" => "Other server exceptions",
        "401" => "Account has outstanding balance",
        "411" => "Access frequency limited",
        other => return format!("API Error: {other}"),
    };
    msg.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_codes() {
        assert_eq!(error_code_message("108"), "Invalid app key");
        assert_eq!(error_code_message("411"), "Access frequency limited");
        assert_eq!(error_code_message("999"), "API Error: 999");
    }

    #[test]
    fn classification() {
        assert!(DictionaryError::MissingQuery.is_client_error());
        assert!(DictionaryError::NoResult.is_client_error());
        assert!(!DictionaryError::NotConfigured.is_client_error());
        assert!(!DictionaryError::Timeout(15).is_client_error());
    }
}
