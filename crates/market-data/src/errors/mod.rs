//! Error types for the market data crate.

use thiserror::Error;

/// Errors that can occur while fetching or streaming market data.
///
/// Quote failures are reported per symbol and are expected to be isolated by
/// callers; one bad symbol must never poison a whole valuation pass.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider does not know the symbol, or returned an empty payload
    /// for it. Terminal for the symbol; retrying will not help.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The request did not complete within the allotted time.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider rejected the request due to rate limiting (HTTP 429 or
    /// quota exhaustion).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider answered with an error of its own.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider does not implement the requested operation.
    #[error("Operation not supported: {operation} ({provider})")]
    NotSupported {
        /// The operation that was requested
        operation: String,
        /// The provider that lacks it
        provider: String,
    },

    /// The streaming feed is not connected (or its worker has shut down).
    #[error("Stream not connected")]
    NotConnected,

    /// The symbol exists but has no quotes in the requested period.
    #[error("No data for date range")]
    NoDataForRange,

    /// The provider returned a payload that could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A transport-level error occurred while talking to a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Whether the failure is plausibly temporary.
    ///
    /// Transient failures are worth retrying on the next valuation pass and
    /// are logged quieter than permanent ones.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::RateLimited { .. }
                | Self::NotConnected
                | Self::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_is_permanent() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert!(!error.is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        let error = MarketDataError::Timeout {
            provider: "FINNHUB".to_string(),
        };
        assert!(error.is_transient());
    }

    #[test]
    fn test_rate_limited_is_transient() {
        let error = MarketDataError::RateLimited {
            provider: "FINNHUB".to_string(),
        };
        assert!(error.is_transient());
    }

    #[test]
    fn test_not_connected_is_transient() {
        assert!(MarketDataError::NotConnected.is_transient());
    }

    #[test]
    fn test_provider_error_is_permanent() {
        let error = MarketDataError::ProviderError {
            provider: "FINNHUB".to_string(),
            message: "Internal server error".to_string(),
        };
        assert!(!error.is_transient());
    }

    #[test]
    fn test_not_supported_is_permanent() {
        let error = MarketDataError::NotSupported {
            operation: "get_history".to_string(),
            provider: "STREAM".to_string(),
        };
        assert!(!error.is_transient());
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::RateLimited {
            provider: "FINNHUB".to_string(),
        };
        assert_eq!(format!("{}", error), "Rate limited: FINNHUB");

        let error = MarketDataError::NotSupported {
            operation: "get_history".to_string(),
            provider: "STREAM".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Operation not supported: get_history (STREAM)"
        );
    }
}
