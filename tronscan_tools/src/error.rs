use thiserror::Error;

/// Errors from the transfer-history API. Any of these is fatal to the current wallet's poll round; the next
/// scheduled round retries naturally.
#[derive(Debug, Clone, Error)]
pub enum LedgerApiError {
    #[error("Could not initialize the Tronscan client. {0}")]
    Initialization(String),
    #[error("The transfer history request failed. {0}")]
    Transport(String),
    #[error("Tronscan returned HTTP {status}: {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not decode the Tronscan response. {0}")]
    JsonError(String),
}
