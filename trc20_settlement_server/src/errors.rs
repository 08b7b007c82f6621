use thiserror::Error;
use trc20_settlement_engine::{OrderStoreError, SettlementError};
use tronscan_tools::LedgerApiError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize the gateway. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the gateway. {0}")]
    BackendError(#[from] OrderStoreError),
    #[error("Transfer-history API error. {0}")]
    LedgerError(#[from] LedgerApiError),
    #[error("Settlement error. {0}")]
    SettlementError(#[from] SettlementError),
    #[error("An I/O error happened in the gateway. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid gateway configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}
