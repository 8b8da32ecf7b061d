use pg_common::MoneyConversionError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Could not initialize provider client: {0}")]
    Initialization(String),
    #[error("Transport failure talking to the gateway. {0}")]
    Transport(String),
    #[error("Malformed or unparseable gateway response. {0}")]
    Protocol(String),
    #[error("Invalid amount on the wire. {0}")]
    InvalidAmount(String),
}

impl From<MoneyConversionError> for ProviderError {
    fn from(e: MoneyConversionError) -> Self {
        ProviderError::InvalidAmount(e.to_string())
    }
}
