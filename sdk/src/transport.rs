//! Defines the [`TransportError`] type for connections pushing wire bytes to
//! leaders.

use {crate::transaction::TransactionError, std::io, thiserror::Error};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport io error: {0}")]
    IoError(#[from] io::Error),
    #[error("transport transaction error: {0}")]
    TransactionError(#[from] TransactionError),
    #[error("transport custom error: {0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
