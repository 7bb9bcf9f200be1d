use {std::io, thiserror::Error};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("RPC error: {0}")]
    RpcError(String),
    #[error("parse error: expected {0}")]
    ParseError(String),
    #[error("custom error: {0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
