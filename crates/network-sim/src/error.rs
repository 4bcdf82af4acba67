use shared_types::CodecError;
use thiserror::Error;

/// Errors from direct manipulation of the simulated network (bootstrap and
/// preload helpers). Gateway calls report through their own port types.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("channel {0} already exists")]
    ChannelExists(String),

    #[error("chaincode {chaincode} failed: {message}")]
    Chaincode { chaincode: String, message: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type SimResult<T> = Result<T, SimError>;
