use std::io;

use thiserror::Error;

/// Failures while reading or writing DNS wire format.
///
/// All of these are recoverable: the transport drops the offending datagram
/// and keeps serving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("label of {0} octets exceeds the 63 octet limit")]
    LabelTooLong(usize),

    #[error("message truncated: needed {needed} byte(s) at offset {offset}")]
    TruncatedMessage { offset: usize, needed: usize },

    #[error("compression pointer loop at offset {0}")]
    CompressionLoop(usize),

    #[error("message exceeds {limit} byte buffer")]
    BufferOverflow { limit: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    #[error("message {0:#06x} has the response flag set, not a query")]
    NotAQuery(u16),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not bind socket to {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("could not send datagram to {addr}: {source}")]
    Send { addr: String, source: io::Error },

    #[error("could not receive datagram: {0}")]
    Receive(#[source] io::Error),

    #[error(transparent)]
    Wire(#[from] WireError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead { path: String, source: io::Error },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// Why a single datagram was dropped without a reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatagramError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Responder(#[from] ResponderError),
}
