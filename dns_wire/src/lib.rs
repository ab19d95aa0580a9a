//! Wire-format codec, responder and UDP plumbing for a minimal DNS stub server.
//!
//! Data flows one way per datagram: raw bytes are parsed into a [`DNSMessage`],
//! the responder turns the query into a reply, and the reply is serialized back
//! to bytes.
//!
//! [`DNSMessage`]: dns_structs::dns_message::DNSMessage

pub mod dns_components;
pub mod dns_make;
pub mod dns_parse;
pub mod dns_structs;
pub mod error;

pub use error::{ConfigError, DatagramError, ResponderError, TransportError, WireError};

/// Classic DNS-over-UDP message size limit.
pub const MAX_UDP_MESSAGE_SIZE: usize = 512;

/// Port the reference deployment listens on.
pub const DEFAULT_PORT: u16 = 2053;
