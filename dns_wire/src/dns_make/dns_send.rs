use std::net::{SocketAddr, UdpSocket};

use crate::dns_parse::message_parse;
use crate::dns_structs::dns_message::DNSMessage;
use crate::error::TransportError;
use crate::MAX_UDP_MESSAGE_SIZE;

/// Serializes `dns_message` and sends it to `destination`.
/// Returns the number of bytes sent.
pub fn send(
    dns_message: &DNSMessage,
    socket: &UdpSocket,
    destination: SocketAddr,
) -> Result<usize, TransportError> {
    let bytes = message_parse::serialize(dns_message)?;
    socket
        .send_to(&bytes, destination)
        .map_err(|source| TransportError::Send {
            addr: destination.to_string(),
            source,
        })
}

/// Sends a query and blocks until one datagram comes back.
///
/// Returns the raw reply alongside the parsed message so callers can keep the
/// bytes. There is no retransmission; set a read timeout on `socket` if the
/// caller must not wait forever.
pub fn query(
    dns_message: &DNSMessage,
    socket: &UdpSocket,
    destination: SocketAddr,
) -> Result<(Vec<u8>, DNSMessage), TransportError> {
    send(dns_message, socket, destination)?;

    let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
    let (num_of_bytes, _) = socket
        .recv_from(&mut buf)
        .map_err(TransportError::Receive)?;
    let raw = buf[..num_of_bytes].to_vec();
    let reply = message_parse::parse(&raw)?;
    Ok((raw, reply))
}
