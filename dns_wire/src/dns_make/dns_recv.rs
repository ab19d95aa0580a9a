use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use log::{debug, error, info, log_enabled, trace, warn, Level};

use crate::dns_components::responder::{self, ResponderConfig};
use crate::dns_parse::message_parse;
use crate::error::{DatagramError, TransportError};
use crate::MAX_UDP_MESSAGE_SIZE;

/// Hook for looking at raw datagrams as they pass through the server loop.
pub trait DatagramObserver {
    fn on_query(&self, _src: SocketAddr, _bytes: &[u8]) {}
    fn on_reply(&self, _dst: SocketAddr, _bytes: &[u8]) {}
}

pub struct NoopObserver;

impl DatagramObserver for NoopObserver {}

/// Hex dumps every datagram at trace level.
pub struct LogObserver;

impl DatagramObserver for LogObserver {
    fn on_query(&self, src: SocketAddr, bytes: &[u8]) {
        if log_enabled!(Level::Trace) {
            trace!("EV @ query-bytes {} {}", src, hex_dump(bytes));
        }
    }

    fn on_reply(&self, dst: SocketAddr, bytes: &[u8]) {
        if log_enabled!(Level::Trace) {
            trace!("EV @ reply-bytes {} {}", dst, hex_dump(bytes));
        }
    }
}

pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn bind<A: ToSocketAddrs + ToString>(addr: A) -> Result<UdpSocket, TransportError> {
    UdpSocket::bind(&addr).map_err(|source| TransportError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Parse, respond and serialize one datagram. No I/O.
pub fn handle_datagram(bytes: &[u8], config: &ResponderConfig) -> Result<Vec<u8>, DatagramError> {
    let query = message_parse::parse(bytes)?;
    let reply = responder::respond(&query, config)?;
    Ok(message_parse::serialize(&reply)?)
}

/// Serves queries on `socket`, one datagram at a time.
///
/// Malformed datagrams are dropped and a failed receive or send only skips the
/// current datagram. With `once` set the loop returns after the first
/// datagram it receives.
pub fn serve(
    socket: &UdpSocket,
    config: &ResponderConfig,
    observer: &dyn DatagramObserver,
    once: bool,
) -> Result<(), TransportError> {
    if let Ok(local) = socket.local_addr() {
        info!("EV @ listening {}", local);
    }

    let mut buf = [0; MAX_UDP_MESSAGE_SIZE];

    loop {
        let (num_of_bytes, src_addr) = match socket.recv_from(&mut buf) {
            Ok(size_and_addr) => size_and_addr,
            Err(err) => {
                error!("ER @ recv-fail {}", TransportError::Receive(err));
                continue;
            }
        };
        let datagram = &buf[..num_of_bytes];
        observer.on_query(src_addr, datagram);

        match handle_datagram(datagram, config) {
            Ok(reply) => {
                observer.on_reply(src_addr, &reply);
                match socket.send_to(&reply, src_addr) {
                    Ok(sent) => info!("RP {} {} bytes", src_addr, sent),
                    Err(source) => error!(
                        "ER @ {}",
                        TransportError::Send {
                            addr: src_addr.to_string(),
                            source
                        }
                    ),
                }
            }
            Err(DatagramError::Wire(err)) => {
                warn!("ER {} pdu-parse-fail {}", src_addr.ip(), err);
            }
            Err(DatagramError::Responder(err)) => {
                warn!("ER {} pdu-not-a-query {}", src_addr.ip(), err);
            }
        }

        if once {
            debug!("EV @ serve-once-done");
            return Ok(());
        }
    }
}

#[cfg(test)]
use crate::dns_structs::dns_message::ResponseCode;

#[test]
fn test_handle_datagram_reply() {
    let mut query = vec![0xab, 0xcd, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
    query.extend_from_slice(b"\x0ccodecrafters\x02io\x00\x00\x01\x00\x01");

    let reply = handle_datagram(&query, &ResponderConfig::default()).unwrap();
    let parsed = message_parse::parse(&reply).unwrap();
    assert_eq!(parsed.header.message_id, 0xabcd);
    assert_eq!(parsed.header.flags.response_code, ResponseCode::NoError);
    assert_eq!(&reply[reply.len() - 4..], &[8, 8, 8, 8]);
}

#[test]
fn test_handle_datagram_garbage() {
    assert!(matches!(
        handle_datagram(&[0xff; 5], &ResponderConfig::default()),
        Err(DatagramError::Wire(_))
    ));
}

#[test]
fn test_handle_datagram_reply_rejected() {
    let reply = vec![0x00, 0x01, 0x80, 0x00, 0, 0, 0, 0, 0, 0, 0, 0];
    assert!(matches!(
        handle_datagram(&reply, &ResponderConfig::default()),
        Err(DatagramError::Responder(_))
    ));
}

#[test]
fn test_hex_dump() {
    assert_eq!(hex_dump(&[0x00, 0xab, 0x10]), "00 ab 10");
}

#[test]
fn test_handle_datagram_compressed_second_question() {
    let mut query = vec![0x00, 0x07, 0x01, 0x00, 0, 2, 0, 0, 0, 0, 0, 0];
    query.extend_from_slice(b"\x07example\x03com\x00\x00\x01\x00\x01");
    query.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);

    let reply = handle_datagram(&query, &ResponderConfig::default()).unwrap();
    let parsed = message_parse::parse(&reply).unwrap();
    assert_eq!(parsed.answers.len(), 2);
    assert_eq!(parsed.answers[1].name.to_string(), "example.com");
}

#[test]
fn test_handle_datagram_binary_label_echoed() {
    let mut name = vec![30];
    name.extend_from_slice(&[0xff; 30]);
    name.extend_from_slice(b"\x03com\x00");

    let mut query = vec![0x00, 0x08, 0x00, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
    query.extend_from_slice(&name);
    query.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);

    let reply = handle_datagram(&query, &ResponderConfig::default()).unwrap();
    // question echoed byte for byte right after the header
    assert_eq!(&reply[12..12 + name.len()], name.as_slice());
    // answer name follows the question's type and class
    let answer_start = 12 + name.len() + 4;
    assert_eq!(&reply[answer_start..answer_start + name.len()], name.as_slice());
}
