extern crate stubdns;

use dns_wire::{
    dns_components::responder::ResponderConfig,
    dns_make::{
        dns_recv::{self, NoopObserver},
        dns_send,
    },
    dns_structs::{
        dns_domain_name::Domain,
        dns_message::{DNSQuestion, RData, RecordClass, RecordType, ResponseCode},
    },
};
use std::{
    net::{Ipv4Addr, SocketAddr, UdpSocket},
    thread::{self, JoinHandle},
    time::Duration,
};
use stubdns::client;

/// Binds an ephemeral loopback port and serves exactly one datagram on it.
fn spawn_server(config: ResponderConfig) -> (SocketAddr, JoinHandle<()>) {
    let socket = dns_recv::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    let handle = thread::spawn(move || {
        dns_recv::serve(&socket, &config, &NoopObserver, true).unwrap();
    });
    (addr, handle)
}

fn client_socket() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    socket
}

#[test]
fn test_client_server() {
    let (addr, server) = spawn_server(ResponderConfig::default());

    let mut query = client::query_builder(Domain::new("example.com"), true);
    query.header.message_id = 0x1234;

    let (raw, reply) = dns_send::query(&query, &client_socket(), addr).unwrap();
    server.join().unwrap();

    assert_eq!(&raw[..2], &[0x12, 0x34]);
    assert_eq!(reply.header.message_id, 0x1234);
    assert!(reply.header.flags.response);
    assert!(reply.header.flags.recursion_desired);
    assert_eq!(reply.header.flags.response_code, ResponseCode::NoError);
    assert_eq!(reply.questions, query.questions);
    assert_eq!(reply.answers.len(), 1);

    let answer = &reply.answers[0];
    assert_eq!(answer.name.to_string(), "example.com");
    assert_eq!(answer.record_type, RecordType::A);
    assert_eq!(answer.record_class, RecordClass::IN);
    assert_eq!(answer.ttl, 60);
    assert_eq!(answer.rdlength(), 4);
    assert_eq!(answer.data, RData::A(Ipv4Addr::new(8, 8, 8, 8)));
}

#[test]
fn test_client_dumps_raw_reply() {
    let config = ResponderConfig {
        answer_address: Ipv4Addr::new(10, 3, 3, 1),
        ttl: 300,
    };
    let (addr, server) = spawn_server(config);

    let dump = std::env::temp_dir().join(format!("stubdns-reply-{}.bin", addr.port()));
    let query = client::query_builder(Domain::new("codecrafters.io"), false);
    let reply = client::resolve(&client_socket(), addr, &query, &dump).unwrap();
    server.join().unwrap();

    assert_eq!(reply.answers[0].data, RData::A(Ipv4Addr::new(10, 3, 3, 1)));
    let raw = std::fs::read(&dump).unwrap();
    assert_eq!(&raw[raw.len() - 4..], &[10, 3, 3, 1]);
    std::fs::remove_file(dump).unwrap();
}

#[test]
fn test_unsupported_type() {
    let (addr, server) = spawn_server(ResponderConfig::default());

    let mut query = client::query_builder(Domain::new("example.com"), true);
    query.questions[0] = DNSQuestion::new(Domain::new("example.com"), RecordType::MX, RecordClass::IN);

    let (_, reply) = dns_send::query(&query, &client_socket(), addr).unwrap();
    server.join().unwrap();

    assert_eq!(reply.header.flags.response_code, ResponseCode::NotImp);
    assert!(reply.answers.is_empty());
    assert_eq!(reply.questions.len(), 1);
}

#[test]
fn test_malformed_datagram_dropped() {
    let (addr, server) = spawn_server(ResponderConfig::default());

    let socket = client_socket();
    socket
        .set_read_timeout(Some(Duration::from_millis(300)))
        .unwrap();
    // header claims one question, none follows
    socket
        .send_to(&[0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0], addr)
        .unwrap();
    server.join().unwrap();

    let mut buf = [0; 512];
    assert!(socket.recv_from(&mut buf).is_err());
}
