use std::{
    fs,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
    path::{Path, PathBuf},
};

use chrono::Utc;
use clap::*;
use colored::Colorize;
use dns_wire::{
    dns_make::{dns_recv, dns_send},
    dns_structs::{
        dns_domain_name::Domain,
        dns_message::{
            DNSMessage, DNSQuestion, HeaderFlags, RecordClass, RecordType, ResponseCode,
        },
    },
    TransportError, DEFAULT_PORT,
};
use log::{debug, error, info};
use rand::random;
use thiserror::Error;

use crate::logger::create_logger;

static DEFAULT_DOMAIN: &str = "codecrafters.io";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not write reply to {path}: {source}")]
    Dump {
        path: String,
        source: std::io::Error,
    },
}

pub fn main() {
    let arguments = Command::new("client")
        .version(crate_version!())
        .about("Sends one A query to a DNS stub server and stores the raw reply")
        .args([
            Arg::new("server_ip")
                .required(true)
                .value_parser(value_parser!(Ipv4Addr))
                .help("IPv4 address of the server"),
            Arg::new("port")
                .short('p')
                .long("port")
                .value_parser(value_parser!(u16))
                .help("Server port"),
            Arg::new("domain")
                .short('d')
                .long("domain")
                .help("Name of the domain to query"),
            Arg::new("recursive")
                .action(ArgAction::SetTrue)
                .short('r')
                .long("recursive")
                .help("Sets the recursion desired flag"),
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .help("File the raw reply is written to"),
            Arg::new("debug")
                .action(ArgAction::SetTrue)
                .short('b')
                .long("debug")
                .help("Debug Mode"),
        ])
        .get_matches();

    if let Err(err) = create_logger(arguments.get_flag("debug")) {
        eprintln!("{err}");
        std::process::exit(1);
    }

    let server_ip = match arguments.get_one::<Ipv4Addr>("server_ip") {
        Some(ip) => *ip,
        None => {
            error!("SP 127.0.0.1 invalid-user-input server_ip");
            std::process::exit(1);
        }
    };
    let port = arguments
        .get_one::<u16>("port")
        .copied()
        .unwrap_or(DEFAULT_PORT);
    let domain = arguments
        .get_one::<String>("domain")
        .map(|d| d.as_str())
        .unwrap_or(DEFAULT_DOMAIN);
    let output = arguments
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(default_dump_path);

    let query = query_builder(Domain::new(domain), arguments.get_flag("recursive"));
    info!("EV @ dns-msg-created {}", query.get_string());

    let socket = match dns_recv::bind("0.0.0.0:0") {
        Ok(socket) => socket,
        Err(err) => {
            error!("SP 127.0.0.1 {}", err);
            std::process::exit(1);
        }
    };

    match resolve(&socket, SocketAddr::from((server_ip, port)), &query, &output) {
        Ok(reply) => {
            info!("EV @ dns-msg-received {}", output.display());
            print_dns_message(&reply);
        }
        Err(err) => {
            error!("SP 127.0.0.1 dns-msg-receive-error {}", err);
            std::process::exit(1);
        }
    }
}

fn default_dump_path() -> PathBuf {
    PathBuf::from(format!(
        "server_response_{}.bin",
        Utc::now().format("%Y%m%d%H%M%S")
    ))
}

/// Single A/IN question with a random transaction id.
pub fn query_builder(domain_name: Domain, recursive: bool) -> DNSMessage {
    let flags = HeaderFlags {
        recursion_desired: recursive,
        ..Default::default()
    };
    let mut dns_message = DNSMessage::new(random(), flags);
    dns_message.add_question(DNSQuestion::new(domain_name, RecordType::A, RecordClass::IN));
    dns_message
}

/// Sends `query` from `socket`, waits for the reply and writes its raw bytes
/// to `dump_path`. Any read timeout set on `socket` applies.
pub fn resolve(
    socket: &UdpSocket,
    server: SocketAddr,
    query: &DNSMessage,
    dump_path: &Path,
) -> Result<DNSMessage, ClientError> {
    debug!("EV @ sending-to {}", server);

    let (raw, reply) = dns_send::query(query, socket, server)?;
    fs::write(dump_path, &raw).map_err(|source| ClientError::Dump {
        path: dump_path.display().to_string(),
        source,
    })?;
    Ok(reply)
}

fn print_dns_message(message: &DNSMessage) {
    let header = &message.header;
    let rcode = match header.flags.response_code {
        ResponseCode::NoError => header.flags.response_code.to_string().green(),
        other => other.to_string().red(),
    };
    println!("{}", "DNS Message:".bold());
    println!(
        "  id {:#06x}, {}, qd {}, an {}, ns {}, ar {}",
        header.message_id,
        rcode,
        message.questions.len(),
        message.answers.len(),
        header.authority_count,
        header.additional_count
    );

    println!("{}", "  Questions:".bold());
    for question in &message.questions {
        println!(
            "    {} {} {}",
            question.name, question.query_class, question.query_type
        );
    }

    println!("{}", "  Answers:".bold());
    for answer in &message.answers {
        println!(
            "    {} {} {} {} {}",
            answer.name,
            answer.ttl,
            answer.record_class,
            answer.record_type,
            answer.data.to_string().cyan()
        );
    }
}

#[test]
fn test_query_builder() {
    let query = query_builder(Domain::new("codecrafters.io"), true);
    assert!(query.is_query());
    assert!(query.header.flags.recursion_desired);
    assert_eq!(query.header.question_count, 1);
    assert_eq!(query.questions[0].query_type, RecordType::A);
    assert!(query.answers.is_empty());
}
