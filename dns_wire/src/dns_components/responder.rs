use std::net::Ipv4Addr;

use crate::dns_structs::dns_message::{
    DNSMessage, DNSResourceRecord, HeaderFlags, OpCode, ResponseCode,
};
use crate::dns_structs::server_config::{DEFAULT_ANSWER_ADDRESS, DEFAULT_ANSWER_TTL};
use crate::error::ResponderError;

/// What every synthesized address answer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponderConfig {
    pub answer_address: Ipv4Addr,
    pub ttl: u32,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        ResponderConfig {
            answer_address: DEFAULT_ANSWER_ADDRESS,
            ttl: DEFAULT_ANSWER_TTL,
        }
    }
}

/// Builds the reply for a parsed query.
///
/// Questions are echoed in order. If every question is an IN/A question in a
/// standard query, each one gets an answer pointing at the configured address;
/// otherwise the reply carries RCODE 4 (not implemented) and no answers.
pub fn respond(query: &DNSMessage, config: &ResponderConfig) -> Result<DNSMessage, ResponderError> {
    if !query.is_query() {
        return Err(ResponderError::NotAQuery(query.header.message_id));
    }

    let request_flags = &query.header.flags;
    let supported = request_flags.opcode == OpCode::Query
        && query.questions.iter().all(|question| question.is_supported());

    let flags = HeaderFlags {
        response: true,
        opcode: request_flags.opcode,
        recursion_desired: request_flags.recursion_desired,
        response_code: if supported {
            ResponseCode::NoError
        } else {
            ResponseCode::NotImp
        },
        ..Default::default()
    };

    let mut reply = DNSMessage::new(query.header.message_id, flags);
    for question in &query.questions {
        reply.add_question(question.clone());
    }

    if supported {
        for question in &query.questions {
            reply.add_answer(DNSResourceRecord::address(
                question.name.clone(),
                config.ttl,
                config.answer_address,
            ));
        }
    }

    Ok(reply)
}

#[cfg(test)]
use crate::dns_structs::dns_domain_name::Domain;
#[cfg(test)]
use crate::dns_structs::dns_message::{DNSQuestion, RData, RecordClass, RecordType};

#[cfg(test)]
fn query_for(id: u16, questions: &[(&str, RecordType)]) -> DNSMessage {
    let flags = HeaderFlags {
        recursion_desired: true,
        ..Default::default()
    };
    let mut query = DNSMessage::new(id, flags);
    for (name, query_type) in questions {
        query.add_question(DNSQuestion::new(
            Domain::new(name),
            *query_type,
            RecordClass::IN,
        ));
    }
    query
}

#[test]
fn test_address_answer() {
    let query = query_for(0x1234, &[("example.com", RecordType::A)]);
    let reply = respond(&query, &ResponderConfig::default()).unwrap();

    assert_eq!(reply.header.message_id, 0x1234);
    assert!(reply.header.flags.response);
    assert!(reply.header.flags.recursion_desired);
    assert!(!reply.header.flags.authoritative);
    assert_eq!(reply.header.flags.response_code, ResponseCode::NoError);
    assert_eq!(reply.questions, query.questions);
    assert_eq!(reply.header.answer_count, 1);

    let answer = &reply.answers[0];
    assert_eq!(answer.name.to_string(), "example.com");
    assert_eq!(answer.record_type, RecordType::A);
    assert_eq!(answer.record_class, RecordClass::IN);
    assert_eq!(answer.ttl, 60);
    assert_eq!(answer.data, RData::A(Ipv4Addr::new(8, 8, 8, 8)));
}

#[test]
fn test_one_answer_per_question() {
    let query = query_for(1, &[("a.example", RecordType::A), ("b.example", RecordType::A)]);
    let config = ResponderConfig {
        answer_address: Ipv4Addr::new(127, 0, 0, 1),
        ttl: 5,
    };
    let reply = respond(&query, &config).unwrap();
    let names: Vec<String> = reply.answers.iter().map(|a| a.name.to_string()).collect();
    assert_eq!(names, vec!["a.example", "b.example"]);
    assert!(reply.answers.iter().all(|a| a.ttl == 5));
    assert_eq!(reply.header.authority_count, 0);
    assert_eq!(reply.header.additional_count, 0);
}

#[test]
fn test_unsupported_type_not_implemented() {
    let query = query_for(9, &[("example.com", RecordType::MX)]);
    let reply = respond(&query, &ResponderConfig::default()).unwrap();
    assert_eq!(reply.header.flags.response_code, ResponseCode::NotImp);
    assert!(reply.answers.is_empty());
    assert_eq!(reply.questions.len(), 1);
}

#[test]
fn test_mixed_questions_not_implemented() {
    let query = query_for(9, &[("example.com", RecordType::A), ("example.com", RecordType::AAAA)]);
    let reply = respond(&query, &ResponderConfig::default()).unwrap();
    assert_eq!(reply.header.flags.response_code, ResponseCode::NotImp);
    assert!(reply.answers.is_empty());
    assert_eq!(reply.questions.len(), 2);
}

#[test]
fn test_unsupported_class_not_implemented() {
    let mut query = query_for(3, &[("example.com", RecordType::A)]);
    query.questions[0].query_class = RecordClass::CH;
    let reply = respond(&query, &ResponderConfig::default()).unwrap();
    assert_eq!(reply.header.flags.response_code, ResponseCode::NotImp);
}

#[test]
fn test_non_standard_opcode_not_implemented() {
    let mut query = query_for(3, &[("example.com", RecordType::A)]);
    query.header.flags.opcode = OpCode::Status;
    let reply = respond(&query, &ResponderConfig::default()).unwrap();
    assert_eq!(reply.header.flags.opcode, OpCode::Status);
    assert_eq!(reply.header.flags.response_code, ResponseCode::NotImp);
}

#[test]
fn test_reject_response() {
    let mut query = query_for(0x42, &[("example.com", RecordType::A)]);
    query.header.flags.response = true;
    assert_eq!(
        respond(&query, &ResponderConfig::default()),
        Err(ResponderError::NotAQuery(0x42))
    );
}
