use std::net::Ipv4Addr;

use crate::dns_parse::wire_buffer::{WireReader, WireWriter};
use crate::dns_structs::dns_domain_name::Domain;
use crate::dns_structs::dns_message::{
    DNSMessage, DNSMessageHeader, DNSQuestion, DNSResourceRecord, HeaderFlags, RData, RecordClass,
    RecordType,
};
use crate::error::WireError;
use crate::MAX_UDP_MESSAGE_SIZE;

pub const HEADER_LEN: usize = 12;

/// Parses a datagram into a message.
///
/// Only the question and answer sections are decoded. The authority and
/// additional counts are kept in the header but their records are left
/// unread, as is any trailing data.
pub fn parse(bytes: &[u8]) -> Result<DNSMessage, WireError> {
    let mut reader = WireReader::new(bytes);
    let header = read_header(&mut reader)?;

    let mut questions = Vec::with_capacity(usize::from(header.question_count).min(16));
    for _ in 0..header.question_count {
        questions.push(read_question(&mut reader)?);
    }

    let mut answers = Vec::with_capacity(usize::from(header.answer_count).min(16));
    for _ in 0..header.answer_count {
        answers.push(read_record(&mut reader)?);
    }

    Ok(DNSMessage {
        header,
        questions,
        answers,
    })
}

/// Serializes a message into at most [`MAX_UDP_MESSAGE_SIZE`] bytes.
pub fn serialize(message: &DNSMessage) -> Result<Vec<u8>, WireError> {
    serialize_with_limit(message, MAX_UDP_MESSAGE_SIZE)
}

/// Question and answer counts are written from the list lengths, so they
/// always agree with what follows the header.
pub fn serialize_with_limit(message: &DNSMessage, limit: usize) -> Result<Vec<u8>, WireError> {
    let mut writer = WireWriter::with_limit(limit);

    let header = &message.header;
    writer.write_u16(header.message_id)?;
    writer.write_u16(header.flags.to_u16())?;
    writer.write_u16(section_count(message.questions.len(), limit)?)?;
    writer.write_u16(section_count(message.answers.len(), limit)?)?;
    writer.write_u16(header.authority_count)?;
    writer.write_u16(header.additional_count)?;

    for question in &message.questions {
        question.name.write_to(&mut writer)?;
        writer.write_u16(question.query_type.to_u16())?;
        writer.write_u16(question.query_class.to_u16())?;
    }

    for answer in &message.answers {
        let rdata = answer.data.to_bytes();
        let rdlength =
            u16::try_from(rdata.len()).map_err(|_| WireError::BufferOverflow { limit })?;
        answer.name.write_to(&mut writer)?;
        writer.write_u16(answer.record_type.to_u16())?;
        writer.write_u16(answer.record_class.to_u16())?;
        writer.write_u32(answer.ttl)?;
        writer.write_u16(rdlength)?;
        writer.write_bytes(&rdata)?;
    }

    Ok(writer.into_bytes())
}

fn section_count(len: usize, limit: usize) -> Result<u16, WireError> {
    u16::try_from(len).map_err(|_| WireError::BufferOverflow { limit })
}

fn read_header(reader: &mut WireReader) -> Result<DNSMessageHeader, WireError> {
    if reader.remaining() < HEADER_LEN {
        return Err(WireError::TruncatedMessage {
            offset: reader.position(),
            needed: HEADER_LEN,
        });
    }
    Ok(DNSMessageHeader {
        message_id: reader.read_u16()?,
        flags: HeaderFlags::from_u16(reader.read_u16()?),
        question_count: reader.read_u16()?,
        answer_count: reader.read_u16()?,
        authority_count: reader.read_u16()?,
        additional_count: reader.read_u16()?,
    })
}

fn read_name(reader: &mut WireReader) -> Result<Domain, WireError> {
    let (name, consumed) = Domain::decode(reader.message(), reader.position())?;
    reader.skip(consumed)?;
    Ok(name)
}

fn read_question(reader: &mut WireReader) -> Result<DNSQuestion, WireError> {
    let name = read_name(reader)?;
    let query_type = RecordType::from_u16(reader.read_u16()?);
    let query_class = RecordClass::from_u16(reader.read_u16()?);
    Ok(DNSQuestion::new(name, query_type, query_class))
}

fn read_record(reader: &mut WireReader) -> Result<DNSResourceRecord, WireError> {
    let name = read_name(reader)?;
    let record_type = RecordType::from_u16(reader.read_u16()?);
    let record_class = RecordClass::from_u16(reader.read_u16()?);
    let ttl = reader.read_u32()?;
    let rdlength = reader.read_u16()?;
    let rdata = reader.read_bytes(usize::from(rdlength))?;

    let data = match (record_type, record_class, rdata) {
        (RecordType::A, RecordClass::IN, &[a, b, c, d]) => RData::A(Ipv4Addr::new(a, b, c, d)),
        _ => RData::Raw(rdata.to_vec()),
    };

    Ok(DNSResourceRecord {
        name,
        record_type,
        record_class,
        ttl,
        data,
    })
}

#[cfg(test)]
fn example_query() -> Vec<u8> {
    let mut bytes = vec![
        0x12, 0x34, // id
        0x01, 0x00, // RD
        0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    bytes.extend_from_slice(b"\x07example\x03com\x00");
    bytes.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    bytes
}

#[test]
fn test_parse_query() {
    let message = parse(&example_query()).unwrap();
    assert_eq!(message.header.message_id, 0x1234);
    assert!(message.header.flags.recursion_desired);
    assert!(message.is_query());
    assert_eq!(message.questions.len(), 1);
    assert_eq!(message.questions[0].name.to_string(), "example.com");
    assert_eq!(message.questions[0].query_type, RecordType::A);
    assert_eq!(message.questions[0].query_class, RecordClass::IN);
    assert!(message.answers.is_empty());
}

#[test]
fn test_serialize_reproduces_query() {
    let bytes = example_query();
    assert_eq!(serialize(&parse(&bytes).unwrap()).unwrap(), bytes);
}

#[test]
fn test_parse_short_header() {
    assert_eq!(
        parse(&[0x12, 0x34, 0x01]),
        Err(WireError::TruncatedMessage {
            offset: 0,
            needed: HEADER_LEN
        })
    );
}

#[test]
fn test_parse_missing_question() {
    let mut bytes = example_query();
    bytes[5] = 2;
    assert!(matches!(
        parse(&bytes),
        Err(WireError::TruncatedMessage { .. })
    ));
}

#[test]
fn test_parse_question_missing_class() {
    let mut bytes = example_query();
    bytes.truncate(bytes.len() - 2);
    assert!(matches!(
        parse(&bytes),
        Err(WireError::TruncatedMessage { .. })
    ));
}

#[test]
fn test_parse_compressed_answer() {
    let mut bytes = example_query();
    bytes[2] = 0x81;
    bytes[7] = 1;
    // answer name points back at the question name at offset 12
    bytes.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x3c, 0x00, 0x04, 8, 8, 8, 8]);

    let message = parse(&bytes).unwrap();
    assert!(!message.is_query());
    assert_eq!(message.answers.len(), 1);
    let answer = &message.answers[0];
    assert_eq!(answer.name, message.questions[0].name);
    assert_eq!(answer.ttl, 60);
    assert_eq!(answer.data, RData::A(Ipv4Addr::new(8, 8, 8, 8)));

    // replies are written without compression
    let expanded = serialize(&message).unwrap();
    assert_eq!(expanded.len(), bytes.len() + 13 - 2);
    assert_eq!(parse(&expanded).unwrap(), message);
}

#[test]
fn test_parse_rdata_truncated() {
    let mut bytes = example_query();
    bytes[7] = 1;
    bytes.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x3c, 0x00, 0x04, 8, 8]);
    assert!(matches!(
        parse(&bytes),
        Err(WireError::TruncatedMessage { .. })
    ));
}

#[test]
fn test_parse_unknown_rdata_kept_raw() {
    let mut bytes = example_query();
    bytes[7] = 1;
    bytes.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x10, 0x00, 0x01]);
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x3c, 0x00, 0x03, 2, b'h', b'i']);
    let message = parse(&bytes).unwrap();
    assert_eq!(message.answers[0].record_type, RecordType::Unknown(16));
    assert_eq!(message.answers[0].data, RData::Raw(vec![2, b'h', b'i']));
}

#[test]
fn test_parse_looping_question_name() {
    let mut bytes = example_query();
    bytes.truncate(HEADER_LEN);
    bytes.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);
    assert_eq!(parse(&bytes), Err(WireError::CompressionLoop(12)));
}

#[test]
fn test_serialize_overflow() {
    let mut message = DNSMessage::default();
    let label = "a".repeat(63);
    let name = Domain::new(&[label.as_str(); 4].join("."));
    for _ in 0..3 {
        message.add_question(DNSQuestion::new(name.clone(), RecordType::A, RecordClass::IN));
    }
    // 12 + 3 * (257 + 4) > 512
    assert_eq!(
        serialize(&message),
        Err(WireError::BufferOverflow { limit: 512 })
    );
    assert!(serialize_with_limit(&message, 4096).is_ok());
}

#[test]
fn test_serialize_counts_follow_lists() {
    let mut message = DNSMessage::default();
    message.header.question_count = 5;
    message.questions.push(DNSQuestion::new(
        Domain::new("example.com"),
        RecordType::A,
        RecordClass::IN,
    ));
    let bytes = serialize(&message).unwrap();
    assert_eq!(&bytes[4..6], &[0x00, 0x01]);
}

#[test]
fn test_serialize_label_too_long() {
    let mut message = DNSMessage::default();
    message.add_question(DNSQuestion::new(
        Domain::new(&"b".repeat(64)),
        RecordType::A,
        RecordClass::IN,
    ));
    assert_eq!(serialize(&message), Err(WireError::LabelTooLong(64)));
}

#[test]
fn test_parse_second_question_pointer() {
    let mut bytes = example_query();
    bytes[5] = 2;
    // second question reuses the first name at offset 12
    bytes.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);

    let message = parse(&bytes).unwrap();
    assert_eq!(message.questions.len(), 2);
    assert_eq!(message.questions[1].name.to_string(), "example.com");
    assert_eq!(message.questions[1].name, message.questions[0].name);
    assert_eq!(message.questions[1].query_class, RecordClass::IN);
}
