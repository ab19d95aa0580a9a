use std::fmt;
use std::net::Ipv4Addr;

use crate::dns_structs::dns_domain_name::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    NS,
    CNAME,
    MX,
    AAAA,
    Unknown(u16),
}

impl RecordType {
    pub fn from_u16(code: u16) -> RecordType {
        match code {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            15 => RecordType::MX,
            28 => RecordType::AAAA,
            other => RecordType::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::MX => 15,
            RecordType::AAAA => 28,
            RecordType::Unknown(code) => code,
        }
    }

    /// Whether the responder can synthesize answers for this type.
    pub fn is_supported(self) -> bool {
        matches!(self, RecordType::A)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => f.write_str("A"),
            RecordType::NS => f.write_str("NS"),
            RecordType::CNAME => f.write_str("CNAME"),
            RecordType::MX => f.write_str("MX"),
            RecordType::AAAA => f.write_str("AAAA"),
            RecordType::Unknown(code) => write!(f, "TYPE{code}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
    IN,
    CH,
    HS,
    Unknown(u16),
}

impl RecordClass {
    pub fn from_u16(code: u16) -> RecordClass {
        match code {
            1 => RecordClass::IN,
            3 => RecordClass::CH,
            4 => RecordClass::HS,
            other => RecordClass::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            RecordClass::IN => 1,
            RecordClass::CH => 3,
            RecordClass::HS => 4,
            RecordClass::Unknown(code) => code,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::IN => f.write_str("IN"),
            RecordClass::CH => f.write_str("CH"),
            RecordClass::HS => f.write_str("HS"),
            RecordClass::Unknown(code) => write!(f, "CLASS{code}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpCode {
    #[default]
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Unknown(u8),
}

impl OpCode {
    pub fn from_u8(code: u8) -> OpCode {
        match code {
            0 => OpCode::Query,
            1 => OpCode::IQuery,
            2 => OpCode::Status,
            4 => OpCode::Notify,
            5 => OpCode::Update,
            other => OpCode::Unknown(other & 0x0f),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            OpCode::Query => 0,
            OpCode::IQuery => 1,
            OpCode::Status => 2,
            OpCode::Notify => 4,
            OpCode::Update => 5,
            OpCode::Unknown(code) => code & 0x0f,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseCode {
    #[default]
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    Unknown(u8),
}

impl ResponseCode {
    pub fn from_u8(code: u8) -> ResponseCode {
        match code {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NXDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            other => ResponseCode::Unknown(other & 0x0f),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NXDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Unknown(code) => code & 0x0f,
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCode::NoError => f.write_str("NOERROR"),
            ResponseCode::FormErr => f.write_str("FORMERR"),
            ResponseCode::ServFail => f.write_str("SERVFAIL"),
            ResponseCode::NXDomain => f.write_str("NXDOMAIN"),
            ResponseCode::NotImp => f.write_str("NOTIMP"),
            ResponseCode::Refused => f.write_str("REFUSED"),
            ResponseCode::Unknown(code) => write!(f, "RCODE{code}"),
        }
    }
}

/// Second header word, unpacked.
///
/// Layout from the most significant bit:
/// `QR | OPCODE(4) | AA | TC | RD | RA | Z(3) | RCODE(4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderFlags {
    pub response: bool,
    pub opcode: OpCode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    /// Reserved, kept as received.
    pub z: u8,
    pub response_code: ResponseCode,
}

impl HeaderFlags {
    pub fn from_u16(bits: u16) -> HeaderFlags {
        HeaderFlags {
            response: bits & 0x8000 != 0,
            opcode: OpCode::from_u8(((bits >> 11) & 0x0f) as u8),
            authoritative: bits & 0x0400 != 0,
            truncated: bits & 0x0200 != 0,
            recursion_desired: bits & 0x0100 != 0,
            recursion_available: bits & 0x0080 != 0,
            z: ((bits >> 4) & 0x07) as u8,
            response_code: ResponseCode::from_u8((bits & 0x0f) as u8),
        }
    }

    pub fn to_u16(&self) -> u16 {
        let mut bits = 0u16;
        if self.response {
            bits |= 0x8000;
        }
        bits |= u16::from(self.opcode.to_u8()) << 11;
        if self.authoritative {
            bits |= 0x0400;
        }
        if self.truncated {
            bits |= 0x0200;
        }
        if self.recursion_desired {
            bits |= 0x0100;
        }
        if self.recursion_available {
            bits |= 0x0080;
        }
        bits |= u16::from(self.z & 0x07) << 4;
        bits | u16::from(self.response_code.to_u8())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DNSMessageHeader {
    pub message_id: u16,
    pub flags: HeaderFlags,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DNSQuestion {
    pub name: Domain,
    pub query_type: RecordType,
    pub query_class: RecordClass,
}

impl DNSQuestion {
    pub fn new(name: Domain, query_type: RecordType, query_class: RecordClass) -> DNSQuestion {
        DNSQuestion {
            name,
            query_type,
            query_class,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.query_type.is_supported() && self.query_class == RecordClass::IN
    }
}

/// Resource data. Anything not understood is carried as raw octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Raw(Vec<u8>),
}

impl RData {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            RData::A(addr) => addr.octets().to_vec(),
            RData::Raw(bytes) => bytes.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RData::A(_) => 4,
            RData::Raw(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(addr) => write!(f, "{addr}"),
            RData::Raw(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DNSResourceRecord {
    pub name: Domain,
    pub record_type: RecordType,
    pub record_class: RecordClass,
    pub ttl: u32,
    pub data: RData,
}

impl DNSResourceRecord {
    pub fn address(name: Domain, ttl: u32, addr: Ipv4Addr) -> DNSResourceRecord {
        DNSResourceRecord {
            name,
            record_type: RecordType::A,
            record_class: RecordClass::IN,
            ttl,
            data: RData::A(addr),
        }
    }

    pub fn rdlength(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DNSMessage {
    pub header: DNSMessageHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResourceRecord>,
}

impl DNSMessage {
    pub fn new(message_id: u16, flags: HeaderFlags) -> DNSMessage {
        DNSMessage {
            header: DNSMessageHeader {
                message_id,
                flags,
                ..Default::default()
            },
            questions: Vec::new(),
            answers: Vec::new(),
        }
    }

    pub fn add_question(&mut self, question: DNSQuestion) {
        self.questions.push(question);
        self.header.question_count = self.questions.len() as u16;
    }

    pub fn add_answer(&mut self, answer: DNSResourceRecord) {
        self.answers.push(answer);
        self.header.answer_count = self.answers.len() as u16;
    }

    pub fn is_query(&self) -> bool {
        !self.header.flags.response
    }

    /// One-line summary used in the log lines.
    pub fn get_string(&self) -> String {
        let questions: Vec<String> = self
            .questions
            .iter()
            .map(|q| format!("{} {} {}", q.name, q.query_type, q.query_class))
            .collect();
        format!(
            "{:#06x},{},{},{},{};{}",
            self.header.message_id,
            self.header.flags.response_code,
            self.questions.len(),
            self.answers.len(),
            self.header.authority_count,
            questions.join(",")
        )
    }
}

#[test]
fn test_flags_bits() {
    let flags = HeaderFlags::from_u16(0x0100);
    assert!(!flags.response);
    assert!(flags.recursion_desired);
    assert_eq!(flags.opcode, OpCode::Query);

    let reply = HeaderFlags {
        response: true,
        recursion_desired: true,
        response_code: ResponseCode::NotImp,
        ..Default::default()
    };
    assert_eq!(reply.to_u16(), 0x8104);
}

#[test]
fn test_flags_every_field() {
    // QR, OPCODE=2, AA, TC, RD, RA, Z=5, RCODE=3
    let bits = 0x8000 | (2 << 11) | 0x0400 | 0x0200 | 0x0100 | 0x0080 | (5 << 4) | 3;
    let flags = HeaderFlags::from_u16(bits);
    assert_eq!(flags.opcode, OpCode::Status);
    assert!(flags.authoritative && flags.truncated && flags.recursion_available);
    assert_eq!(flags.z, 5);
    assert_eq!(flags.response_code, ResponseCode::NXDomain);
    assert_eq!(flags.to_u16(), bits);
}

#[test]
fn test_record_type_codes() {
    assert_eq!(RecordType::from_u16(1), RecordType::A);
    assert_eq!(RecordType::from_u16(15), RecordType::MX);
    assert_eq!(RecordType::from_u16(99), RecordType::Unknown(99));
    assert_eq!(RecordType::Unknown(99).to_u16(), 99);
    assert!(!RecordType::MX.is_supported());
}

#[test]
fn test_add_keeps_counts() {
    let mut message = DNSMessage::new(7, HeaderFlags::default());
    message.add_question(DNSQuestion::new(
        Domain::new("example.com"),
        RecordType::A,
        RecordClass::IN,
    ));
    message.add_answer(DNSResourceRecord::address(
        Domain::new("example.com"),
        60,
        Ipv4Addr::new(8, 8, 8, 8),
    ));
    assert_eq!(message.header.question_count, 1);
    assert_eq!(message.header.answer_count, 1);
    assert_eq!(message.answers[0].rdlength(), 4);
}
