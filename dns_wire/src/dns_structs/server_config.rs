use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::dns_components::responder::ResponderConfig;
use crate::DEFAULT_PORT;

pub const DEFAULT_ANSWER_ADDRESS: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);
pub const DEFAULT_ANSWER_TTL: u32 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    port: u16,
    answer_address: Ipv4Addr,
    answer_ttl: u32,
    all_log: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: DEFAULT_PORT,
            answer_address: DEFAULT_ANSWER_ADDRESS,
            answer_ttl: DEFAULT_ANSWER_TTL,
            all_log: None,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        ServerConfig::default()
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn get_answer_address(&self) -> Ipv4Addr {
        self.answer_address
    }

    pub fn set_answer_address(&mut self, addr: Ipv4Addr) {
        self.answer_address = addr;
    }

    pub fn get_answer_ttl(&self) -> u32 {
        self.answer_ttl
    }

    pub fn set_answer_ttl(&mut self, ttl: u32) {
        self.answer_ttl = ttl;
    }

    pub fn get_all_log(&self) -> Option<&str> {
        self.all_log.as_deref()
    }

    pub fn set_all_log(&mut self, all_log: String) {
        self.all_log = Some(all_log);
    }

    pub fn responder_config(&self) -> ResponderConfig {
        ResponderConfig {
            answer_address: self.answer_address,
            ttl: self.answer_ttl,
        }
    }

    /// JSON rendering for the startup debug line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| format!("{{\"error\":\"{err}\"}}"))
    }
}

#[test]
fn test_to_json() {
    let json = ServerConfig::default().to_json();
    assert_eq!(
        json,
        r#"{"port":2053,"answer_address":"8.8.8.8","answer_ttl":60,"all_log":null}"#
    );
}

#[test]
fn test_responder_config() {
    let mut config = ServerConfig::new();
    config.set_answer_ttl(10);
    assert_eq!(config.responder_config().ttl, 10);
    assert_eq!(config.responder_config().answer_address, DEFAULT_ANSWER_ADDRESS);
}
