use std::fs;
use std::net::Ipv4Addr;

use log::{debug, info, warn};
use regex::Regex;

use crate::dns_structs::server_config::ServerConfig;
use crate::error::ConfigError;

/// Loads a server config file.
///
/// The format is one `<scope> <KEY> <value>` entry per line; anything that
/// doesn't start like an entry (comments included) is ignored.
///
/// ```text
/// # log everything to a file
/// all LG logs/server.log
/// server PT 2053
/// server AD 8.8.8.8
/// server TT 60
/// ```
pub fn get(file_path: &str) -> Result<ServerConfig, ConfigError> {
    let read = fs::read_to_string(file_path).map_err(|source| ConfigError::FileRead {
        path: file_path.to_string(),
        source,
    })?;
    info!("EV @ config-file-read {}", file_path);
    parse_from_str(&read)
}

pub fn parse_from_str(read: &str) -> Result<ServerConfig, ConfigError> {
    let regex_variables =
        Regex::new(r"(?m)^([a-z.0-9-]+) +(LG|AD|TT|PT) +(\S+)").expect("static regex is valid");

    let mut config = ServerConfig::new();

    for cap in regex_variables.captures_iter(read) {
        let scope = &cap[1];
        let key = &cap[2];
        let value = &cap[3];
        match key {
            "LG" => match scope {
                "all" => config.set_all_log(value.to_string()),
                _ => warn!("EV @ config-ignored-log-scope {}", scope),
            },
            "AD" => config.set_answer_address(parse_value::<Ipv4Addr>(key, value)?),
            "TT" => config.set_answer_ttl(parse_value::<u32>(key, value)?),
            "PT" => config.set_port(parse_value::<u16>(key, value)?),
            _ => (),
        }
        debug!("EV @ config-entry {} {} {}", scope, key, value);
    }

    Ok(config)
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[test]
fn test_parse_full_config() {
    let config = parse_from_str(
        "# stub server\n\
         all LG logs/server.log\n\
         server PT 5454\n\
         server AD 10.0.0.1\n\
         server TT 300\n",
    )
    .unwrap();
    assert_eq!(config.get_all_log(), Some("logs/server.log"));
    assert_eq!(config.get_port(), 5454);
    assert_eq!(config.get_answer_address(), Ipv4Addr::new(10, 0, 0, 1));
    assert_eq!(config.get_answer_ttl(), 300);
}

#[test]
fn test_parse_defaults() {
    let config = parse_from_str("# nothing here\n").unwrap();
    assert_eq!(config, ServerConfig::default());
    assert_eq!(config.get_port(), 2053);
    assert_eq!(config.get_answer_ttl(), 60);
}

#[test]
fn test_parse_comment_not_entry() {
    let config = parse_from_str("# server PT 1\n").unwrap();
    assert_eq!(config.get_port(), 2053);
}

#[test]
fn test_parse_invalid_address() {
    let err = parse_from_str("server AD 8.8.8\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "AD"));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        get("does/not/exist.conf"),
        Err(ConfigError::FileRead { .. })
    ));
}

#[test]
fn test_shipped_config() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../etc/stubdns.conf");
    let config = get(path).unwrap();
    assert_eq!(config.get_port(), 2053);
    assert_eq!(config.get_all_log(), Some("logs/server.log"));
}
