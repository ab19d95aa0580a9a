use clap::*;
use dns_wire::{
    dns_make::dns_recv::{self, LogObserver},
    dns_parse::server_config_parse,
    dns_structs::server_config::ServerConfig,
    TransportError,
};
use log::{debug, error, info};

use crate::logger::{create_logger, create_logger_config};

pub fn main() {
    let arguments = Command::new("server")
        .version(crate_version!())
        .about("A UDP DNS stub server that answers every A query with a fixed address")
        .args([
            Arg::new("config_path")
                .short('c')
                .long("config-path")
                .help("Path to the configuration file for the server"),
            Arg::new("port")
                .short('p')
                .long("port")
                .value_parser(value_parser!(u16))
                .help("The port the server will listen on, overrides the config file"),
            Arg::new("debug")
                .short('b')
                .action(ArgAction::SetTrue)
                .long("debug")
                .help("The flag to define if the server will show debug messages on stdout"),
        ])
        .get_matches();

    let debug_mode = arguments.get_flag("debug");

    let handle = match create_logger(debug_mode) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut config = match arguments.get_one::<String>("config_path") {
        Some(config_path) => match server_config_parse::get(config_path) {
            Ok(config) => config,
            Err(err) => {
                error!("SP 127.0.0.1 config-read-fail {}", err);
                std::process::exit(1);
            }
        },
        None => ServerConfig::new(),
    };
    if let Some(port) = arguments.get_one::<u16>("port") {
        config.set_port(*port);
    }

    match create_logger_config(config.get_all_log(), debug_mode) {
        Ok(logger_config) => handle.set_config(logger_config),
        Err(err) => error!("EV @ log-file-create-fail {}", err),
    }

    info!("ST 0.0.0.0 {} {}", config.get_port(), debug_mode);
    debug!("EV @ config-loaded {}", config.to_json());

    if let Err(err) = start_server(&config, false) {
        error!("SP 0.0.0.0 {}", err);
        std::process::exit(1);
    }
}

/// Binds the configured port and serves until the process is killed, or for
/// a single datagram when `once` is set.
pub fn start_server(config: &ServerConfig, once: bool) -> Result<(), TransportError> {
    let socket = dns_recv::bind(format!("0.0.0.0:{}", config.get_port()))?;
    dns_recv::serve(&socket, &config.responder_config(), &LogObserver, once)
}
