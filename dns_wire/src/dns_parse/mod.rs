pub mod message_parse;
pub mod server_config_parse;
pub mod wire_buffer;
