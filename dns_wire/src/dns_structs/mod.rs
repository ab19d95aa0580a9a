pub mod dns_domain_name;
pub mod dns_message;
pub mod server_config;
