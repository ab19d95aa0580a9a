pub mod dns_recv;
pub mod dns_send;
