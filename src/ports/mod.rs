//! Port traits at the I/O seams of the domain.

pub mod config_port;
pub mod data_port;
pub mod store_port;
