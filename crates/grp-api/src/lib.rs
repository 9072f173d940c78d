//! HTTP surface of the group propagation filter.

pub mod config;
pub mod server;
