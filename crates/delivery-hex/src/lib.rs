//! delivery-hex: delivery marketplace core (auth + order services) and its inbound HTTP adapter.

pub mod config;
pub mod errors;

pub mod application;

pub use delivery_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
