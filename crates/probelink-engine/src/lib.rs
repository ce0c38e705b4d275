//! # Probelink Engine
//!
//! This crate provides the measurement core for probing a catalog of
//! outbound proxies: loading and normalizing the catalog, probing each
//! proxy's latency, jitter, packet loss, and download/upload throughput
//! through a dial-tunneling HTTP client, aggregating the results, and
//! emitting a filtered, optionally renamed catalog back out.
//!
//! ## License
//!
//! MIT License

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod probe;
pub mod proxy;
pub mod rename;
pub mod result;
pub mod server_target;
pub mod zero_source;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use probe::ProbeEngine;
pub use proxy::Proxy;
pub use result::{ProbeResult, ResultStore};
