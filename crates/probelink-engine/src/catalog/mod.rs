//! Catalog ingestion: fetch, sanitize, parse, resolve providers, normalize,
//! and filter a proxy catalog down to a name-keyed map of dialable proxies.

pub mod loader;
pub mod provider;
pub mod raw;
pub mod sanitize;

pub use loader::load_proxies;
pub use raw::RawConfig;
