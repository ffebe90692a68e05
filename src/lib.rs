//! procpulse - system metrics exporter library.
//!
//! This library provides the building blocks of the `procpulsed` daemon:
//! - `collector` - reads raw counters from the `/proc` filesystem
//! - `rates` - converts counter samples into rate/percentage gauges
//! - `registry` - thread-safe gauge registry behind a Prometheus exposition
//! - `config` - JSON configuration with live-reloadable metric enablement
//! - `sampler` - the read -> compute -> publish loop
//! - `server` - the HTTP scrape endpoint

pub mod collector;
pub mod config;
pub mod rates;
pub mod registry;
pub mod sampler;
pub mod server;
