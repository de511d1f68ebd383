//! SIBIA Gateway - Resilient polling gateway for biogas plant telemetry
//!
//! Polls the plant backend through a caching / stabilizing / connectivity
//! monitoring pipeline and serves the latest consolidated snapshot over HTTP.
//!
//! This library exposes the core modules for testing and reuse.

pub mod backend;
pub mod common;
pub mod config;
pub mod error;
pub mod poll;
pub mod routes;
pub mod services;
