//! services/dashboard/src/lib.rs
//!
//! The dashboard process: configuration, concrete adapters for the core ports
//! and the background workers that drive the store.

pub mod adapters;
pub mod config;
pub mod error;
pub mod refresh;
