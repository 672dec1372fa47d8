//! # Collection Log Adviser
//!
//! Estimates how long each activity takes to yield the next new collection
//! log slot, and ranks activities by that time.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (activities, drop items, estimates)
//! - **catalog**: CSV catalog loading and the shared, reloadable snapshot
//! - **calculate**: Drop-rate models, time estimates and ranking
//! - **collection_log**: Collection log documents and progress summaries
//! - **fetch**: File and collectionlog.net log sources
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod catalog;
pub mod collection_log;
pub mod config;
pub mod fetch;
pub mod models;

pub use models::*;
