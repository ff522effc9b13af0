// src/models/mod.rs

//! Domain models for the relay.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod announcement;
mod board;
mod category;
mod config;

// Re-export all public types
pub use announcement::{Announcement, Fidelity};
pub use board::{BoardCursor, BoardList};
pub use category::Category;
pub use config::{
    ClassifierConfig, Config, CrawlerConfig, DedupConfig, KeywordRule, OracleConfig,
    PortalSelectors, PublisherConfig, SelectorConfig, StorageConfig,
};
