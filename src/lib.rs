// src/lib.rs

//! Notice Relay Library
//!
//! Watches campus notice boards, files new announcements into a fixed
//! category taxonomy and republishes the relevant ones on a course portal.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
