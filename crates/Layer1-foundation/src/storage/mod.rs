//! Storage module for Vibepoints
//!
//! - `json`: JSON - small documents such as the persisted options

mod json;

pub use json::JsonStore;
