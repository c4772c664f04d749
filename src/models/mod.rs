//! Data models for the internship tracker.
//!
//! Serialized field names follow the canonical record shape shared with consumers.

mod application;

pub use application::*;
