//! rescache - persistent resource cache
//!
//! A key-addressed, disk-backed JSON object cache for data that is expensive
//! to fetch or compute. Operations on one resource are ordered (parallel
//! reads, exclusive writes); different resources never wait on each other.
//! Cache failures never surface as errors: they degrade to a miss.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod settings;
pub mod ui;

pub use cache::{Cache, CacheHandle, CacheOptions, ResourceId};
pub use error::{RescacheError, RescacheResult};
pub use settings::{Setting, SettingsStore};
