//! CLI command implementations

pub mod clear;
pub mod config;
pub mod entry;
pub mod list;
pub mod settings;

pub use clear::execute as clear;
pub use config::execute as config;
pub use entry::{delete, get, path, put};
pub use list::execute as list;
pub use settings::execute as settings;
