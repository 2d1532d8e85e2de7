// src/config/mod.rs

//! Pullfile configuration.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a Pullfile from disk (`loader.rs`).
//! - Validate it before any rule is registered (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_PULLFILE, load_and_validate, load_from_path, parse_str};
pub use model::{ConfigSection, Pullfile, RawPullfile, RuleConfig};
pub use validate::validate_pullfile;
