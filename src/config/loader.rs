// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{Pullfile, RawPullfile};
use crate::errors::Result;

/// File name looked up when `--file` is not given.
pub const DEFAULT_PULLFILE: &str = "Pullfile.toml";

/// Read and deserialize a Pullfile without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPullfile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Deserialize Pullfile text.
pub fn parse_str(contents: &str) -> Result<RawPullfile> {
    let raw: RawPullfile = toml::from_str(contents)?;
    Ok(raw)
}

/// Load a Pullfile from `path` and validate it.
///
/// This is the entry point the binary uses:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - at least one rule,
///   - sane `[config]` values,
///   - patterns that compile as globs,
///   - known placeholders in `needs` / `cmd`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Pullfile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let pullfile = Pullfile::try_from(raw)?;
    debug!(
        path = %path.display(),
        rules = pullfile.rules().len(),
        "loaded Pullfile"
    );
    Ok(pullfile)
}
