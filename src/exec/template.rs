// src/exec/template.rs

//! Placeholder expansion for Pullfile `needs` and `cmd` strings.
//!
//! Targets conventionally look like `namespace:argument`
//! (`copy_assets:style.css`). Inside a rule, `{target}` expands to the full
//! target, `{namespace}` to the part before the first `:` and `{arg}` to the
//! part after it (empty when there is no `:`).

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Placeholder names understood by [`expand`].
pub const PLACEHOLDERS: &[&str] = &["target", "namespace", "arg"];

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex"));

/// Split `namespace:arg`. Without a `:`, the whole target is the namespace.
pub fn split_target(target: &str) -> (&str, &str) {
    target.split_once(':').unwrap_or((target, ""))
}

/// Substitute placeholders in `template` for `target`.
///
/// Unknown placeholders are left untouched.
pub fn expand(template: &str, target: &str) -> String {
    let (namespace, arg) = split_target(target);
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "target" => target.to_string(),
            "namespace" => namespace.to_string(),
            "arg" => arg.to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder names in `template` that [`expand`] does not know.
pub fn unknown_placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .filter(|name| !PLACEHOLDERS.contains(&name.as_str()))
        .collect()
}
