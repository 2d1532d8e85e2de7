// src/exec/mod.rs

//! Command execution layer for Pullfile rules.
//!
//! - [`template`] expands `{target}`, `{namespace}` and `{arg}` placeholders.
//! - [`rules`] turns `[[rule]]` entries into scheduler handlers.
//! - [`backend`] provides the `CommandRunner` trait and the `ShellRunner`
//!   used in production, which tests replace with a fake.
//! - [`command`] spawns the shell process itself.

pub mod backend;
pub mod command;
pub mod rules;
pub mod template;

pub use backend::{CommandRunner, ShellRunner};
pub use rules::{register_rules, rule_handler};
