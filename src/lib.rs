// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

pub use crate::build::{Build, BuildOptions, DependencyGraph};
pub use crate::errors::BuildError;
pub use crate::types::{BuildSummary, Target, TargetState};

use crate::cli::CliArgs;
use crate::config::{Pullfile, load_and_validate};
use crate::errors::PullbuildError;
use crate::exec::{ShellRunner, register_rules};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - Pullfile loading and validation
/// - the scheduler and its pool sizing
/// - the shell command runner
/// - optional dependency graph output
pub fn run(args: CliArgs) -> Result<()> {
    let pullfile_path = PathBuf::from(&args.file);
    let pullfile = load_and_validate(&pullfile_path)
        .with_context(|| format!("loading {}", pullfile_path.display()))?;

    if args.dry_run {
        print_dry_run(&pullfile);
        return Ok(());
    }

    let target = resolve_target(args.target.as_deref(), &pullfile)?;

    let mut options = pullfile.config().build_options();
    if let Some(jobs) = args.jobs {
        options = options.with_jobs(usize::from(jobs));
    }

    let build = Build::with_options(options);
    let runner = Arc::new(ShellRunner::new(Some(pullfile_root_dir(&pullfile_path))));
    register_rules(&build, &pullfile, runner);

    let result = build.run(&target);

    if args.graph {
        println!("{}", build.graph().to_dot());
    }

    let summary = build.summary();
    info!(
        root = %target,
        done = summary.done,
        failed = summary.failed,
        "pullbuild finished"
    );

    result.with_context(|| format!("building target '{target}'"))?;
    Ok(())
}

/// Target from the command line, else `[config].default_target`.
pub fn resolve_target(cli_target: Option<&str>, pullfile: &Pullfile) -> Result<String> {
    if let Some(target) = cli_target {
        return Ok(target.to_string());
    }
    match &pullfile.config().default_target {
        Some(target) => Ok(target.clone()),
        None => Err(PullbuildError::ConfigError(
            "no target given and [config].default_target is not set".to_string(),
        )
        .into()),
    }
}

/// Commands run relative to the Pullfile's directory.
///
/// A bare file name like "Pullfile.toml" (parent = "") falls back to the
/// current working directory.
fn pullfile_root_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry-run output: rules in lookup order with their needs and commands.
fn print_dry_run(pullfile: &Pullfile) {
    let cfg = pullfile.config();
    let options = cfg.build_options();

    println!("pullbuild dry-run");
    println!("  config.jobs = {}", options.jobs);
    println!("  config.max_threads = {}", options.max_threads);
    if let Some(target) = &cfg.default_target {
        println!("  config.default_target = {target}");
    }
    println!();

    println!("rules ({}, first match wins):", pullfile.rules().len());
    for (idx, rule) in pullfile.rules().iter().enumerate() {
        println!("  {}. {}", idx + 1, rule.pattern);
        if !rule.needs.is_empty() {
            println!("      needs: {:?}", rule.needs);
        }
        if let Some(cmd) = &rule.cmd {
            println!("      cmd: {cmd}");
        }
    }

    debug!("dry-run complete (no execution)");
}
