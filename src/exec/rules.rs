// src/exec/rules.rs

//! Turning Pullfile `[[rule]]` entries into scheduler rules.

use std::sync::Arc;

use tracing::debug;

use crate::build::Build;
use crate::config::{Pullfile, RuleConfig};
use crate::exec::backend::CommandRunner;
use crate::exec::template;

/// Register every rule of `pullfile` on `build`, in file order.
pub fn register_rules(build: &Build, pullfile: &Pullfile, runner: Arc<dyn CommandRunner>) {
    for rule in pullfile.rules() {
        build.rule(rule.pattern.clone(), rule_handler(rule.clone(), Arc::clone(&runner)));
    }
    debug!(rules = pullfile.rules().len(), "registered Pullfile rules");
}

/// Handler for one rule: build the expanded `needs` (in a single demand, so
/// they run in parallel), then run the expanded `cmd`, if any.
pub fn rule_handler(
    rule: RuleConfig,
    runner: Arc<dyn CommandRunner>,
) -> impl Fn(&Build, &str) -> anyhow::Result<()> + Send + Sync + 'static {
    move |build: &Build, target: &str| {
        let needs: Vec<String> = rule
            .needs
            .iter()
            .map(|need| template::expand(need, target))
            .collect();

        if !needs.is_empty() {
            debug!(name = %target, ?needs, "rule needs");
            build.need(&needs)?;
        }

        if let Some(cmd) = &rule.cmd {
            runner.run(target, &template::expand(cmd, target))?;
        }

        Ok(())
    }
}
