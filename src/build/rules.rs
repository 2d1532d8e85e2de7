// src/build/rules.rs

//! Ordered rule table with first-match glob lookup.

use std::fmt;
use std::sync::Arc;

use globset::{GlobBuilder, GlobMatcher};
use tracing::warn;

use crate::build::Build;
use crate::errors::BuildError;

/// Body of a rule.
///
/// Receives the scheduler (so it can `need` other targets) and the concrete
/// target that matched the rule's pattern.
pub type Handler = Arc<dyn Fn(&Build, &str) -> anyhow::Result<()> + Send + Sync>;

/// Compile a rule pattern with shell-glob semantics.
///
/// `*` matches any run of characters (including `/` and `:`), `?` a single
/// character, and `[...]` a character class.
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    let glob = GlobBuilder::new(pattern).literal_separator(false).build()?;
    Ok(glob.compile_matcher())
}

/// A `(pattern, handler)` pair.
#[derive(Clone)]
pub struct Rule {
    pattern: String,
    /// `None` when the pattern failed to compile; such a rule never matches.
    matcher: Option<GlobMatcher>,
    handler: Handler,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.pattern)
            .field("valid", &self.matcher.is_some())
            .finish_non_exhaustive()
    }
}

impl Rule {
    pub fn new(pattern: impl Into<String>, handler: Handler) -> Self {
        let pattern = pattern.into();
        let matcher = match compile_pattern(&pattern) {
            Ok(m) => Some(m),
            Err(err) => {
                warn!(
                    pattern = %pattern,
                    error = %err,
                    "invalid rule pattern; rule will never match"
                );
                None
            }
        };

        Self {
            pattern,
            matcher,
            handler,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn handler(&self) -> Handler {
        Arc::clone(&self.handler)
    }

    pub fn matches(&self, target: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|matcher| matcher.is_match(target))
    }
}

/// Rules in registration order.
///
/// Lookup picks the first rule whose pattern matches, regardless of how
/// specific later patterns look.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// First rule matching `target`, or `NoMatchingRule`.
    pub fn find(&self, target: &str) -> Result<&Rule, BuildError> {
        self.rules
            .iter()
            .find(|rule| rule.matches(target))
            .ok_or_else(|| BuildError::NoMatchingRule {
                target: target.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Arc::new(|_: &Build, _: &str| -> anyhow::Result<()> { Ok(()) })
    }

    fn table(patterns: &[&str]) -> RuleTable {
        let mut table = RuleTable::new();
        for p in patterns {
            table.push(Rule::new(*p, noop()));
        }
        table
    }

    #[test]
    fn first_registered_match_wins() {
        let rules = table(&["build:*", "build:special"]);
        let rule = rules.find("build:special").unwrap();
        assert_eq!(rule.pattern(), "build:*");
    }

    #[test]
    fn exact_pattern_before_wildcard_shadows_it() {
        let rules = table(&["build:special", "build:*"]);
        assert_eq!(rules.find("build:special").unwrap().pattern(), "build:special");
        assert_eq!(rules.find("build:other").unwrap().pattern(), "build:*");
    }

    #[test]
    fn wildcards_follow_shell_glob_semantics() {
        let rules = table(&["render_page:?", "copy_assets:*", "fetch_[ab]"]);

        assert_eq!(rules.find("render_page:x").unwrap().pattern(), "render_page:?");
        assert!(rules.find("render_page:xy").is_err());

        // `*` crosses path separators, like fnmatch.
        assert_eq!(
            rules.find("copy_assets:img/logo.svg").unwrap().pattern(),
            "copy_assets:*"
        );

        assert!(rules.find("fetch_a").is_ok());
        assert!(rules.find("fetch_c").is_err());
    }

    #[test]
    fn no_match_reports_the_target() {
        let rules = table(&["fetch_feeds"]);
        match rules.find("render_page:about") {
            Err(BuildError::NoMatchingRule { target }) => assert_eq!(target, "render_page:about"),
            other => panic!("expected NoMatchingRule, got {other:?}"),
        }
    }

    #[test]
    fn malformed_pattern_never_matches() {
        let rules = table(&["broken[", "*"]);
        assert!(!rules.iter().next().unwrap().matches("broken["));
        assert_eq!(rules.find("broken[").unwrap().pattern(), "*");
        assert_eq!(rules.len(), 2);
    }
}
