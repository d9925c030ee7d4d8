//! Rule table: pattern-to-command mappings and first-match dispatch

use std::fmt;

use regex::Regex;
use tracing::{error, info, warn};

use crate::error::{HookError, Result};
use crate::exec;
use crate::payload::Payload;

/// One `PATTERN=COMMAND` mapping. The pattern is matched against the
/// composed `owner/repo:branch` path of an incoming event.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    command: String,
}

impl Rule {
    /// Parse a single `PATTERN=COMMAND` line.
    ///
    /// The line is split on the first `=` only, so the command itself may
    /// contain `=`.
    pub fn parse(line: &str) -> Result<Self> {
        let (pattern, command) = line
            .split_once('=')
            .ok_or_else(|| HookError::RuleSyntax(line.to_string()))?;

        let pattern = Regex::new(pattern).map_err(|source| HookError::PatternCompile {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern,
            command: command.to_string(),
        })
    }

    /// Partial-match search against the composed event path. Rule authors
    /// rely on this not being anchored: `fix` matches anywhere in the path.
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the command with the payload's variables in the environment.
    pub async fn run(&self, payload: &dyn Payload) -> Result<String> {
        exec::run_shell(&self.command, &payload.env_data()).await
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}='{}'", self.pattern.as_str(), self.command)
    }
}

/// Ordered collection of rules. Built once at startup and read-only
/// afterwards; declaration order is preserved exactly.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Build a table from `PATTERN=COMMAND` lines.
    ///
    /// One bad line fails the whole load; a partially-built table is never
    /// returned.
    pub fn parse<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = lines
            .into_iter()
            .map(|line| Rule::parse(line.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Dispatch a payload to the first rule whose pattern matches its
    /// composed path. Later rules are not evaluated. No match is a normal
    /// outcome: a diagnostic message, not an error.
    pub async fn execute_payload(&self, payload: &dyn Payload) -> Result<String> {
        let path = payload.path();

        for rule in &self.rules {
            if !rule.matches(&path) {
                continue;
            }

            info!("running '{}' for {}", rule.command(), path);
            return match rule.run(payload).await {
                Ok(output) => {
                    info!("'{}' for {} output: {}", rule.command(), path, output);
                    Ok(output)
                }
                Err(e) => {
                    error!("'{}' for {} failed: {}", rule.command(), path, e);
                    Err(e)
                }
            };
        }

        warn!("no handler for {}", path);
        Ok(format!("no handler for '{}'\n", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestPayload {
        repo: &'static str,
        branch: &'static str,
    }

    impl Payload for TestPayload {
        fn repo_name(&self) -> String {
            self.repo.to_string()
        }

        fn branch_name(&self) -> String {
            self.branch.to_string()
        }

        fn env_data(&self) -> Vec<String> {
            vec![
                format!("REPO={}", self.repo),
                format!("BRANCH={}", self.branch),
            ]
        }
    }

    const MAIN_PUSH: TestPayload = TestPayload {
        repo: "acme/widget",
        branch: "main",
    };

    #[test]
    fn parse_splits_on_first_equals_only() {
        let rule = Rule::parse("a.*=echo a=b").unwrap();
        assert_eq!(rule.to_string(), "a.*='echo a=b'");
        assert_eq!(rule.command(), "echo a=b");
    }

    #[test]
    fn parse_requires_an_equals_sign() {
        let err = Rule::parse("no separator here").unwrap_err();
        assert!(matches!(err, HookError::RuleSyntax(_)));
    }

    #[test]
    fn parse_rejects_invalid_patterns() {
        let err = Rule::parse("[=echo hi").unwrap_err();
        assert!(matches!(err, HookError::PatternCompile { .. }));
    }

    #[test]
    fn one_bad_line_fails_the_whole_table() {
        let err = RuleTable::parse([".*=echo ok", "bad line"]).unwrap_err();
        assert!(matches!(err, HookError::RuleSyntax(_)));
    }

    #[test]
    fn matching_is_a_substring_search() {
        let rule = Rule::parse("fix=echo hi").unwrap();
        assert!(rule.matches("acme/widget:fix-123"));
        assert!(rule.matches("acme/widget:prefix-fix-123"));
        assert!(!rule.matches("acme/widget:main"));
    }

    #[test]
    fn display_renders_pattern_and_quoted_command() {
        let rule = Rule::parse("acme/.*:main=make deploy").unwrap();
        assert_eq!(rule.to_string(), "acme/.*:main='make deploy'");
    }

    #[test]
    fn table_preserves_declaration_order() {
        let table = RuleTable::parse(["b=echo b", "a=echo a"]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rules()[0].command(), "echo b");
        assert_eq!(table.rules()[1].command(), "echo a");
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let table = RuleTable::parse([
            "other/repo:.*=echo wrong",
            "acme/widget:main=echo first",
            "acme/.*=echo second",
        ])
        .unwrap();

        let output = table.execute_payload(&MAIN_PUSH).await.unwrap();
        assert_eq!(output.trim(), "first");
    }

    #[tokio::test]
    async fn later_matching_rules_are_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");

        let table = RuleTable::parse([
            format!("acme/widget:main=touch {}", first.display()),
            format!("acme/.*=touch {}", second.display()),
        ])
        .unwrap();

        table.execute_payload(&MAIN_PUSH).await.unwrap();
        assert!(first.exists());
        assert!(!second.exists());
    }

    #[tokio::test]
    async fn no_match_is_a_non_error_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");

        let table =
            RuleTable::parse([format!("other/repo:.*=touch {}", marker.display())]).unwrap();

        let output = table.execute_payload(&MAIN_PUSH).await.unwrap();
        assert!(output.contains("no handler for 'acme/widget:main'"));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn failed_command_surfaces_as_execution_error() {
        let table = RuleTable::parse([".*=echo broken; exit 1"]).unwrap();

        let err = table.execute_payload(&MAIN_PUSH).await.unwrap_err();
        match err {
            HookError::Execution { output, .. } => assert!(output.contains("broken")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn command_sees_payload_environment() {
        let table = RuleTable::parse([".*=printenv REPO BRANCH"]).unwrap();

        let output = table.execute_payload(&MAIN_PUSH).await.unwrap();
        assert_eq!(output, "acme/widget\nmain\n");
    }
}
