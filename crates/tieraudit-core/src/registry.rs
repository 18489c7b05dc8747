//! Fix rule registries.
//!
//! Two ordered rule tables, script fixes (executed) and agent fixes
//! (deferred directives), evaluated first-match-wins, script table before
//! agent table. A finding matches at most one rule across both tables.
//! Reordering entries is a behavior-changing, compatibility-breaking edit.

use serde::{Deserialize, Serialize};

use crate::domain::Finding;

/// Placeholder expanded to the finding's location in templates.
const FILE_PLACEHOLDER: &str = "{file}";

/// Placeholder expanded to the finding's message in templates.
const MESSAGE_PLACEHOLDER: &str = "{message}";

/// Action attached to a matched rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixAction {
    /// Command executed as an external process. `{file}` expands to the
    /// finding's location.
    Script { command: Vec<String> },

    /// Natural-language instruction queued for manual/agent execution,
    /// never executed here. `{file}` and `{message}` expand.
    Agent { directive: String },
}

/// One (predicate, action) entry in a registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixRule {
    /// Category the rule applies to ("*" matches any).
    pub category: String,

    /// Lowercase substring tested against the finding's message and
    /// suggestion. Empty matches any finding in the category.
    pub pattern: String,

    /// What to do with a matched finding.
    pub action: FixAction,
}

impl FixRule {
    pub fn script(category: &str, pattern: &str, command: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            pattern: pattern.to_string(),
            action: FixAction::Script {
                command: command.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn agent(category: &str, pattern: &str, directive: &str) -> Self {
        Self {
            category: category.to_string(),
            pattern: pattern.to_string(),
            action: FixAction::Agent {
                directive: directive.to_string(),
            },
        }
    }

    /// Whether this rule claims a finding from the given category.
    ///
    /// A script rule whose command needs `{file}` cannot match a finding
    /// without a location: there would be nothing to expand.
    pub fn matches(&self, category: &str, finding: &Finding) -> bool {
        if self.category != "*" && self.category != category {
            return false;
        }

        if !self.pattern.is_empty() {
            let pattern = self.pattern.to_lowercase();
            let in_message = finding.message.to_lowercase().contains(&pattern);
            let in_suggestion = finding
                .suggestion
                .as_deref()
                .map(|s| s.to_lowercase().contains(&pattern))
                .unwrap_or(false);
            if !in_message && !in_suggestion {
                return false;
            }
        }

        if let FixAction::Script { command } = &self.action {
            let needs_file = command.iter().any(|arg| arg.contains(FILE_PLACEHOLDER));
            if needs_file && finding.location.is_none() {
                return false;
            }
        }

        true
    }
}

/// Expand `{file}` and `{message}` placeholders against a finding.
pub fn expand_template(template: &str, finding: &Finding) -> String {
    template
        .replace(FILE_PLACEHOLDER, finding.location.as_deref().unwrap_or(""))
        .replace(MESSAGE_PLACEHOLDER, &finding.message)
}

/// Expand a command template against a finding.
pub fn expand_command(command: &[String], finding: &Finding) -> Vec<String> {
    command.iter().map(|arg| expand_template(arg, finding)).collect()
}

/// The two ordered rule tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixRegistry {
    pub script_rules: Vec<FixRule>,
    pub agent_rules: Vec<FixRule>,
}

impl FixRegistry {
    pub fn new(script_rules: Vec<FixRule>, agent_rules: Vec<FixRule>) -> Self {
        Self {
            script_rules,
            agent_rules,
        }
    }

    /// First script rule matching a finding, if any.
    pub fn match_script(&self, category: &str, finding: &Finding) -> Option<&FixRule> {
        self.script_rules
            .iter()
            .find(|rule| rule.matches(category, finding))
    }

    /// First agent rule matching a finding, if any.
    pub fn match_agent(&self, category: &str, finding: &Finding) -> Option<&FixRule> {
        self.agent_rules
            .iter()
            .find(|rule| rule.matches(category, finding))
    }
}

impl Default for FixRegistry {
    /// The built-in registries. Mechanically fixable lint/format findings
    /// get script fixes; judgment calls become agent directives.
    fn default() -> Self {
        Self {
            script_rules: vec![
                FixRule::script("lint", "formatting", &["npx", "prettier", "--write", "{file}"]),
                FixRule::script("lint", "fixable", &["npx", "eslint", "--fix", "{file}"]),
                FixRule::script("lint", "unused import", &["npx", "eslint", "--fix", "{file}"]),
                FixRule::script(
                    "dependencies",
                    "lockfile out of date",
                    &["npm", "install", "--package-lock-only"],
                ),
            ],
            agent_rules: vec![
                FixRule::agent(
                    "security",
                    "",
                    "Remediate security finding in {file}: {message}",
                ),
                FixRule::agent(
                    "complexity",
                    "complexity",
                    "Refactor {file} to reduce complexity: {message}",
                ),
                FixRule::agent(
                    "architecture",
                    "",
                    "Resolve architecture violation: {message}",
                ),
                FixRule::agent(
                    "coverage",
                    "coverage",
                    "Add tests to raise coverage: {message}",
                ),
                FixRule::agent("typecheck", "", "Fix type error in {file}: {message}"),
            ],
        }
    }
}
