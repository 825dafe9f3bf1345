//! Semantic checks on a parsed configuration

use super::StrataConfig;
use crate::models::Keybind;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    /// Dotted path of the offending entry, e.g. `workspaces[1].name`
    pub location: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

pub struct ConfigValidator {
    chord_regex: Regex,
    known_layouts: HashSet<String>,
    known_commands: Option<HashSet<String>>,
}

impl ConfigValidator {
    pub fn new<'a>(known_layouts: impl IntoIterator<Item = &'a str>) -> Result<Self, regex::Error> {
        let chord_regex = Regex::new(r"^[A-Za-z0-9]+(\s*\+\s*[A-Za-z0-9]+)+$")?;
        Ok(Self {
            chord_regex,
            known_layouts: known_layouts.into_iter().map(str::to_string).collect(),
            known_commands: None,
        })
    }

    /// Also check that keybinds name registered commands
    pub fn with_commands<'a>(mut self, commands: impl IntoIterator<Item = &'a str>) -> Self {
        self.known_commands = Some(commands.into_iter().map(str::to_string).collect());
        self
    }

    pub fn validate(&self, config: &StrataConfig) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.validate_store(config, &mut issues);
        self.validate_layout(config, &mut issues);
        self.validate_workspaces(config, &mut issues);
        self.validate_keybinds(config, &mut issues);
        issues
    }

    pub fn errors(issues: &[ValidationIssue]) -> impl Iterator<Item = &ValidationIssue> {
        issues
            .iter()
            .filter(|issue| issue.severity == ValidationSeverity::Error)
    }

    fn validate_store(&self, config: &StrataConfig, issues: &mut Vec<ValidationIssue>) {
        if config.store.dispatch_capacity == 0 {
            issues.push(error("store.dispatch_capacity", "must be positive"));
        }
        if config.store.event_capacity == 0 {
            issues.push(error("store.event_capacity", "must be positive"));
        }
        if !config.store.check_integrity {
            issues.push(warning(
                "store.check_integrity",
                "integrity checks are disabled; invalid transforms may commit dangling references",
            ));
        }
    }

    fn validate_layout(&self, config: &StrataConfig, issues: &mut Vec<ValidationIssue>) {
        let layout = &config.layout;
        if !self.known_layouts.contains(&layout.default_engine) {
            issues.push(error(
                "layout.default_engine",
                format!("unknown layout engine '{}'", layout.default_engine),
            ));
        }
        if !(0.1..=0.9).contains(&layout.params.main_ratio) {
            issues.push(error(
                "layout.main_ratio",
                format!("{} must be between 0.1 and 0.9", layout.params.main_ratio),
            ));
        }
        if layout.params.gap < 0.0 || layout.params.margin < 0.0 {
            issues.push(error("layout", "gap and margin cannot be negative"));
        }
    }

    fn validate_workspaces(&self, config: &StrataConfig, issues: &mut Vec<ValidationIssue>) {
        let mut names = HashSet::new();
        for (index, workspace) in config.workspaces.iter().enumerate() {
            let location = format!("workspaces[{index}]");
            let name = workspace.name.trim();
            if name.is_empty() {
                issues.push(error(&location, "workspace name cannot be empty"));
            } else if name.len() > 100 {
                issues.push(error(&location, "workspace name exceeds 100 characters"));
            } else if !names.insert(name.to_string()) {
                issues.push(error(&location, format!("duplicate workspace name '{name}'")));
            }

            if let Some(layout) = &workspace.layout {
                if !self.known_layouts.contains(layout) {
                    issues.push(error(&location, format!("unknown layout engine '{layout}'")));
                }
            }
        }
    }

    fn validate_keybinds(&self, config: &StrataConfig, issues: &mut Vec<ValidationIssue>) {
        let mut chords = HashSet::new();
        for (index, entry) in config.keybinds.iter().enumerate() {
            let location = format!("keybinds[{index}]");
            if !self.chord_regex.is_match(entry.keys.trim()) {
                issues.push(error(&location, format!("malformed chord '{}'", entry.keys)));
                continue;
            }
            match entry.keys.parse::<Keybind>() {
                Ok(chord) => {
                    if !chords.insert(chord.clone()) {
                        issues.push(warning(
                            &location,
                            format!("'{chord}' is bound more than once; all bound commands run"),
                        ));
                    }
                }
                Err(err) => issues.push(error(&location, err.to_string())),
            }

            if let Some(commands) = &self.known_commands {
                if !commands.contains(&entry.command) {
                    issues.push(error(&location, format!("unknown command '{}'", entry.command)));
                }
            }
        }
    }
}

fn error(location: impl Into<String>, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        severity: ValidationSeverity::Error,
        location: location.into(),
        message: message.into(),
    }
}

fn warning(location: impl Into<String>, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        severity: ValidationSeverity::Warning,
        location: location.into(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeybindEntry, WorkspaceEntry};

    fn validator() -> ConfigValidator {
        ConfigValidator::new(["master_stack", "columns"]).unwrap()
    }

    #[test]
    fn default_config_is_clean() {
        let issues = validator().validate(&StrataConfig::default());
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn duplicate_and_empty_workspace_names_are_errors() {
        let mut config = StrataConfig::default();
        config.workspaces = vec![
            WorkspaceEntry::named("web"),
            WorkspaceEntry::named("web"),
            WorkspaceEntry::named("  "),
        ];
        let issues = validator().validate(&config);
        let errors: Vec<_> = ConfigValidator::errors(&issues).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].location, "workspaces[1]");
    }

    #[test]
    fn keybinds_are_checked_for_syntax_and_commands() {
        let mut config = StrataConfig::default();
        config.keybinds = vec![
            KeybindEntry::new("alt+j", "strata.focus_next"),
            KeybindEntry::new("alt+", "strata.focus_next"),
            KeybindEntry::new("alt+k", "does.not.exist"),
        ];
        let issues = validator()
            .with_commands(["strata.focus_next"])
            .validate(&config);
        let locations: Vec<_> = issues.iter().map(|i| i.location.as_str()).collect();
        assert_eq!(locations, vec!["keybinds[1]", "keybinds[2]"]);
    }

    #[test]
    fn unknown_layouts_and_bad_ratio_are_reported() {
        let mut config = StrataConfig::default();
        config.layout.default_engine = "spiral".into();
        config.layout.params.main_ratio = 0.95;
        config.workspaces = vec![WorkspaceEntry {
            name: "code".into(),
            layout: Some("bsp".into()),
        }];
        let issues = validator().validate(&config);
        assert_eq!(ConfigValidator::errors(&issues).count(), 3);
    }
}
