use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Which mapped value a condition's pattern is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    /// The `X-GitHub-Event` name.
    Event,
    /// Any file path touched by the event.
    FilePath,
    /// The `action` of a pull_request event.
    PrAction,
    BaseRef,
    HeadRef,
    /// `sender.id` of the delivery.
    ActorAccountId,
    CommitMessage,
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConditionType::Event => "event",
            ConditionType::FilePath => "file_path",
            ConditionType::PrAction => "pr_action",
            ConditionType::BaseRef => "base_ref",
            ConditionType::HeadRef => "head_ref",
            ConditionType::ActorAccountId => "actor_account_id",
            ConditionType::CommitMessage => "commit_message",
        };
        f.write_str(name)
    }
}

/// A single `{type, pattern}` entry of a filter group as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub pattern: String,
    #[serde(default)]
    pub exclude_matched_pattern: bool,
}

impl Condition {
    pub fn new(kind: ConditionType, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            exclude_matched_pattern: false,
        }
    }

    pub fn excluding(mut self) -> Self {
        self.exclude_matched_pattern = true;
        self
    }
}

/// A condition with its pattern compiled into an anchored regex.
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    kind: ConditionType,
    regex: Regex,
    exclude: bool,
}

impl CompiledCondition {
    pub fn compile(condition: &Condition) -> Result<Self> {
        // Patterns must match the whole value, not a substring of it
        let anchored = format!("^(?:{})$", condition.pattern);
        let regex = Regex::new(&anchored).map_err(|e| {
            AppError::Config(format!(
                "Invalid {} pattern {:?}: {e}",
                condition.kind, condition.pattern
            ))
        })?;

        Ok(Self {
            kind: condition.kind,
            regex,
            exclude: condition.exclude_matched_pattern,
        })
    }

    pub fn kind(&self) -> ConditionType {
        self.kind
    }

    /// Test the condition against the mapped values for its type.
    ///
    /// `None` means the event carries no such value; that never matches, even
    /// for excluding conditions.
    pub fn matches(&self, values: Option<&[String]>) -> bool {
        let Some(values) = values else {
            return false;
        };

        let any_matched = values.iter().any(|v| self.regex.is_match(v));
        any_matched != self.exclude
    }
}
