//! Filter group evaluation.
//!
//! A repository is configured with a list of filter groups. A delivery passes
//! when at least one group matches, and a group matches when every one of its
//! conditions holds.

pub mod condition;

pub use condition::{CompiledCondition, Condition, ConditionType};

use crate::error::{AppError, Result};
use crate::webhook::events::EventMapping;

/// Filter groups as written in configuration: OR across groups, AND within.
pub type FilterGroups = Vec<Vec<Condition>>;

#[derive(Debug, Clone)]
pub struct CompiledGroup {
    conditions: Vec<CompiledCondition>,
}

impl CompiledGroup {
    pub fn compile(conditions: &[Condition]) -> Result<Self> {
        if conditions.is_empty() {
            return Err(AppError::Config(
                "Filter groups must contain at least one condition".to_string(),
            ));
        }

        let compiled: Result<Vec<_>> = conditions.iter().map(CompiledCondition::compile).collect();
        Ok(Self {
            conditions: compiled?,
        })
    }

    pub fn matches(&self, mapping: &EventMapping) -> bool {
        self.conditions
            .iter()
            .all(|c| c.matches(mapping.values(c.kind())))
    }

    /// Whether the group tests `kind` and every condition on other types
    /// already holds, so the group's outcome depends on `kind` alone.
    fn pending_on(&self, kind: ConditionType, mapping: &EventMapping) -> bool {
        let mut tests_kind = false;
        for c in &self.conditions {
            if c.kind() == kind {
                tests_kind = true;
            } else if !c.matches(mapping.values(c.kind())) {
                return false;
            }
        }
        tests_kind
    }
}

/// Compiled filter groups for one repository.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    groups: Vec<CompiledGroup>,
}

impl FilterSet {
    pub fn compile(groups: &[Vec<Condition>]) -> Result<Self> {
        let compiled: Result<Vec<_>> = groups.iter().map(|g| CompiledGroup::compile(g)).collect();
        Ok(Self { groups: compiled? })
    }

    /// Index of the first group the mapping satisfies, if any.
    pub fn matching_group(&self, mapping: &EventMapping) -> Option<usize> {
        self.groups.iter().position(|g| g.matches(mapping))
    }

    pub fn is_match(&self, mapping: &EventMapping) -> bool {
        self.matching_group(mapping).is_some()
    }

    /// Whether any group tests values of the given type.
    pub fn uses(&self, kind: ConditionType) -> bool {
        self.groups
            .iter()
            .flat_map(|g| g.conditions.iter())
            .any(|c| c.kind() == kind)
    }

    /// Whether filling in `kind` values could let some group match the
    /// mapping. False when every group testing `kind` already fails on
    /// another condition.
    pub fn needs(&self, kind: ConditionType, mapping: &EventMapping) -> bool {
        self.groups.iter().any(|g| g.pending_on(kind, mapping))
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_mapping(paths: &[&str]) -> EventMapping {
        let mut mapping = EventMapping::base("push", Some("42".to_string()));
        mapping.file_paths = Some(paths.iter().map(|p| p.to_string()).collect());
        mapping
    }

    fn groups(json: &str) -> FilterSet {
        let groups: FilterGroups = serde_json::from_str(json).unwrap();
        FilterSet::compile(&groups).unwrap()
    }

    #[test]
    fn test_single_event_group() {
        let set = groups(r#"[[{"type": "event", "pattern": "push"}]]"#);
        assert!(set.is_match(&push_mapping(&["a.py"])));
        assert!(!set.is_match(&EventMapping::base("label", None)));
    }

    #[test]
    fn test_group_requires_all_conditions() {
        let set = groups(
            r#"[[{"type": "event", "pattern": "push"}, {"type": "file_path", "pattern": ".+\\.sh"}]]"#,
        );
        assert!(!set.is_match(&push_mapping(&["1234.py"])));
        assert!(set.is_match(&push_mapping(&["1234.py", "deploy.sh"])));
    }

    #[test]
    fn test_any_group_suffices() {
        let set = groups(
            r#"[
                [{"type": "event", "pattern": "pull_request"}],
                [{"type": "event", "pattern": "push"}, {"type": "file_path", "pattern": ".+\\.py"}]
            ]"#,
        );
        assert_eq!(set.matching_group(&push_mapping(&["x.py"])), Some(1));
        assert_eq!(set.matching_group(&push_mapping(&["x.md"])), None);
    }

    #[test]
    fn test_file_path_condition_fails_on_base_mapping() {
        let set = groups(
            r#"[[{"type": "event", "pattern": "label"}, {"type": "file_path", "pattern": ".*"}]]"#,
        );
        assert!(!set.is_match(&EventMapping::base("label", None)));
    }

    #[test]
    fn test_empty_groups_reject_everything() {
        let set = FilterSet::compile(&[]).unwrap();
        assert_eq!(set.group_count(), 0);
        assert!(!set.is_match(&push_mapping(&["a.py"])));
    }

    #[test]
    fn test_empty_group_is_config_error() {
        let result = FilterSet::compile(&[vec![]]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_uses_reports_condition_types() {
        let set = groups(
            r#"[[{"type": "event", "pattern": "pull_request"}, {"type": "file_path", "pattern": ".+\\.py"}]]"#,
        );
        assert!(set.uses(ConditionType::FilePath));
        assert!(!set.uses(ConditionType::CommitMessage));
    }

    #[test]
    fn test_needs_file_paths_only_for_surviving_groups() {
        let set = groups(
            r#"[
                [{"type": "event", "pattern": "push"}, {"type": "file_path", "pattern": ".*"}],
                [{"type": "event", "pattern": "pull_request"}, {"type": "base_ref", "pattern": "main"}]
            ]"#,
        );
        let mut pr = EventMapping::base("pull_request", None);
        pr.base_ref = Some("main".to_string());
        assert!(!set.needs(ConditionType::FilePath, &pr));
        assert!(set.needs(ConditionType::FilePath, &EventMapping::base("push", None)));

        let file_only = groups(r#"[[{"type": "file_path", "pattern": ".*"}]]"#);
        assert!(file_only.needs(ConditionType::FilePath, &pr));
    }
}
