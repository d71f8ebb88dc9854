use std::collections::BTreeSet;

use serde::Deserialize;

use crate::filter::ConditionType;

/// Top-level webhook event parsed from the payload based on X-GitHub-Event header.
#[derive(Debug)]
pub enum WebhookEvent {
    Push(PushEvent),
    PullRequest(PullRequestEvent),
    /// Any other event; filtered on the base mapping only.
    Other { event: String, payload: BasePayload },
}

#[derive(Debug, Deserialize)]
pub struct BasePayload {
    pub action: Option<String>,
    pub repository: Option<RepositoryPayload>,
    pub sender: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub commits: Vec<CommitPayload>,
    pub head_commit: Option<CommitPayload>,
    pub repository: Option<RepositoryPayload>,
    pub sender: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub number: u64,
    pub pull_request: PullRequestPayload,
    pub repository: Option<RepositoryPayload>,
    pub sender: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
pub struct CommitPayload {
    pub message: String,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestPayload {
    pub head: PullRequestRef,
    pub base: PullRequestRef,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub login: String,
    pub id: u64,
}

impl WebhookEvent {
    pub fn parse(event_type: &str, payload: &[u8]) -> Result<Self, serde_json::Error> {
        match event_type {
            "push" => {
                let event: PushEvent = serde_json::from_slice(payload)?;
                Ok(WebhookEvent::Push(event))
            }
            "pull_request" => {
                let event: PullRequestEvent = serde_json::from_slice(payload)?;
                Ok(WebhookEvent::PullRequest(event))
            }
            other => {
                let payload: BasePayload = serde_json::from_slice(payload)?;
                Ok(WebhookEvent::Other {
                    event: other.to_string(),
                    payload,
                })
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            WebhookEvent::Push(_) => "push",
            WebhookEvent::PullRequest(_) => "pull_request",
            WebhookEvent::Other { event, .. } => event.as_str(),
        }
    }

    pub fn repository(&self) -> Option<&RepositoryPayload> {
        match self {
            WebhookEvent::Push(e) => e.repository.as_ref(),
            WebhookEvent::PullRequest(e) => e.repository.as_ref(),
            WebhookEvent::Other { payload, .. } => payload.repository.as_ref(),
        }
    }

    pub fn sender(&self) -> Option<&UserPayload> {
        match self {
            WebhookEvent::Push(e) => e.sender.as_ref(),
            WebhookEvent::PullRequest(e) => e.sender.as_ref(),
            WebhookEvent::Other { payload, .. } => payload.sender.as_ref(),
        }
    }

    /// Number of the pull request, for events whose changed files live behind the API.
    pub fn pull_request_number(&self) -> Option<u64> {
        match self {
            WebhookEvent::PullRequest(e) => Some(e.number),
            _ => None,
        }
    }

    /// Extract the values filter conditions are evaluated against.
    ///
    /// Pull request file paths are not part of the payload; callers that need
    /// them fill in [`EventMapping::file_paths`] from the GitHub API.
    pub fn mapping(&self) -> EventMapping {
        let actor = self.sender().map(|s| s.id.to_string());
        let mut mapping = EventMapping::base(self.name(), actor);

        match self {
            WebhookEvent::Push(e) => {
                mapping.head_ref = Some(e.ref_name.clone());
                mapping.commit_message = e.head_commit.as_ref().map(|c| c.message.clone());
                mapping.file_paths = Some(push_file_paths(e));
            }
            WebhookEvent::PullRequest(e) => {
                mapping.pr_action = Some(e.action.clone());
                mapping.base_ref = Some(e.pull_request.base.ref_name.clone());
                mapping.head_ref = Some(e.pull_request.head.ref_name.clone());
            }
            WebhookEvent::Other { .. } => {}
        }

        mapping
    }
}

/// Every path added, modified or removed across the pushed commits.
fn push_file_paths(event: &PushEvent) -> Vec<String> {
    let mut paths = BTreeSet::new();
    for commit in event.commits.iter().chain(event.head_commit.iter()) {
        paths.extend(commit.added.iter().cloned());
        paths.extend(commit.modified.iter().cloned());
        paths.extend(commit.removed.iter().cloned());
    }
    paths.into_iter().collect()
}

/// Values extracted from a delivery for filtering. `None` means the event
/// type carries no such value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMapping {
    pub event: String,
    pub actor_account_id: Option<String>,
    pub pr_action: Option<String>,
    pub base_ref: Option<String>,
    pub head_ref: Option<String>,
    pub commit_message: Option<String>,
    pub file_paths: Option<Vec<String>>,
}

impl EventMapping {
    /// The mapping shared by every event type.
    pub fn base(event: &str, actor_account_id: Option<String>) -> Self {
        Self {
            event: event.to_string(),
            actor_account_id,
            ..Default::default()
        }
    }

    pub fn values(&self, kind: ConditionType) -> Option<&[String]> {
        match kind {
            ConditionType::Event => Some(std::slice::from_ref(&self.event)),
            ConditionType::FilePath => self.file_paths.as_deref(),
            ConditionType::PrAction => self.pr_action.as_ref().map(std::slice::from_ref),
            ConditionType::BaseRef => self.base_ref.as_ref().map(std::slice::from_ref),
            ConditionType::HeadRef => self.head_ref.as_ref().map(std::slice::from_ref),
            ConditionType::ActorAccountId => {
                self.actor_account_id.as_ref().map(std::slice::from_ref)
            }
            ConditionType::CommitMessage => self.commit_message.as_ref().map(std::slice::from_ref),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUSH: &str = r#"{
        "ref": "refs/heads/main",
        "commits": [
            {"id": "a1", "message": "first", "added": ["new.py"], "modified": ["lib/util.py"], "removed": []},
            {"id": "b2", "message": "second", "added": [], "modified": ["new.py"], "removed": ["old.sh"]}
        ],
        "head_commit": {"id": "b2", "message": "second", "added": [], "modified": ["new.py"], "removed": ["old.sh"]},
        "repository": {"name": "demo", "full_name": "octo/demo", "private": true},
        "sender": {"login": "octocat", "id": 583231}
    }"#;

    const PULL_REQUEST: &str = r#"{
        "action": "opened",
        "number": 7,
        "pull_request": {
            "number": 7,
            "head": {"ref": "feature-x", "sha": "abc"},
            "base": {"ref": "main", "sha": "def"}
        },
        "repository": {"name": "demo", "full_name": "octo/demo", "private": false},
        "sender": {"login": "octocat", "id": 583231}
    }"#;

    const LABEL: &str = r#"{
        "action": "created",
        "label": {"name": "test", "color": "B60205"},
        "repository": {"name": "demo", "full_name": "octo/demo"},
        "sender": {"login": "octocat", "id": 583231}
    }"#;

    #[test]
    fn test_push_mapping_collects_file_paths() {
        let event = WebhookEvent::parse("push", PUSH.as_bytes()).unwrap();
        let mapping = event.mapping();

        assert_eq!(mapping.event, "push");
        assert_eq!(mapping.head_ref.as_deref(), Some("refs/heads/main"));
        assert_eq!(mapping.commit_message.as_deref(), Some("second"));
        assert_eq!(mapping.actor_account_id.as_deref(), Some("583231"));
        assert_eq!(
            mapping.file_paths,
            Some(vec![
                "lib/util.py".to_string(),
                "new.py".to_string(),
                "old.sh".to_string()
            ])
        );
        assert_eq!(event.repository().unwrap().full_name, "octo/demo");
        assert_eq!(event.sender().unwrap().login, "octocat");
    }

    #[test]
    fn test_push_without_head_commit() {
        let body = r#"{"ref": "refs/heads/gone", "commits": [], "head_commit": null}"#;
        let mapping = WebhookEvent::parse("push", body.as_bytes()).unwrap().mapping();
        assert_eq!(mapping.file_paths, Some(vec![]));
        assert_eq!(mapping.commit_message, None);
        assert_eq!(mapping.actor_account_id, None);
    }

    #[test]
    fn test_pull_request_mapping() {
        let event = WebhookEvent::parse("pull_request", PULL_REQUEST.as_bytes()).unwrap();
        let mapping = event.mapping();

        assert_eq!(event.pull_request_number(), Some(7));
        assert_eq!(mapping.pr_action.as_deref(), Some("opened"));
        assert_eq!(mapping.base_ref.as_deref(), Some("main"));
        assert_eq!(mapping.head_ref.as_deref(), Some("feature-x"));
        assert_eq!(mapping.file_paths, None);
    }

    #[test]
    fn test_label_uses_base_mapping() {
        let event = WebhookEvent::parse("label", LABEL.as_bytes()).unwrap();
        let mapping = event.mapping();

        assert_eq!(event.name(), "label");
        assert_eq!(mapping, EventMapping::base("label", Some("583231".to_string())));
        assert_eq!(mapping.values(ConditionType::FilePath), None);
        assert_eq!(
            mapping.values(ConditionType::Event),
            Some(&["label".to_string()][..])
        );
    }

    #[test]
    fn test_envelope_without_repository_parses_as_base() {
        let event = WebhookEvent::parse("ping", br#"{"body": {}}"#).unwrap();
        assert!(event.repository().is_none());
    }

    #[test]
    fn test_malformed_push_is_error() {
        assert!(WebhookEvent::parse("push", br#"{"body": {}}"#).is_err());
        assert!(WebhookEvent::parse("label", b"not json").is_err());
    }
}
