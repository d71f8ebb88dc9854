use serde_json::json;

use crate::platform::types::{CreateWebhook, PullRequestFile};

/// Map pull request file entries to the paths a filter can match.
///
/// Renamed files contribute both their old and new path.
pub fn map_file_paths(files: Vec<PullRequestFile>) -> Vec<String> {
    let mut paths = Vec::with_capacity(files.len());
    for file in files {
        if let Some(previous) = file.previous_filename {
            if !paths.contains(&previous) {
                paths.push(previous);
            }
        }
        if !paths.contains(&file.filename) {
            paths.push(file.filename);
        }
    }
    paths
}

/// Request body for `POST /repos/{owner}/{repo}/hooks`.
pub fn map_create_webhook(hook: &CreateWebhook) -> serde_json::Value {
    json!({
        "name": "web",
        "active": true,
        "events": hook.events,
        "config": {
            "url": hook.url,
            "content_type": "json",
            "secret": hook.secret,
            "insecure_ssl": "0",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, previous: Option<&str>) -> PullRequestFile {
        PullRequestFile {
            filename: name.to_string(),
            status: if previous.is_some() { "renamed" } else { "added" }.to_string(),
            previous_filename: previous.map(str::to_string),
        }
    }

    #[test]
    fn test_map_file_paths_includes_renames() {
        let paths = map_file_paths(vec![
            file("src/new.py", Some("src/old.py")),
            file("README.md", None),
        ]);
        assert_eq!(paths, vec!["src/old.py", "src/new.py", "README.md"]);
    }

    #[test]
    fn test_create_webhook_body() {
        let body = map_create_webhook(&CreateWebhook {
            url: "https://hooks.example.com/webhooks/github".to_string(),
            secret: "s".to_string(),
            events: vec!["*".to_string()],
        });
        assert_eq!(body["name"], "web");
        assert_eq!(body["config"]["content_type"], "json");
        assert_eq!(body["config"]["secret"], "s");
        assert_eq!(body["events"][0], "*");
    }
}
