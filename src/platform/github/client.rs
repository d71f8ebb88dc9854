use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

use super::mapper;

const PER_PAGE: u8 = 100;

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

pub struct GitHubPlatform {
    api_url: Option<String>,
}

impl GitHubPlatform {
    pub fn new(config: &GitHubConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
        }
    }

    /// Build an octocrab client, authenticated when a token is given.
    fn client(&self, token: Option<&str>) -> Result<Octocrab> {
        let mut builder = Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token.to_string());
        }
        if let Some(api_url) = &self.api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .map_err(|e| AppError::Config(format!("Invalid GitHub API URL {api_url}: {e}")))?;
        }
        builder
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))
    }

    fn parse_repo(repo_full_name: &str) -> Result<(&str, &str)> {
        match repo_full_name.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => Ok((owner, repo)),
            _ => Err(AppError::GitHubApi(format!(
                "Invalid repo name: {repo_full_name}"
            ))),
        }
    }
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn pull_request_files(
        &self,
        token: Option<&str>,
        repo_full_name: &str,
        pr_number: u64,
    ) -> Result<Vec<String>> {
        let client = self.client(token)?;
        let (owner, repo) = Self::parse_repo(repo_full_name)?;
        let url = format!("/repos/{owner}/{repo}/pulls/{pr_number}/files");

        let mut files = Vec::new();
        let mut page = 1;
        loop {
            let params = PageParams {
                per_page: PER_PAGE,
                page,
            };
            let batch: Vec<PullRequestFile> = client
                .get(&url, Some(&params))
                .await
                .map_err(|e| AppError::GitHubApi(format!("Failed to list PR files: {e}")))?;

            let done = batch.len() < PER_PAGE as usize;
            files.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            repo = repo_full_name,
            pr = pr_number,
            count = files.len(),
            "Fetched pull request files"
        );

        Ok(mapper::map_file_paths(files))
    }

    async fn create_webhook(
        &self,
        token: Option<&str>,
        repo_full_name: &str,
        hook: &CreateWebhook,
    ) -> Result<Hook> {
        let client = self.client(token)?;
        let (owner, repo) = Self::parse_repo(repo_full_name)?;

        let url = format!("/repos/{owner}/{repo}/hooks");
        let body = mapper::map_create_webhook(hook);
        let created: Hook = client
            .post(&url, Some(&body))
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to create webhook: {e}")))?;

        Ok(created)
    }

    async fn list_deliveries(
        &self,
        token: Option<&str>,
        repo_full_name: &str,
        hook_id: u64,
    ) -> Result<Vec<DeliverySummary>> {
        let client = self.client(token)?;
        let (owner, repo) = Self::parse_repo(repo_full_name)?;

        let url = format!("/repos/{owner}/{repo}/hooks/{hook_id}/deliveries");
        let params = PageParams {
            per_page: PER_PAGE,
            page: 1,
        };
        let deliveries: Vec<DeliverySummary> = client
            .get(&url, Some(&params))
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to list deliveries: {e}")))?;

        Ok(deliveries)
    }

    async fn get_delivery(
        &self,
        token: Option<&str>,
        repo_full_name: &str,
        hook_id: u64,
        delivery_id: u64,
    ) -> Result<Delivery> {
        let client = self.client(token)?;
        let (owner, repo) = Self::parse_repo(repo_full_name)?;

        let url = format!("/repos/{owner}/{repo}/hooks/{hook_id}/deliveries/{delivery_id}");
        let delivery: Delivery = client
            .get(&url, None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to fetch delivery: {e}")))?;

        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo() {
        assert_eq!(
            GitHubPlatform::parse_repo("octo/demo").unwrap(),
            ("octo", "demo")
        );
        assert!(GitHubPlatform::parse_repo("demo").is_err());
        assert!(GitHubPlatform::parse_repo("/demo").is_err());
    }

    #[test]
    fn test_delivery_deserializes_github_shape() {
        let body = r#"{
            "id": 12345678,
            "guid": "0b989ba4-242f-11e5-81e1-c7b6966d2516",
            "delivered_at": "2019-06-03T00:57:16Z",
            "redelivery": false,
            "duration": 0.27,
            "status": "OK",
            "status_code": 200,
            "event": "push",
            "action": null,
            "installation_id": null,
            "repository_id": 123,
            "request": {"headers": {}, "payload": {"ref": "refs/heads/main"}},
            "response": {"headers": {}, "payload": "{\"message\": \"Payload fulfills atleast one filter group\"}"}
        }"#;

        let delivery: Delivery = serde_json::from_str(body).unwrap();
        assert_eq!(delivery.summary.id, 12345678);
        assert_eq!(delivery.summary.event, "push");
        assert_eq!(delivery.summary.status_code, 200);
        assert!(delivery
            .response
            .payload
            .unwrap()
            .contains("Payload fulfills atleast one filter group"));
    }
}
