//! In-memory [`Platform`] used by tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

#[derive(Default)]
pub struct FakePlatform {
    pub pr_files: Mutex<HashMap<(String, u64), Vec<String>>>,
    pub created_hooks: Mutex<Vec<(String, CreateWebhook)>>,
    /// Successive answers to `list_deliveries`; the last one repeats.
    pub delivery_pages: Mutex<Vec<Vec<DeliverySummary>>>,
    pub deliveries: Mutex<HashMap<u64, Delivery>>,
    pub tokens_seen: Mutex<Vec<Option<String>>>,
}

impl FakePlatform {
    pub fn with_pr_files(self, repo: &str, pr: u64, files: &[&str]) -> Self {
        self.pr_files.lock().unwrap().insert(
            (repo.to_string(), pr),
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    pub fn push_delivery_page(&self, page: Vec<DeliverySummary>) {
        self.delivery_pages.lock().unwrap().push(page);
    }

    pub fn add_delivery(&self, summary: DeliverySummary, response_payload: &str) {
        self.deliveries.lock().unwrap().insert(
            summary.id,
            Delivery {
                summary,
                request: DeliveryRequest::default(),
                response: DeliveryResponseRecord {
                    payload: Some(response_payload.to_string()),
                },
            },
        );
    }
}

pub fn summary(id: u64, event: &str) -> DeliverySummary {
    DeliverySummary {
        id,
        guid: format!("guid-{id}"),
        delivered_at: Utc::now(),
        redelivery: false,
        status: "OK".to_string(),
        status_code: 200,
        event: event.to_string(),
        action: None,
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn pull_request_files(
        &self,
        token: Option<&str>,
        repo_full_name: &str,
        pr_number: u64,
    ) -> Result<Vec<String>> {
        self.tokens_seen
            .lock()
            .unwrap()
            .push(token.map(str::to_string));
        self.pr_files
            .lock()
            .unwrap()
            .get(&(repo_full_name.to_string(), pr_number))
            .cloned()
            .ok_or_else(|| AppError::GitHubApi(format!("No such PR: {repo_full_name}#{pr_number}")))
    }

    async fn create_webhook(
        &self,
        _token: Option<&str>,
        repo_full_name: &str,
        hook: &CreateWebhook,
    ) -> Result<Hook> {
        let mut created = self.created_hooks.lock().unwrap();
        created.push((repo_full_name.to_string(), hook.clone()));
        Ok(Hook {
            id: created.len() as u64,
            active: true,
            events: hook.events.clone(),
        })
    }

    async fn list_deliveries(
        &self,
        _token: Option<&str>,
        _repo_full_name: &str,
        _hook_id: u64,
    ) -> Result<Vec<DeliverySummary>> {
        let mut pages = self.delivery_pages.lock().unwrap();
        if pages.len() > 1 {
            Ok(pages.remove(0))
        } else {
            Ok(pages.first().cloned().unwrap_or_default())
        }
    }

    async fn get_delivery(
        &self,
        _token: Option<&str>,
        _repo_full_name: &str,
        _hook_id: u64,
        delivery_id: u64,
    ) -> Result<Delivery> {
        self.deliveries
            .lock()
            .unwrap()
            .get(&delivery_id)
            .cloned()
            .ok_or_else(|| AppError::GitHubApi(format!("No such delivery: {delivery_id}")))
    }
}
