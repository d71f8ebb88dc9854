pub mod github;
pub mod types;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// GitHub REST operations used by the filter endpoint and its tooling.
///
/// Every call takes the token to authenticate with; `None` issues an
/// anonymous request, which is enough for public repositories.
#[async_trait]
pub trait Platform: Send + Sync {
    /// List the paths of all files changed by a pull request.
    async fn pull_request_files(
        &self,
        token: Option<&str>,
        repo_full_name: &str,
        pr_number: u64,
    ) -> Result<Vec<String>>;

    /// Create a repository webhook pointing at the filter endpoint.
    async fn create_webhook(
        &self,
        token: Option<&str>,
        repo_full_name: &str,
        hook: &CreateWebhook,
    ) -> Result<Hook>;

    /// List recent deliveries of a repository webhook.
    async fn list_deliveries(
        &self,
        token: Option<&str>,
        repo_full_name: &str,
        hook_id: u64,
    ) -> Result<Vec<DeliverySummary>>;

    /// Fetch a single delivery, including the response GitHub recorded.
    async fn get_delivery(
        &self,
        token: Option<&str>,
        repo_full_name: &str,
        hook_id: u64,
        delivery_id: u64,
    ) -> Result<Delivery>;
}
