use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository webhook as returned by GitHub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hook {
    pub id: u64,
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CreateWebhook {
    pub url: String,
    pub secret: String,
    pub events: Vec<String>,
}

/// One entry of a webhook's delivery log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySummary {
    pub id: u64,
    pub guid: String,
    pub delivered_at: DateTime<Utc>,
    #[serde(default)]
    pub redelivery: bool,
    pub status: String,
    pub status_code: u16,
    pub event: String,
    pub action: Option<String>,
}

/// A delivery with the request GitHub sent and the response it recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    #[serde(flatten)]
    pub summary: DeliverySummary,
    #[serde(default)]
    pub request: DeliveryRequest,
    #[serde(default)]
    pub response: DeliveryResponseRecord,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryResponseRecord {
    /// Raw response body, as the endpoint returned it.
    pub payload: Option<String>,
}

/// Changed file entry of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    pub status: String,
    pub previous_filename: Option<String>,
}
