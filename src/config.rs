use std::collections::HashSet;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::filter::FilterGroups;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub forward: ForwardConfig,
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted delivery body. GitHub caps payloads at 25 MB.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct WebhookConfig {
    /// Shared secret GitHub signs deliveries with.
    pub secret: String,
    /// Events subscribed to when registering webhooks.
    #[serde(default = "default_events")]
    pub events: Vec<String>,
}

// Manual Debug impl to avoid leaking the webhook secret
impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &"[REDACTED]")
            .field("events", &self.events)
            .finish()
    }
}

#[derive(Deserialize, Clone, Default)]
pub struct GitHubConfig {
    /// Fallback token for repos without their own.
    pub token: Option<String>,
    /// Override for GitHub Enterprise, e.g. `https://ghe.example.com/api/v3`.
    pub api_url: Option<String>,
    /// Owner used for repos configured by bare name.
    pub owner: Option<String>,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForwardConfig {
    /// Default downstream URL for accepted deliveries.
    pub url: Option<String>,
    #[serde(default = "default_forward_timeout")]
    pub timeout_secs: u64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_forward_timeout(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct RepoConfig {
    /// `repo` or `owner/repo`.
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    /// Token used to read pull request files for this repo.
    pub github_token_ssm_value: Option<String>,
    #[serde(default)]
    pub filter_groups: FilterGroups,
    pub forward_url: Option<String>,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for RepoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoConfig")
            .field("name", &self.name)
            .field("is_private", &self.is_private)
            .field(
                "github_token_ssm_value",
                &self.github_token_ssm_value.as_ref().map(|_| "[REDACTED]"),
            )
            .field("filter_groups", &self.filter_groups)
            .field("forward_url", &self.forward_url)
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_events() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_forward_timeout() -> u64 {
    10
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // Try default paths
            builder = builder.add_source(config::File::with_name("hookfilter").required(false));
        }

        // Environment variable overrides with HOOKFILTER__ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("HOOKFILTER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let config: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express. Filter patterns are compiled
    /// separately when the repo registry is built.
    pub fn validate(&self) -> Result<()> {
        if self.webhook.secret.is_empty() {
            return Err(AppError::Config("webhook.secret must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for repo in &self.repos {
            if repo.name.is_empty() {
                return Err(AppError::Config("Repo names must not be empty".to_string()));
            }
            if !seen.insert(repo.name.as_str()) {
                return Err(AppError::Config(format!(
                    "Repo {} is configured more than once",
                    repo.name
                )));
            }
        }

        Ok(())
    }

    pub fn webhook_secret(&self) -> &str {
        &self.webhook.secret
    }

    /// Token for GitHub calls on behalf of `repo`.
    pub fn token_for<'a>(&'a self, repo: &'a RepoConfig) -> Option<&'a str> {
        repo.github_token_ssm_value
            .as_deref()
            .or(self.github.token.as_deref())
    }

    /// Fully qualified `owner/repo` name for a configured repo.
    pub fn full_name(&self, repo: &RepoConfig) -> Result<String> {
        if repo.name.contains('/') {
            return Ok(repo.name.clone());
        }
        match &self.github.owner {
            Some(owner) => Ok(format!("{owner}/{}", repo.name)),
            None => Err(AppError::Config(format!(
                "Repo {} has no owner; set github.owner or use owner/repo",
                repo.name
            ))),
        }
    }
}

/// Minimal in-memory configuration for unit tests.
#[cfg(test)]
pub(crate) fn test_config(repos: Vec<RepoConfig>) -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        webhook: WebhookConfig {
            secret: "test-secret".to_string(),
            events: default_events(),
        },
        github: GitHubConfig::default(),
        forward: ForwardConfig::default(),
        repos,
    }
}
