use crate::config::{AppConfig, RepoConfig};
use crate::error::{AppError, Result};
use crate::filter::{ConditionType, FilterSet};
use crate::webhook::events::RepositoryPayload;

/// A configured repository with its filter groups compiled.
#[derive(Debug, Clone)]
pub struct RepoEntry {
    pub config: RepoConfig,
    pub filters: FilterSet,
}

/// Lookup from delivery payload repository to its compiled filters.
#[derive(Debug, Clone, Default)]
pub struct RepoRegistry {
    entries: Vec<RepoEntry>,
}

impl RepoRegistry {
    pub fn build(config: &AppConfig) -> Result<Self> {
        let mut entries = Vec::with_capacity(config.repos.len());

        for repo in &config.repos {
            let filters = FilterSet::compile(&repo.filter_groups).map_err(|e| match e {
                AppError::Config(msg) => AppError::Config(format!("Repo {}: {msg}", repo.name)),
                other => other,
            })?;

            // Private repo files can only be listed with credentials
            if repo.is_private
                && filters.uses(ConditionType::FilePath)
                && config.token_for(repo).is_none()
            {
                return Err(AppError::Config(format!(
                    "Repo {} is private and filters on file_path but has no GitHub token",
                    repo.name
                )));
            }

            tracing::debug!(
                repo = %repo.name,
                groups = filters.group_count(),
                "Compiled filter groups"
            );

            entries.push(RepoEntry {
                config: repo.clone(),
                filters,
            });
        }

        Ok(Self { entries })
    }

    /// Find the entry configured for the delivery's repository, by full name
    /// first and bare name second.
    pub fn lookup(&self, repository: &RepositoryPayload) -> Option<&RepoEntry> {
        self.entries
            .iter()
            .find(|e| e.config.name == repository.full_name)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.config.name == repository.name)
            })
    }

    pub fn get(&self, name: &str) -> Option<&RepoEntry> {
        self.entries.iter().find(|e| e.config.name == name)
    }

    pub fn entries(&self) -> &[RepoEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
