use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::project::{slug, ProjectRecord};
use super::Chronicler;
use crate::github::client::GitHubClient;
use crate::github::types::Repository;
use crate::store::SeasonStore;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub max_commits: usize,
    /// Drop stored projects whose repository is no longer listed.
    pub prune: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_commits: 500,
            prune: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub total: usize,
    pub synced: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub pruned: Vec<String>,
}

/// Fetches repositories, chronicles their commits and replaces each stored project.
pub struct ChronicleSync<S: SeasonStore> {
    client: GitHubClient,
    store: S,
    chronicler: Chronicler,
    config: SyncConfig,
}

impl<S: SeasonStore> ChronicleSync<S> {
    pub fn new(client: GitHubClient, store: S, chronicler: Chronicler, config: SyncConfig) -> Self {
        Self {
            client,
            store,
            chronicler,
            config,
        }
    }

    /// Syncs every listed repository accepted by `wanted`.
    ///
    /// A failing repository is recorded in the report and does not stop the others.
    pub async fn sync_all<F>(&self, wanted: F) -> Result<SyncReport>
    where
        F: Fn(&str) -> bool,
    {
        tracing::info!(owner = %self.client.owner(), "starting GitHub sync");

        let repos = self
            .client
            .list_repositories()
            .await
            .context("failed to list repositories")?;
        let listed: HashSet<String> = repos.iter().map(|r| slug(&r.name)).collect();
        let selected: Vec<&Repository> = repos.iter().filter(|r| wanted(r.name.as_str())).collect();

        tracing::info!(found = repos.len(), selected = selected.len(), "fetched repositories");

        let mut report = SyncReport {
            total: selected.len(),
            ..SyncReport::default()
        };

        for repo in selected {
            match self.sync_repository(repo, Utc::now()).await {
                Ok(project) => {
                    tracing::info!(
                        repo = %repo.name,
                        seasons = project.seasons.len(),
                        commits = project.commit_count(),
                        "synced"
                    );
                    report.synced.push(repo.name.clone());
                }
                Err(e) => {
                    tracing::error!(repo = %repo.name, error = %format!("{:#}", e), "failed to sync");
                    report.failed.push((repo.name.clone(), format!("{:#}", e)));
                }
            }
        }

        if self.config.prune {
            for stale in self.store.slugs()? {
                if !listed.contains(&stale) {
                    self.store.remove(&stale)?;
                    tracing::info!(slug = %stale, "removed project no longer listed");
                    report.pruned.push(stale);
                }
            }
        }

        tracing::info!(
            synced = report.synced.len(),
            failed = report.failed.len(),
            total = report.total,
            "sync complete"
        );
        Ok(report)
    }

    pub async fn sync_repository(&self, repo: &Repository, now: DateTime<Utc>) -> Result<ProjectRecord> {
        let commits = self
            .client
            .fetch_commits(&repo.name, self.config.max_commits)
            .await
            .with_context(|| format!("failed to fetch commits for {}", repo.name))?;

        if commits.is_empty() {
            tracing::warn!(repo = %repo.name, "no commits found");
        }

        let seasons = self.chronicler.chronicle(&commits);
        tracing::debug!(
            repo = %repo.name,
            commits = commits.len(),
            episodes = seasons.iter().map(|s| s.episodes.len()).sum::<usize>(),
            seasons = seasons.len(),
            "built chronicle"
        );

        let project = ProjectRecord::from_repository(repo, seasons, now);
        self.store
            .replace(&project)
            .with_context(|| format!("failed to store {}", project.slug))?;

        Ok(project)
    }
}
