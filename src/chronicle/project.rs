use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::season_builder::Season;
use crate::github::types::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    Paused,
    Archived,
}

impl ProjectStatus {
    /// Archived repositories stay archived; otherwise status decays with time since the last update.
    pub fn determine(is_archived: bool, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if is_archived {
            return ProjectStatus::Archived;
        }

        let days_since_update = now.signed_duration_since(updated_at).num_days();
        if days_since_update < 30 {
            ProjectStatus::Active
        } else if days_since_update < 180 {
            ProjectStatus::Paused
        } else {
            ProjectStatus::Archived
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "Active"),
            ProjectStatus::Paused => write!(f, "Paused"),
            ProjectStatus::Archived => write!(f, "Archived"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectCategory {
    Frontend,
    Backend,
    Systems,
    Mobile,
    #[serde(rename = "Data Science")]
    DataScience,
    Other,
}

impl ProjectCategory {
    pub fn categorize(topics: &[String], language: Option<&str>) -> Self {
        let topics: Vec<String> = topics.iter().map(|t| t.to_lowercase()).collect();
        let language = language.unwrap_or("").to_lowercase();
        let has_topic = |wanted: &[&str]| topics.iter().any(|t| wanted.contains(&t.as_str()));
        let is_language = |wanted: &[&str]| wanted.contains(&language.as_str());

        if has_topic(&["react", "vue", "angular", "frontend", "ui"])
            || is_language(&["typescript", "javascript"])
        {
            ProjectCategory::Frontend
        } else if has_topic(&["backend", "api", "server", "node"])
            || is_language(&["go", "python", "java", "ruby", "php"])
        {
            ProjectCategory::Backend
        } else if has_topic(&["systems", "low-level", "performance"])
            || is_language(&["rust", "c++", "c"])
        {
            ProjectCategory::Systems
        } else if has_topic(&["mobile", "ios", "android"])
            || is_language(&["swift", "kotlin", "dart"])
        {
            ProjectCategory::Mobile
        } else if has_topic(&["ml", "ai", "data", "machine-learning"]) {
            ProjectCategory::DataScience
        } else {
            ProjectCategory::Other
        }
    }
}

impl fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectCategory::Frontend => write!(f, "Frontend"),
            ProjectCategory::Backend => write!(f, "Backend"),
            ProjectCategory::Systems => write!(f, "Systems"),
            ProjectCategory::Mobile => write!(f, "Mobile"),
            ProjectCategory::DataScience => write!(f, "Data Science"),
            ProjectCategory::Other => write!(f, "Other"),
        }
    }
}

/// URL-friendly identifier: lower-case, non-alphanumeric runs collapsed to `-`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }

    out
}

/// Everything persisted for one repository: metadata plus its season hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub github_id: u64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub html_url: String,
    pub homepage: Option<String>,
    pub stargazers_count: u64,
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub status: ProjectStatus,
    pub category: ProjectCategory,
    pub updated_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
    pub seasons: Vec<Season>,
}

impl ProjectRecord {
    pub fn from_repository(repo: &Repository, seasons: Vec<Season>, now: DateTime<Utc>) -> Self {
        let updated_at = repo.last_activity();

        Self {
            github_id: repo.database_id,
            name: repo.name.clone(),
            slug: slug(&repo.name),
            description: repo.description.clone(),
            html_url: repo.url.clone(),
            homepage: repo.homepage_url.clone().filter(|h| !h.trim().is_empty()),
            stargazers_count: repo.stargazer_count,
            language: repo.primary_language.clone(),
            topics: repo.topics.clone(),
            status: ProjectStatus::determine(repo.is_archived, updated_at, now),
            category: ProjectCategory::categorize(&repo.topics, repo.primary_language.as_deref()),
            updated_at,
            last_synced_at: now,
            seasons,
        }
    }

    pub fn commit_count(&self) -> usize {
        self.seasons.iter().map(Season::commit_count).sum()
    }
}
