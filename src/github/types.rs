use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chronicle::commit::CommitRecord;
use crate::error::RecordError;

/// A public, non-fork repository owned by the configured user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub database_id: u64,
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub homepage_url: Option<String>,
    pub stargazer_count: u64,
    pub primary_language: Option<String>,
    pub topics: Vec<String>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub is_archived: bool,
}

impl Repository {
    /// Last push if known, otherwise last metadata update.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.pushed_at.unwrap_or(self.updated_at)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Connection<T> {
    pub nodes: Vec<T>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserData {
    pub user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserNode {
    pub repositories: Connection<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NameNode {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicNode {
    pub topic: NameNode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicConnection {
    pub nodes: Vec<TopicNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepositoryNode {
    pub database_id: u64,
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub homepage_url: Option<String>,
    pub stargazer_count: u64,
    pub primary_language: Option<NameNode>,
    pub repository_topics: TopicConnection,
    pub pushed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub is_archived: bool,
}

impl From<RepositoryNode> for Repository {
    fn from(node: RepositoryNode) -> Self {
        Repository {
            database_id: node.database_id,
            name: node.name,
            description: node.description,
            url: node.url,
            homepage_url: node.homepage_url,
            stargazer_count: node.stargazer_count,
            primary_language: node.primary_language.map(|l| l.name),
            topics: node
                .repository_topics
                .nodes
                .into_iter()
                .map(|t| t.topic.name)
                .collect(),
            pushed_at: node.pushed_at,
            updated_at: node.updated_at,
            is_archived: node.is_archived,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryData {
    pub repository: Option<HistoryRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryRepository {
    pub default_branch_ref: Option<BranchRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchRef {
    pub target: HistoryTarget,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryTarget {
    pub history: Connection<CommitNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitAuthorNode {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommitNode {
    pub oid: String,
    pub message: Option<String>,
    pub committed_date: Option<DateTime<Utc>>,
    pub author: Option<CommitAuthorNode>,
}

impl TryFrom<CommitNode> for CommitRecord {
    type Error = RecordError;

    fn try_from(node: CommitNode) -> Result<Self, Self::Error> {
        let committed_at = node
            .committed_date
            .ok_or_else(|| RecordError::MissingTimestamp { id: node.oid.clone() })?;
        let message = node
            .message
            .ok_or_else(|| RecordError::MissingMessage { id: node.oid.clone() })?;
        let (author_name, author_email) = match node.author {
            Some(author) => (author.name, author.email),
            None => (None, None),
        };

        Ok(CommitRecord {
            id: node.oid,
            message,
            committed_at,
            author_name,
            author_email,
        })
    }
}
