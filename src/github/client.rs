use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::types::{GraphQlResponse, Repository, RepositoryData, UserData};
use crate::chronicle::commit::CommitRecord;
use crate::error::GitHubError;

const PAGE_SIZE: usize = 100;

const REPOSITORIES_QUERY: &str = r#"
query($owner: String!, $first: Int!, $after: String) {
  user(login: $owner) {
    repositories(first: $first, after: $after, orderBy: {field: PUSHED_AT, direction: DESC}, isFork: false, privacy: PUBLIC) {
      nodes {
        databaseId
        name
        description
        url
        homepageUrl
        stargazerCount
        primaryLanguage { name }
        repositoryTopics(first: 10) { nodes { topic { name } } }
        pushedAt
        updatedAt
        isArchived
      }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

const HISTORY_QUERY: &str = r#"
query($owner: String!, $repo: String!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $repo) {
    defaultBranchRef {
      target {
        ... on Commit {
          history(first: $first, after: $after) {
            nodes {
              oid
              message
              committedDate
              author { name email }
            }
            pageInfo { hasNextPage endCursor }
          }
        }
      }
    }
  }
}
"#;

pub struct GitHubClient {
    client: Octocrab,
    owner: String,
}

impl GitHubClient {
    pub fn new(token: String, owner: String) -> Result<Self, GitHubError> {
        let client = Octocrab::builder().personal_token(token).build()?;
        Ok(Self { client, owner })
    }

    /// Points the client at a different API root, e.g. GitHub Enterprise or a test server.
    pub fn with_base_uri(token: String, owner: String, base_uri: &str) -> Result<Self, GitHubError> {
        let client = Octocrab::builder()
            .personal_token(token)
            .base_uri(base_uri)?
            .build()?;
        Ok(Self { client, owner })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T, GitHubError> {
        let response: GraphQlResponse<T> = self
            .client
            .graphql(&json!({ "query": query, "variables": variables }))
            .await?;

        if !response.errors.is_empty() {
            let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(GitHubError::GraphQl(messages.join("; ")));
        }

        response
            .data
            .ok_or_else(|| GitHubError::GraphQl("response carried no data".to_string()))
    }

    /// Public, non-fork repositories of the owner, most recently pushed first.
    pub async fn list_repositories(&self) -> Result<Vec<Repository>, GitHubError> {
        let mut repositories = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let data: UserData = self
                .query(
                    REPOSITORIES_QUERY,
                    json!({ "owner": self.owner, "first": PAGE_SIZE, "after": after }),
                )
                .await?;

            let user = data
                .user
                .ok_or_else(|| GitHubError::MissingOwner(self.owner.clone()))?;
            let page = user.repositories;
            repositories.extend(page.nodes.into_iter().map(Repository::from));

            match page.page_info.end_cursor {
                Some(cursor) if page.page_info.has_next_page => after = Some(cursor),
                _ => break,
            }
        }

        tracing::debug!(owner = %self.owner, count = repositories.len(), "listed repositories");
        Ok(repositories)
    }

    /// Commits on the default branch, newest first, up to `max_commits`.
    ///
    /// A repository without a default branch has no history and yields an empty list.
    pub async fn fetch_commits(&self, repo: &str, max_commits: usize) -> Result<Vec<CommitRecord>, GitHubError> {
        let mut commits = Vec::new();
        let mut after: Option<String> = None;

        while commits.len() < max_commits {
            let first = PAGE_SIZE.min(max_commits - commits.len());
            let data: RepositoryData = self
                .query(
                    HISTORY_QUERY,
                    json!({ "owner": self.owner, "repo": repo, "first": first, "after": after }),
                )
                .await?;

            let Some(branch) = data.repository.and_then(|r| r.default_branch_ref) else {
                tracing::warn!(repo, "no default branch found");
                return Ok(Vec::new());
            };

            let page = branch.target.history;
            for node in page.nodes {
                commits.push(CommitRecord::try_from(node)?);
            }

            match page.page_info.end_cursor {
                Some(cursor) if page.page_info.has_next_page => after = Some(cursor),
                _ => break,
            }
        }

        commits.truncate(max_commits);
        Ok(commits)
    }
}
