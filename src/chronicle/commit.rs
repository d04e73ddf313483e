use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single commit on a repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Content hash, unique within one repository.
    pub id: String,
    pub message: String,
    pub committed_at: DateTime<Utc>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
}

impl CommitRecord {
    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Name to credit the commit to, falling back to the email address.
    pub fn author(&self) -> &str {
        self.author_name
            .as_deref()
            .or(self.author_email.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}
