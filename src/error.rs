use thiserror::Error;

/// A commit handed to the pipeline without the fields synthesis depends on.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("commit {id} has no commit timestamp")]
    MissingTimestamp { id: String },

    #[error("commit {id} has no message")]
    MissingMessage { id: String },
}

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    #[error("GitHub GraphQL error: {0}")]
    GraphQl(String),

    #[error("GitHub owner '{0}' not found")]
    MissingOwner(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize project record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid project slug '{0}'")]
    InvalidSlug(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
