use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chronicle::{EpisodeRules, SeasonRules};
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub store: StoreConfig,
    pub repos: ReposConfig,
    pub episodes: EpisodesConfig,
    pub seasons: SeasonsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub owner: Option<String>,
    pub max_commits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReposConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodesConfig {
    pub max_gap_days: i64,
    pub max_commits: usize,
    pub min_commits: usize,
    pub release_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonsConfig {
    pub max_gap_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub template: Option<PathBuf>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            owner: None,
            max_commits: 500,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("data/projects"),
        }
    }
}

impl Default for EpisodesConfig {
    fn default() -> Self {
        let rules = EpisodeRules::default();
        EpisodesConfig {
            max_gap_days: rules.max_gap.num_days(),
            max_commits: rules.max_commits,
            min_commits: rules.min_commits,
            release_keywords: rules.release_keywords,
        }
    }
}

impl Default for SeasonsConfig {
    fn default() -> Self {
        SeasonsConfig {
            max_gap_days: SeasonRules::default().max_gap.num_days(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: "markdown".to_string(),
            template: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn episode_rules(&self) -> EpisodeRules {
        EpisodeRules {
            max_gap: Duration::days(self.episodes.max_gap_days),
            max_commits: self.episodes.max_commits,
            min_commits: self.episodes.min_commits,
            release_keywords: self.episodes.release_keywords.clone(),
        }
    }

    pub fn season_rules(&self) -> SeasonRules {
        SeasonRules {
            max_gap: Duration::days(self.seasons.max_gap_days),
        }
    }

    /// Applies the include/exclude lists; an empty include list admits everything.
    pub fn wants_repo(&self, name: &str) -> bool {
        let included = self.repos.include.is_empty() || self.repos.include.iter().any(|r| r == name);
        included && !self.repos.exclude.iter().any(|r| r == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.episode_rules(), EpisodeRules::default());
        assert_eq!(config.season_rules(), SeasonRules::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_toml(
            r#"
            [github]
            owner = "octocat"

            [episodes]
            max_commits = 10

            [seasons]
            max_gap_days = 60

            [repos]
            exclude = ["dotfiles"]
            "#,
        )
        .unwrap();

        assert_eq!(config.github.owner.as_deref(), Some("octocat"));
        assert_eq!(config.github.max_commits, 500);
        let rules = config.episode_rules();
        assert_eq!(rules.max_commits, 10);
        assert_eq!(rules.min_commits, 3);
        assert_eq!(rules.max_gap, Duration::days(7));
        assert_eq!(config.season_rules().max_gap, Duration::days(60));
        assert!(config.wants_repo("lumo"));
        assert!(!config.wants_repo("dotfiles"));
    }

    #[test]
    fn include_list_restricts_repos() {
        let config = Config::from_toml("[repos]\ninclude = [\"lumo\"]\n").unwrap();

        assert!(config.wants_repo("lumo"));
        assert!(!config.wants_repo("vector"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml("[episodes]\nmax_commits = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
