use chrono::{Datelike, Duration};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::episode_builder::Episode;
use super::gap_exceeds;
use super::version::{find_version, is_major_jump, VersionMatch};

const DEFAULT_TITLES: [&str; 5] = [
    "The Foundation",
    "Growth Phase",
    "Maturity Stage",
    "Evolution Era",
    "Advanced Development",
];

// Checked in order; the first pattern any commit matches names the season.
static MILESTONE_TITLES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)v3|3\.0|version 3").expect("v3 milestone regex"),
            "Evolution Era",
        ),
        (
            Regex::new(r"(?i)v2|2\.0|version 2").expect("v2 milestone regex"),
            "Growth Phase",
        ),
        (
            Regex::new(r"(?i)refactor|rewrite|migration").expect("refactor milestone regex"),
            "Refinement Stage",
        ),
    ]
});

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonRules {
    pub max_gap: Duration,
}

impl Default for SeasonRules {
    fn default() -> Self {
        Self {
            max_gap: Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub number: u32,
    pub title: String,
    pub episodes: Vec<Episode>,
}

impl Season {
    pub fn commit_count(&self) -> usize {
        self.episodes.iter().map(Episode::commit_count).sum()
    }
}

/// Groups consecutive episodes into seasons on long pauses and major-version jumps.
#[derive(Debug, Clone, Default)]
pub struct SeasonBuilder {
    rules: SeasonRules,
}

impl SeasonBuilder {
    pub fn new(rules: SeasonRules) -> Self {
        Self { rules }
    }

    /// `episodes` must already be in chronological order.
    pub fn build(&self, episodes: &[Episode]) -> Vec<Season> {
        let mut seasons: Vec<Season> = Vec::new();
        let mut current: Vec<Episode> = Vec::new();
        let mut iter = episodes.iter().peekable();

        while let Some(episode) = iter.next() {
            current.push(episode.clone());

            let closes = match iter.peek() {
                None => true,
                Some(next) => {
                    gap_exceeds(episode.end_date, next.start_date, self.rules.max_gap)
                        || is_major_jump(&episode_version(episode), &episode_version(next))
                }
            };

            if closes {
                let number = seasons.len() as u32 + 1;
                let episodes = std::mem::take(&mut current);
                seasons.push(Season {
                    number,
                    title: season_title(&episodes, number),
                    episodes,
                });
            }
        }

        seasons
    }
}

/// The first `major.minor` version mentioned by any of the episode's commits.
pub fn episode_version(episode: &Episode) -> VersionMatch {
    episode
        .commits
        .iter()
        .map(|c| find_version(&c.message))
        .find(|m| matches!(m, VersionMatch::Found(_)))
        .unwrap_or(VersionMatch::NotFound)
}

fn season_title(episodes: &[Episode], number: u32) -> String {
    if number == 1 {
        return DEFAULT_TITLES[0].to_string();
    }

    let messages: Vec<&str> = episodes
        .iter()
        .flat_map(|e| e.commits.iter().map(|c| c.message.as_str()))
        .collect();

    for (re, title) in MILESTONE_TITLES.iter() {
        if messages.iter().any(|m| re.is_match(m)) {
            return title.to_string();
        }
    }

    if let Some(title) = DEFAULT_TITLES.get(number as usize - 1) {
        return title.to_string();
    }

    match episodes.first() {
        Some(first) => format!("Season {} ({})", number, first.start_date.year()),
        None => format!("Season {}", number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chronicle::commit::CommitRecord;
    use crate::chronicle::episode_builder::EpisodeBuilder;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap()
    }

    /// An episode of three commits one hour apart, starting `day` days after base.
    fn episode(day: i64, messages: [&str; 3]) -> Episode {
        let start = base() + Duration::days(day);
        let commits: Vec<CommitRecord> = messages
            .iter()
            .enumerate()
            .map(|(i, m)| CommitRecord {
                id: format!("{}-{}", day, i),
                message: m.to_string(),
                committed_at: start + Duration::hours(i as i64),
                author_name: None,
                author_email: None,
            })
            .collect();

        EpisodeBuilder::default().build(&commits).remove(0)
    }

    fn plain(day: i64) -> Episode {
        episode(day, ["alpha", "beta", "gamma"])
    }

    fn titles(seasons: &[Season]) -> Vec<&str> {
        seasons.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn empty_input_yields_no_seasons() {
        assert!(SeasonBuilder::default().build(&[]).is_empty());
    }

    #[test]
    fn long_gap_starts_a_new_season() {
        let seasons = SeasonBuilder::default().build(&[plain(0), plain(10), plain(55)]);

        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[0].number, 1);
        assert_eq!(seasons[0].title, "The Foundation");
        assert_eq!(seasons[0].episodes.len(), 2);
        assert_eq!(seasons[1].number, 2);
        assert_eq!(seasons[1].title, "Growth Phase");
    }

    #[test]
    fn major_version_jump_starts_a_new_season() {
        let seasons = SeasonBuilder::default().build(&[
            episode(0, ["alpha", "ship v2.0", "beta"]),
            episode(5, ["gamma", "prepare v3.1", "delta"]),
        ]);

        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[1].title, "Evolution Era");
    }

    #[test]
    fn minor_version_change_does_not_split() {
        let seasons = SeasonBuilder::default().build(&[
            episode(0, ["alpha", "ship 2.0", "beta"]),
            episode(5, ["gamma", "ship 2.4", "delta"]),
        ]);

        assert_eq!(seasons.len(), 1);
    }

    #[test]
    fn first_version_mention_wins_per_episode() {
        let ep = episode(0, ["alpha", "from 4.1 to 1.0", "then 9.9"]);
        assert_eq!(episode_version(&ep).version().map(|v| v.literal.as_str()), Some("4.1"));
        assert_eq!(episode_version(&plain(0)), VersionMatch::NotFound);
    }

    #[test]
    fn milestone_titles_take_priority_over_ordinals() {
        let seasons = SeasonBuilder::default().build(&[
            plain(0),
            episode(40, ["alpha", "big rewrite", "beta"]),
            episode(80, ["alpha", "Version 2 landing", "beta"]),
        ]);

        assert_eq!(
            titles(&seasons),
            vec!["The Foundation", "Refinement Stage", "Growth Phase"]
        );
    }

    #[test]
    fn first_season_is_always_the_foundation() {
        let seasons = SeasonBuilder::default().build(&[episode(0, ["v3 rewrite", "alpha", "beta"])]);
        assert_eq!(titles(&seasons), vec!["The Foundation"]);
    }

    #[test]
    fn ordinal_titles_then_year_labels() {
        let episodes: Vec<Episode> = (0..7).map(|i| plain(i * 60)).collect();

        let seasons = SeasonBuilder::default().build(&episodes);

        assert_eq!(
            titles(&seasons),
            vec![
                "The Foundation",
                "Growth Phase",
                "Maturity Stage",
                "Evolution Era",
                "Advanced Development",
                "Season 6 (2024)",
                "Season 7 (2024)",
            ]
        );
        let numbers: Vec<u32> = seasons.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn seasons_cover_every_episode_in_order() {
        let episodes: Vec<Episode> = [0, 3, 50, 52, 54, 200]
            .iter()
            .map(|&d| plain(d))
            .collect();

        let seasons = SeasonBuilder::default().build(&episodes);

        let flattened: Vec<Episode> = seasons.iter().flat_map(|s| s.episodes.clone()).collect();
        assert_eq!(flattened, episodes);
        assert_eq!(seasons.len(), 3);
        assert_eq!(seasons[1].commit_count(), 9);
        assert_eq!(SeasonBuilder::default().build(&episodes), seasons);
    }

    #[test]
    fn overridden_gap_is_honoured() {
        let rules = SeasonRules {
            max_gap: Duration::days(5),
        };
        let seasons = SeasonBuilder::new(rules).build(&[plain(0), plain(10)]);
        assert_eq!(seasons.len(), 2);
    }
}
