use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use super::commit::CommitRecord;
use super::gap_exceeds;
use super::version::is_version_bump;

const FALLBACK_TITLE: &str = "Development Progress";

/// Thresholds that decide where one episode ends and the next begins.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRules {
    pub max_gap: Duration,
    pub max_commits: usize,
    pub min_commits: usize,
    pub release_keywords: Vec<String>,
}

impl Default for EpisodeRules {
    fn default() -> Self {
        Self {
            max_gap: Duration::days(7),
            max_commits: 20,
            min_commits: 3,
            release_keywords: ["release", "version", "bump", "tag"]
                .iter()
                .map(|kw| kw.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub date_range_label: String,
    pub commits: Vec<CommitRecord>,
}

impl Episode {
    /// Builds an episode from a non-empty, chronologically ordered group.
    fn from_commits(commits: Vec<CommitRecord>) -> Option<Self> {
        let start_date = commits.first()?.committed_at;
        let end_date = commits.last()?.committed_at;

        Some(Self {
            title: synthesize_title(&commits),
            description: summarize_commits(&commits),
            start_date,
            end_date,
            date_range_label: date_range_label(start_date, end_date),
            commits,
        })
    }

    /// Appends a trailing short group. Title and description are left as they were.
    fn absorb(&mut self, tail: Vec<CommitRecord>) {
        if let Some(last) = tail.last() {
            self.end_date = last.committed_at;
        }
        self.commits.extend(tail);
        self.date_range_label = date_range_label(self.start_date, self.end_date);
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }
}

/// Keyword families voted on to title an episode, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EpisodeCategory {
    Feature,
    Refactor,
    Fix,
    Docs,
    Test,
    Style,
}

impl EpisodeCategory {
    pub const ALL: [EpisodeCategory; 6] = [
        EpisodeCategory::Feature,
        EpisodeCategory::Refactor,
        EpisodeCategory::Fix,
        EpisodeCategory::Docs,
        EpisodeCategory::Test,
        EpisodeCategory::Style,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            EpisodeCategory::Feature => &["feat", "feature", "add", "implement"],
            EpisodeCategory::Refactor => &["refactor", "optimize", "improve"],
            EpisodeCategory::Fix => &["fix", "bug", "patch"],
            EpisodeCategory::Docs => &["doc", "docs", "documentation"],
            EpisodeCategory::Test => &["test", "testing"],
            EpisodeCategory::Style => &["style", "ui", "ux", "design"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EpisodeCategory::Feature => "New Features & Additions",
            EpisodeCategory::Refactor => "Refactoring & Optimization",
            EpisodeCategory::Fix => "Bug Fixes & Improvements",
            EpisodeCategory::Docs => "Documentation Updates",
            EpisodeCategory::Test => "Testing & Quality Assurance",
            EpisodeCategory::Style => "UI/UX Enhancements",
        }
    }
}

impl fmt::Display for EpisodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// Word-start prefix match: `\b(fix|bug|patch)\w*` counts "fixes" and "bugfix" once each.
// Word characters are ASCII only, so "éfix" starts a word at "fix".
static CATEGORY_PATTERNS: LazyLock<Vec<(EpisodeCategory, Regex)>> = LazyLock::new(|| {
    EpisodeCategory::ALL
        .iter()
        .map(|&category| {
            let pattern = format!(r"(?-u:\b)({})(?-u:\w)*", category.keywords().join("|"));
            let re = Regex::new(&pattern).expect("episode category regex");
            (category, re)
        })
        .collect()
});

const THEMES: [(&[&str], &str); 5] = [
    (&["api", "endpoint"], "API development"),
    (&["ui", "component"], "UI components"),
    (&["database", "schema"], "database work"),
    (&["test"], "testing"),
    (&["deploy", "build"], "deployment"),
];

/// Partitions a repository's commits into episodes.
#[derive(Debug, Clone, Default)]
pub struct EpisodeBuilder {
    rules: EpisodeRules,
}

impl EpisodeBuilder {
    pub fn new(rules: EpisodeRules) -> Self {
        Self { rules }
    }

    /// Groups `commits` into chronologically ordered episodes.
    ///
    /// Every input commit lands in exactly one episode. A short trailing group
    /// is folded into the previous episode; if there is none it becomes the
    /// only episode regardless of size.
    pub fn build(&self, commits: &[CommitRecord]) -> Vec<Episode> {
        let mut sorted = commits.to_vec();
        sorted.sort_by_key(|c| c.committed_at);

        let mut episodes: Vec<Episode> = Vec::new();
        let mut current: Vec<CommitRecord> = Vec::new();
        let mut iter = sorted.into_iter().peekable();

        while let Some(commit) = iter.next() {
            current.push(commit);

            if self.closes_group(&current, iter.peek()) && current.len() >= self.rules.min_commits {
                episodes.extend(Episode::from_commits(std::mem::take(&mut current)));
            }
        }

        if !current.is_empty() {
            match episodes.last_mut() {
                Some(last) => last.absorb(current),
                None => episodes.extend(Episode::from_commits(current)),
            }
        }

        episodes
    }

    fn closes_group(&self, group: &[CommitRecord], next: Option<&CommitRecord>) -> bool {
        let (Some(current), Some(next)) = (group.last(), next) else {
            return true;
        };

        gap_exceeds(current.committed_at, next.committed_at, self.rules.max_gap)
            || group.len() >= self.rules.max_commits
            || is_version_bump(&current.message, &next.message, &self.rules.release_keywords[..])
    }
}

/// The keyword family with the most hits, first-declared on ties. `None` when nothing matched.
pub fn dominant_category(commits: &[CommitRecord]) -> Option<EpisodeCategory> {
    let all_text = commits
        .iter()
        .map(|c| c.message.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let mut best: Option<(EpisodeCategory, usize)> = None;
    for (category, re) in CATEGORY_PATTERNS.iter() {
        let count = re.find_iter(&all_text).count();
        if count > 0 && best.map_or(true, |(_, top)| count > top) {
            best = Some((*category, count));
        }
    }

    best.map(|(category, _)| category)
}

fn synthesize_title(commits: &[CommitRecord]) -> String {
    dominant_category(commits)
        .map(EpisodeCategory::label)
        .unwrap_or(FALLBACK_TITLE)
        .to_string()
}

fn summarize_commits(commits: &[CommitRecord]) -> String {
    let mut seen = HashSet::new();
    let unique: Vec<&str> = commits
        .iter()
        .map(CommitRecord::first_line)
        .filter(|line| seen.insert(*line))
        .collect();

    if unique.len() <= 3 {
        return format!("{}.", unique.join(". "));
    }

    let all_text = unique.join(" ").to_lowercase();
    let themes: Vec<&str> = THEMES
        .iter()
        .filter(|(needles, _)| needles.iter().any(|n| all_text.contains(n)))
        .map(|(_, theme)| *theme)
        .collect();

    if themes.is_empty() {
        format!(
            "{} commits advancing the project with various improvements and features.",
            commits.len()
        )
    } else {
        format!("Focused on {} with {} commits.", themes.join(", "), commits.len())
    }
}

/// `"Mar 2024"` for a single month, `"Jan - Feb 2024"` otherwise. The year is the start's.
pub fn date_range_label(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let start_month = start.format("%b").to_string();
    let end_month = end.format("%b").to_string();
    let year = start.format("%Y");

    if start_month == end_month {
        format!("{} {}", start_month, year)
    } else {
        format!("{} - {} {}", start_month, end_month, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn commit(id: usize, at: DateTime<Utc>, message: &str) -> CommitRecord {
        CommitRecord {
            id: format!("{:040x}", id),
            message: message.to_string(),
            committed_at: at,
            author_name: Some("dev".to_string()),
            author_email: None,
        }
    }

    /// Commits one hour apart with the given messages.
    fn hourly(messages: &[&str]) -> Vec<CommitRecord> {
        messages
            .iter()
            .enumerate()
            .map(|(i, m)| commit(i, base() + Duration::hours(i as i64), m))
            .collect()
    }

    /// A mixed history with gaps, release commits and distinct timestamps.
    fn varied_history() -> Vec<CommitRecord> {
        let messages = [
            "feat: add api endpoint",
            "fix: bug in ui",
            "docs: update readme",
            "refactor schema layer",
            "chore: release 1.2",
            "style: polish header",
            "test: cover parser",
        ];
        let mut at = base();
        (0..45)
            .map(|i| {
                at = at
                    + if i % 9 == 0 {
                        Duration::days(10)
                    } else {
                        Duration::hours(5)
                    };
                commit(i, at, messages[i % messages.len()])
            })
            .collect()
    }

    fn ids(episodes: &[Episode]) -> Vec<String> {
        episodes
            .iter()
            .flat_map(|e| e.commits.iter().map(|c| c.id.clone()))
            .collect()
    }

    #[test]
    fn empty_input_yields_no_episodes() {
        assert!(EpisodeBuilder::default().build(&[]).is_empty());
    }

    #[test]
    fn size_cap_splits_twenty_five_commits() {
        let commits: Vec<_> = (0..25)
            .map(|i| commit(i, base() + Duration::hours(i as i64 * 9), "work on item"))
            .collect();

        let episodes = EpisodeBuilder::default().build(&commits);

        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].commit_count(), 20);
        assert_eq!(episodes[1].commit_count(), 5);
    }

    #[test]
    fn two_commit_repository_still_gets_an_episode() {
        let commits = hourly(&["initial commit", "wire things up"]);

        let episodes = EpisodeBuilder::default().build(&commits);

        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].commit_count(), 2);
    }

    #[test]
    fn fix_messages_title_as_bug_fixes() {
        let episodes = EpisodeBuilder::default().build(&hourly(&["fix: bug A", "fix: bug B", "fix: bug C"]));

        assert_eq!(episodes[0].title, "Bug Fixes & Improvements");
    }

    #[test]
    fn title_ties_go_to_first_declared_family() {
        let commits = hourly(&["add docs", "more words", "and more"]);
        assert_eq!(dominant_category(&commits), Some(EpisodeCategory::Feature));
    }

    #[test]
    fn word_boundaries_are_ascii() {
        let commits = hourly(&["éfix one", "éfix two", "résumé"]);
        assert_eq!(dominant_category(&commits), Some(EpisodeCategory::Fix));
    }

    #[test]
    fn title_falls_back_when_nothing_matches() {
        let episodes = EpisodeBuilder::default().build(&hourly(&["alpha", "beta", "gamma"]));
        assert_eq!(episodes[0].title, "Development Progress");
    }

    #[test]
    fn short_trailing_group_merges_into_previous_episode() {
        let mut commits = hourly(&["fix: bug A", "fix: bug B", "fix: bug C"]);
        let later = base() + Duration::days(20);
        commits.push(commit(10, later, "docs: readme"));
        commits.push(commit(11, later + Duration::hours(1), "docs: guide"));

        let episodes = EpisodeBuilder::default().build(&commits);

        assert_eq!(episodes.len(), 1);
        let episode = &episodes[0];
        assert_eq!(episode.commit_count(), 5);
        assert_eq!(episode.end_date, later + Duration::hours(1));
        assert_eq!(episode.date_range_label, "Mar 2024");
        // Synthesis is not re-run after the merge.
        assert_eq!(episode.title, "Bug Fixes & Improvements");
        assert_eq!(episode.description, "fix: bug A. fix: bug B. fix: bug C.");
    }

    #[test]
    fn short_group_keeps_accumulating_across_a_gap() {
        let mut commits = hourly(&["alpha", "beta"]);
        let later = base() + Duration::days(12);
        for i in 0..3 {
            commits.push(commit(20 + i, later + Duration::hours(i as i64), "gamma"));
        }

        let episodes = EpisodeBuilder::default().build(&commits);

        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].commit_count(), 5);
        assert_eq!(episodes[0].start_date, base());
    }

    #[test]
    fn gap_over_seven_days_closes_episode() {
        let mut commits = hourly(&["alpha", "beta", "gamma"]);
        let later = base() + Duration::hours(2) + Duration::days(7) + Duration::seconds(1);
        for i in 0..3 {
            commits.push(commit(30 + i, later + Duration::hours(i as i64), "delta"));
        }

        let episodes = EpisodeBuilder::default().build(&commits);

        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].commit_count(), 3);
    }

    #[test]
    fn gap_of_exactly_seven_days_does_not_close() {
        let mut commits = hourly(&["alpha", "beta", "gamma"]);
        let later = base() + Duration::hours(2) + Duration::days(7);
        for i in 0..3 {
            commits.push(commit(30 + i, later + Duration::hours(i as i64), "delta"));
        }

        let episodes = EpisodeBuilder::default().build(&commits);

        assert_eq!(episodes.len(), 1);
    }

    #[test]
    fn release_keyword_in_next_message_closes_episode() {
        let commits = hourly(&["init", "add a", "add b", "release v1.0", "more", "again"]);

        let episodes = EpisodeBuilder::default().build(&commits);

        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[1].commits[0].message, "release v1.0");
    }

    #[test]
    fn overridden_rules_are_honoured() {
        let rules = EpisodeRules {
            max_commits: 2,
            min_commits: 1,
            ..EpisodeRules::default()
        };
        let commits = hourly(&["alpha", "beta", "gamma", "delta", "epsilon"]);

        let episodes = EpisodeBuilder::new(rules).build(&commits);

        let sizes: Vec<_> = episodes.iter().map(Episode::commit_count).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn input_is_sorted_stably() {
        let at = base();
        let commits = vec![
            commit(3, at + Duration::hours(1), "later"),
            commit(1, at, "same second one"),
            commit(2, at, "same second two"),
        ];

        let episodes = EpisodeBuilder::default().build(&commits);

        let messages: Vec<_> = episodes[0].commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["same second one", "same second two", "later"]);
        assert_eq!(commits[0].message, "later");
    }

    #[test]
    fn every_commit_is_covered_exactly_once() {
        let commits = varied_history();

        let episodes = EpisodeBuilder::default().build(&commits);

        let mut seen = ids(&episodes);
        let mut expected: Vec<_> = commits.iter().map(|c| c.id.clone()).collect();
        seen.sort();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn episodes_meet_minimum_and_do_not_overlap() {
        let episodes = EpisodeBuilder::default().build(&varied_history());

        assert!(episodes.len() > 1);
        for episode in &episodes {
            assert!(episode.commit_count() >= 3);
            assert_eq!(episode.start_date, episode.commits[0].committed_at);
            assert!(episode.start_date <= episode.end_date);
        }
        for pair in episodes.windows(2) {
            assert!(pair[0].end_date <= pair[1].start_date);
        }
    }

    #[test]
    fn shuffled_input_gives_identical_output() {
        let commits = varied_history();
        let mut shuffled = commits.clone();
        shuffled.reverse();
        shuffled.rotate_left(17);

        let builder = EpisodeBuilder::default();

        assert_eq!(builder.build(&commits), builder.build(&shuffled));
        assert_eq!(builder.build(&commits), builder.build(&commits));
    }

    #[test]
    fn description_joins_few_unique_first_lines() {
        let commits = hourly(&["fix: bug A\n\nbody", "fix: bug A", "fix: bug B"]);
        assert_eq!(summarize_commits(&commits), "fix: bug A. fix: bug B.");
    }

    #[test]
    fn description_lists_matched_themes() {
        let commits = hourly(&[
            "add api handler",
            "wire endpoint",
            "deploy preview",
            "tweak handler",
            "more handler work",
        ]);
        assert_eq!(
            summarize_commits(&commits),
            "Focused on API development, deployment with 5 commits."
        );
    }

    #[test]
    fn description_without_themes_counts_commits() {
        let commits = hourly(&["alpha", "beta", "gamma", "delta", "epsilon", "alpha"]);
        assert_eq!(
            summarize_commits(&commits),
            "6 commits advancing the project with various improvements and features."
        );
    }

    #[test]
    fn date_range_label_spans_months() {
        let start = Utc.with_ymd_and_hms(2024, 1, 30, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap();

        assert_eq!(date_range_label(start, end), "Jan - Feb 2024");
        assert_eq!(date_range_label(start, start), "Jan 2024");
    }

    #[test]
    fn date_range_label_same_month_across_years_prints_once() {
        let start = Utc.with_ymd_and_hms(2023, 12, 5, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 20, 0, 0, 0).unwrap();

        assert_eq!(date_range_label(start, end), "Dec 2023");
    }
}
