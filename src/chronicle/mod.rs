pub mod commit;
pub mod episode_builder;
pub mod project;
pub mod renderer;
pub mod season_builder;
pub mod sync;
pub mod version;

use chrono::{DateTime, Duration, Utc};

pub use commit::CommitRecord;
pub use episode_builder::{Episode, EpisodeBuilder, EpisodeRules};
pub use season_builder::{Season, SeasonBuilder, SeasonRules};

/// Runs the full commits → episodes → seasons pipeline for one repository.
#[derive(Debug, Clone, Default)]
pub struct Chronicler {
    episodes: EpisodeBuilder,
    seasons: SeasonBuilder,
}

impl Chronicler {
    pub fn new(episode_rules: EpisodeRules, season_rules: SeasonRules) -> Self {
        Self {
            episodes: EpisodeBuilder::new(episode_rules),
            seasons: SeasonBuilder::new(season_rules),
        }
    }

    pub fn chronicle(&self, commits: &[CommitRecord]) -> Vec<Season> {
        let episodes = self.episodes.build(commits);
        self.seasons.build(&episodes)
    }
}

/// True when `a` and `b` are strictly more than `max` apart, in either order.
pub(crate) fn gap_exceeds(a: DateTime<Utc>, b: DateTime<Utc>, max: Duration) -> bool {
    let gap = b.signed_duration_since(a);
    let gap = if gap < Duration::zero() { -gap } else { gap };
    gap > max
}
