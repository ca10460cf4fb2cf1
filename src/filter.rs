use serde::{Deserialize, Serialize};

use crate::data::{ContentsState, RankingItem};

/// Minimum number of free episodes kept by the free-episodes filter
pub const MIN_FREE_EPISODES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Ongoing,
    Completed,
    FreeEpisodes,
}

impl FilterKind {
    pub const ALL: [FilterKind; 3] = [
        FilterKind::Ongoing,
        FilterKind::Completed,
        FilterKind::FreeEpisodes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Ongoing => "연재 중",
            FilterKind::Completed => "완결",
            FilterKind::FreeEpisodes => "무료회차 3개 ↑",
        }
    }
}

/// Client-side filters over a loaded ranking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub ongoing: bool,
    pub completed: bool,
    pub min_free_episodes: bool,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// All enabled filters must accept the item.
    ///
    /// `ongoing` and `completed` together reject every item.
    pub fn matches(&self, item: &RankingItem) -> bool {
        if self.ongoing && item.state != ContentsState::Ongoing {
            return false;
        }
        if self.completed && item.state != ContentsState::Completed {
            return false;
        }
        if self.min_free_episodes && item.free_episode_count < MIN_FREE_EPISODES {
            return false;
        }
        true
    }

    pub fn apply<'a, I>(&self, items: I) -> Vec<RankingItem>
    where
        I: IntoIterator<Item = &'a RankingItem>,
    {
        items
            .into_iter()
            .filter(|item| self.matches(item))
            .cloned()
            .collect()
    }

    /// Flip one filter. Enabling ongoing clears completed and vice versa.
    pub fn toggle(&mut self, kind: FilterKind) {
        match kind {
            FilterKind::Ongoing => {
                self.ongoing = !self.ongoing;
                if self.ongoing {
                    self.completed = false;
                }
            }
            FilterKind::Completed => {
                self.completed = !self.completed;
                if self.completed {
                    self.ongoing = false;
                }
            }
            FilterKind::FreeEpisodes => {
                self.min_free_episodes = !self.min_free_episodes;
            }
        }
    }

    /// Set one filter as-is, without clearing its counterpart
    pub fn set(&mut self, kind: FilterKind, value: bool) {
        match kind {
            FilterKind::Ongoing => self.ongoing = value,
            FilterKind::Completed => self.completed = value,
            FilterKind::FreeEpisodes => self.min_free_episodes = value,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_enabled(&self, kind: FilterKind) -> bool {
        match kind {
            FilterKind::Ongoing => self.ongoing,
            FilterKind::Completed => self.completed,
            FilterKind::FreeEpisodes => self.min_free_episodes,
        }
    }

    pub fn has_active(&self) -> bool {
        self.active_count() > 0
    }

    pub fn active_count(&self) -> usize {
        FilterKind::ALL
            .iter()
            .filter(|kind| self.is_enabled(**kind))
            .count()
    }
}

/// Whether `item` passes `filter`
pub fn matches(item: &RankingItem, filter: &FilterSpec) -> bool {
    filter.matches(item)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::Schedule;

    fn item(id: u64, state: ContentsState, free_episode_count: u32) -> RankingItem {
        RankingItem {
            id,
            alias: String::new(),
            title: format!("title {id}"),
            artists: Vec::new(),
            schedule: Schedule::default(),
            genres: Vec::new(),
            badges: String::new(),
            free_episode_count,
            state,
            current_rank: 1,
            previous_rank: 1,
            updated_at_millis: None,
            is_print: false,
            thumbnail_url: None,
        }
    }

    fn sample() -> Vec<RankingItem> {
        vec![
            item(1, ContentsState::Ongoing, 0),
            item(2, ContentsState::Ongoing, 5),
            item(3, ContentsState::Completed, 2),
            item(4, ContentsState::Completed, 3),
        ]
    }

    fn ids(items: &[RankingItem]) -> Vec<u64> {
        items.iter().map(|item| item.id).collect()
    }

    #[test]
    fn test_no_filter_keeps_everything() {
        let items = sample();
        assert_eq!(ids(&FilterSpec::new().apply(&items)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_ongoing_ignores_free_episodes() {
        let filter = FilterSpec {
            ongoing: true,
            ..Default::default()
        };
        let items = sample();
        assert_eq!(ids(&filter.apply(&items)), vec![1, 2]);
        assert!(matches(&items[0], &filter));
        assert!(!matches(&items[2], &filter));
    }

    #[test]
    fn test_completed_with_free_episodes() {
        let filter = FilterSpec {
            completed: true,
            min_free_episodes: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&sample())), vec![4]);
    }

    #[test]
    fn test_free_episodes_threshold() {
        let filter = FilterSpec {
            min_free_episodes: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&sample())), vec![2, 4]);
    }

    #[test]
    fn test_both_states_yield_nothing() {
        let filter = FilterSpec {
            ongoing: true,
            completed: true,
            min_free_episodes: false,
        };
        assert!(filter.apply(&sample()).is_empty());
    }

    #[test]
    fn test_toggle_is_mutually_exclusive() {
        let mut filter = FilterSpec::new();
        filter.toggle(FilterKind::Ongoing);
        assert!(filter.ongoing);

        filter.toggle(FilterKind::Completed);
        assert!(filter.completed);
        assert!(!filter.ongoing);

        filter.toggle(FilterKind::Completed);
        assert!(!filter.completed);
        assert!(!filter.ongoing);

        filter.toggle(FilterKind::FreeEpisodes);
        filter.toggle(FilterKind::Ongoing);
        assert_eq!(
            filter,
            FilterSpec {
                ongoing: true,
                completed: false,
                min_free_episodes: true,
            }
        );
    }

    #[test]
    fn test_set_reset_and_count() {
        let mut filter = FilterSpec::new();
        assert!(!filter.has_active());

        filter.set(FilterKind::Ongoing, true);
        filter.set(FilterKind::Completed, true);
        assert_eq!(filter.active_count(), 2);

        filter.reset();
        assert_eq!(filter, FilterSpec::default());
        assert_eq!(filter.active_count(), 0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(FilterKind::Ongoing.label(), "연재 중");
        assert_eq!(FilterKind::FreeEpisodes.label(), "무료회차 3개 ↑");
    }
}
