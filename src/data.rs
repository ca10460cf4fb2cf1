use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weekday a title is published on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Period {
    pub fn label(&self) -> &'static str {
        match self {
            Period::Mon => "월요일",
            Period::Tue => "화요일",
            Period::Wed => "수요일",
            Period::Thu => "목요일",
            Period::Fri => "금요일",
            Period::Sat => "토요일",
            Period::Sun => "일요일",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArtistRole {
    Writer,
    Painter,
    Scripter,
    Original,
    Publisher,
    Label,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub name: String,
    pub role: ArtistRole,
    #[serde(default)]
    pub id: String,
    /// Only present on some genres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub anchor: i64,
}

/// Publication state of a title
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentsState {
    #[serde(rename = "scheduled")]
    Ongoing,
    #[serde(rename = "completed")]
    Completed,
}

impl ContentsState {
    pub fn label(&self) -> &'static str {
        match self {
            ContentsState::Ongoing => "연재중",
            ContentsState::Completed => "완결",
        }
    }
}

/// One title's entry in a ranking page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankingItem {
    pub id: u64,
    #[serde(default)]
    pub alias: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub badges: String,
    #[serde(rename = "freedEpisodeSize")]
    pub free_episode_count: u32,
    #[serde(rename = "contentsState")]
    pub state: ContentsState,
    pub current_rank: u32,
    pub previous_rank: u32,
    /// Milliseconds since the unix epoch
    #[serde(rename = "updatedAt", default)]
    pub updated_at_millis: Option<i64>,
    #[serde(default)]
    pub is_print: bool,
    #[serde(rename = "thumbnailSrc", default)]
    pub thumbnail_url: Option<String>,
}

impl RankingItem {
    /// Weekdays the title is published on, empty when it has no fixed schedule
    pub fn schedule_days(&self) -> &[Period] {
        &self.schedule.periods
    }

    pub fn movement(&self) -> RankMovement {
        RankMovement::between(self.current_rank, self.previous_rank)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at_millis
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

/// One page of a genre ranking
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub has_next: bool,
    #[serde(rename = "count", default)]
    pub total_count: u64,
    #[serde(rename = "data")]
    pub items: Vec<RankingItem>,
}

/// Body the ranking API sends instead of a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

/// How a title moved since the previous ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMovement {
    Up(u32),
    Down(u32),
    Same,
}

impl RankMovement {
    pub fn between(current_rank: u32, previous_rank: u32) -> Self {
        if current_rank < previous_rank {
            RankMovement::Up(previous_rank - current_rank)
        } else if current_rank > previous_rank {
            RankMovement::Down(current_rank - previous_rank)
        } else {
            RankMovement::Same
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RankMovement::Up(_) => "▲",
            RankMovement::Down(_) => "▼",
            RankMovement::Same => "-",
        }
    }

    pub fn diff(&self) -> u32 {
        match self {
            RankMovement::Up(diff) | RankMovement::Down(diff) => *diff,
            RankMovement::Same => 0,
        }
    }
}
