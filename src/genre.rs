use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::RankingError;

/// Ranking genres served by the API
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    #[default]
    Romance,
    Drama,
}

impl Genre {
    pub const ALL: [Genre; 2] = [Genre::Romance, Genre::Drama];

    /// Path segment used by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Romance => "romance",
            Genre::Drama => "drama",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Genre::Romance => "로맨스",
            Genre::Drama => "드라마",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|genre| genre.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RankingError::UnknownGenre(s.to_string()))
    }
}
