use crate::data::{Period, RankingItem};

const BOT_USER_AGENT: &str = concat!("webtoon-ranking/", env!("CARGO_PKG_VERSION"));

pub enum UserAgent {
    Bot,
}

impl UserAgent {
    pub fn value(&self) -> String {
        match self {
            UserAgent::Bot => BOT_USER_AGENT,
        }
        .to_string()
    }
}

/// e.g. `매주 월요일, 목요일 연재`, empty when there is no schedule
pub fn schedule_text(periods: &[Period]) -> String {
    if periods.is_empty() {
        return String::new();
    }
    let days = periods
        .iter()
        .map(|period| period.label())
        .collect::<Vec<_>>()
        .join(", ");
    format!("매주 {} 연재", days)
}

pub fn free_episode_text(free_episode_count: u32) -> String {
    format!("{}화 무료", free_episode_count)
}

/// One line per title for terminal output
pub fn format_item(item: &RankingItem) -> String {
    let movement = item.movement();
    let artists = item
        .artists
        .iter()
        .map(|artist| artist.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut line = format!(
        "{:>3} {}{:<3} {} / {} [{}] {}",
        item.current_rank,
        movement.icon(),
        if movement.diff() > 0 {
            movement.diff().to_string()
        } else {
            String::new()
        },
        item.title,
        artists,
        item.state.label(),
        free_episode_text(item.free_episode_count),
    );
    let schedule = schedule_text(item.schedule_days());
    if !schedule.is_empty() {
        line.push_str(" · ");
        line.push_str(&schedule);
    }
    line
}
