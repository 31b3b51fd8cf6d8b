//! Home page feed: recent debuts, incinerations and upcoming season starts.

use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Reverse;

use crate::model::{Player, SeasonStartDates};

pub const RECENT_DEBUT_COUNT: usize = 15;

/// Newest debuts first; players without a recorded debut go last
pub fn recent_debuts(players: &[Player], limit: usize) -> Vec<&Player> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by_key(|p| (p.debut_key().is_none(), Reverse(p.debut_key())));
    sorted.truncate(limit);
    sorted
}

/// Players with a complete incineration season/day pair, most recent first
pub fn incinerations(players: &[Player]) -> Vec<&Player> {
    let mut incinerated: Vec<&Player> = players
        .iter()
        .filter(|p| p.incineration_key().is_some())
        .collect();
    incinerated.sort_by_key(|p| Reverse(p.incineration_key()));
    incinerated
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonStart {
    pub season: String,
    pub starts_at: DateTime<Utc>,
}

impl SeasonStart {
    pub fn display_date(&self) -> String {
        self.starts_at.format("%A, %B %-d, %Y at %H:%M UTC").to_string()
    }
}

/// Accepts RFC 3339 timestamps or bare dates (midnight UTC)
pub fn parse_start_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Season starts at or after `now`, soonest first
pub fn upcoming_season_starts(dates: &SeasonStartDates, now: DateTime<Utc>) -> Vec<SeasonStart> {
    let mut upcoming: Vec<SeasonStart> = dates
        .iter()
        .filter_map(|(season, raw)| match parse_start_date(raw) {
            Some(starts_at) => Some(SeasonStart {
                season: season.clone(),
                starts_at,
            }),
            None => {
                tracing::debug!("Skipping unparseable start date for season {}: {}", season, raw);
                None
            }
        })
        .filter(|start| start.starts_at >= now)
        .collect();
    upcoming.sort_by_key(|start| start.starts_at);
    upcoming
}
