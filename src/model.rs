//! Upstream Record Types
//!
//! Shapes of the JSON records served by the stats API. Every stat field is
//! optional: the upstream omits fields for early seasons and occasionally
//! ships numbers as strings, so decoding never fails on a single bad value.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A player as listed by `/players`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub url_slug: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub debut_season: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub debut_gameday: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub incineration_season: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub incineration_gameday: Option<i64>,
}

impl Player {
    /// Season/day pair collapsed into one sortable key
    pub fn debut_key(&self) -> Option<i64> {
        game_key(self.debut_season, self.debut_gameday)
    }

    /// Present only when both incineration season and day are recorded
    pub fn incineration_key(&self) -> Option<i64> {
        game_key(self.incineration_season, self.incineration_gameday)
    }
}

/// Out-of-range values yield None, like a missing part
fn game_key(season: Option<i64>, day: Option<i64>) -> Option<i64> {
    season?.checked_mul(1000)?.checked_add(day?)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub url_slug: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub full_name: String,
}

impl Team {
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.nickname
        } else {
            &self.full_name
        }
    }
}

/// Pitching line for one split, as pre-computed upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchingStat {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wins: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub losses: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub win_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub earned_run_average: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub games: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub shutouts: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub innings: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hits_allowed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub runs_allowed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub home_runs_allowed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub walks: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub strikeouts: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quality_starts: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub batters_faced: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub whip: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hits_per_9: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub home_runs_per_9: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub walks_per_9: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub strikeouts_per_9: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub strikeouts_per_walk: Option<f64>,
}

/// One season (or career) slice of a stat target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatSplit {
    /// Zero-indexed season; absent on career splits
    #[serde(default, deserialize_with = "lenient_i64")]
    pub season: Option<i64>,
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub stat: PitchingStat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub splits: Vec<StatSplit>,
}

/// Season number (as string key) -> ISO start date
pub type SeasonStartDates = BTreeMap<String, String>;

// ============================================================================
// Lenient number decoding
// ============================================================================

/// Accepts a JSON number, a numeric string or null; anything else is None.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_numeric_strings_and_garbage() {
        let stat: PitchingStat = serde_json::from_str(
            r#"{"wins": "7", "losses": 3, "win_pct": "0.700", "whip": "n/a", "innings": null}"#,
        )
        .unwrap();

        assert_eq!(stat.wins, Some(7.0));
        assert_eq!(stat.losses, Some(3.0));
        assert_relative_eq!(stat.win_pct.unwrap(), 0.7);
        assert_eq!(stat.whip, None);
        assert_eq!(stat.innings, None);
        assert_eq!(stat.strikeouts, None);
    }

    #[test]
    fn test_incineration_key_requires_both_parts() {
        let mut player = Player {
            incineration_season: Some(2),
            ..Default::default()
        };
        assert_eq!(player.incineration_key(), None);

        player.incineration_gameday = Some(41);
        assert_eq!(player.incineration_key(), Some(2041));
    }

    #[test]
    fn test_oversized_game_key_is_missing() {
        let player: Player = serde_json::from_str(
            r#"{"debut_season": 100000000000000000, "debut_gameday": 1,
                "incineration_season": 9223372036854775, "incineration_gameday": 9999}"#,
        )
        .unwrap();
        assert_eq!(player.debut_key(), None);
        assert_eq!(player.incineration_key(), None);
    }

    #[test]
    fn test_split_without_team() {
        let split: StatSplit =
            serde_json::from_str(r#"{"season": 0, "stat": {"wins": 1}}"#).unwrap();
        assert_eq!(split.season, Some(0));
        assert!(split.team.is_none());
        assert_eq!(split.stat.wins, Some(1.0));
    }
}
