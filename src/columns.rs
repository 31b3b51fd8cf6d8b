//! Stat Column Definitions
//!
//! Declarative column sets for stat tables. Each pitching stat is one entry
//! in [`PITCHING_STATS`]; the builder turns entries into table columns whose
//! footer shows the pre-computed career line.

use crate::model::{PitchingStat, StatSplit};
use crate::table::{default_format, CellValue, Column, MISSING_PLACEHOLDER};

/// One pitching stat: short label, long title, accessor and display precision
pub struct StatColumnSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub title: &'static str,
    pub get: fn(&PitchingStat) -> Option<f64>,
    pub precision: Option<usize>,
}

pub const PITCHING_STATS: &[StatColumnSpec] = &[
    StatColumnSpec { id: "wins", label: "W", title: "Wins", get: |s| s.wins, precision: None },
    StatColumnSpec { id: "losses", label: "L", title: "Losses", get: |s| s.losses, precision: None },
    StatColumnSpec {
        id: "winningPercentage",
        label: "W-L%",
        title: "Winning Percentage",
        get: |s| s.win_pct,
        precision: Some(2),
    },
    StatColumnSpec {
        id: "earnedRunAverage",
        label: "ERA",
        title: "Earned Run Average",
        get: |s| s.earned_run_average,
        precision: Some(2),
    },
    StatColumnSpec { id: "gamesPlayed", label: "G", title: "Games Played", get: |s| s.games, precision: None },
    StatColumnSpec { id: "shutouts", label: "SHO", title: "Shutouts", get: |s| s.shutouts, precision: None },
    StatColumnSpec {
        id: "inningsPitched",
        label: "IP",
        title: "Innings Pitched",
        get: |s| s.innings,
        precision: Some(1),
    },
    StatColumnSpec { id: "hitsAllowed", label: "H", title: "Hits Allowed", get: |s| s.hits_allowed, precision: None },
    StatColumnSpec { id: "earnedRuns", label: "R", title: "Earned Runs", get: |s| s.runs_allowed, precision: None },
    StatColumnSpec { id: "homeRuns", label: "HR", title: "Home Runs", get: |s| s.home_runs_allowed, precision: None },
    StatColumnSpec {
        id: "basesOnBalls",
        label: "BB",
        title: "Bases on Balls (Walks)",
        get: |s| s.walks,
        precision: None,
    },
    StatColumnSpec { id: "strikeouts", label: "SO", title: "Strikeouts", get: |s| s.strikeouts, precision: None },
    StatColumnSpec {
        id: "qualityStarts",
        label: "QS",
        title: "Quality Starts",
        get: |s| s.quality_starts,
        precision: None,
    },
    StatColumnSpec {
        id: "battersFaced",
        label: "BF",
        title: "Batters Faced",
        get: |s| s.batters_faced,
        precision: None,
    },
    StatColumnSpec {
        id: "walksAndHitsPerInningPitched",
        label: "WHIP",
        title: "Walks and Hits Per Inning Pitched",
        get: |s| s.whip,
        precision: Some(3),
    },
    StatColumnSpec {
        id: "hitsAllowedPerNine",
        label: "H9",
        title: "Hits Per 9 Innings",
        get: |s| s.hits_per_9,
        precision: Some(1),
    },
    StatColumnSpec {
        id: "homeRunsPerNine",
        label: "HR9",
        title: "Home Runs Per 9 Innings",
        get: |s| s.home_runs_per_9,
        precision: Some(1),
    },
    StatColumnSpec {
        id: "basesOnBallsPerNine",
        label: "BB9",
        title: "Walks Per 9 Innings",
        get: |s| s.walks_per_9,
        precision: Some(1),
    },
    StatColumnSpec {
        id: "strikeoutsPerNine",
        label: "SO9",
        title: "Strikeouts Per 9 Innings",
        get: |s| s.strikeouts_per_9,
        precision: Some(1),
    },
    StatColumnSpec {
        id: "strikeoutToWalkRatio",
        label: "SO/BB",
        title: "Strikeout-to-Walk Ratio",
        get: |s| s.strikeouts_per_walk,
        precision: Some(2),
    },
];

/// Seasons are zero-indexed upstream. The first two carry an asterisk
/// because their data is incomplete. Non-integral or out-of-range numbers
/// render as missing.
pub fn format_season(value: &CellValue) -> String {
    let display = value
        .as_f64()
        .filter(|season| season.fract() == 0.0 && season.abs() < 1e15)
        .and_then(|season| (season as i64).checked_add(1));

    match (display, value) {
        (Some(n), _) if n == 1 || n == 2 => format!("{}*", n),
        (Some(n), _) => n.to_string(),
        (None, CellValue::Number(_)) => MISSING_PLACEHOLDER.to_string(),
        (None, other) => default_format(other),
    }
}

pub fn season_column(summary_label: Option<&'static str>) -> Column<StatSplit> {
    let column = Column::new("season", "Yr", |split: &StatSplit| split.season.into())
        .title("Year")
        .formatter(format_season);

    match summary_label {
        Some(label) => column.summary(move |_| CellValue::Text(label.to_string())),
        None => column,
    }
}

pub fn team_column() -> Column<StatSplit> {
    Column::new("teamName", "Tm", |split: &StatSplit| {
        split
            .team
            .as_ref()
            .filter(|team| !team.nickname.is_empty())
            .map_or(CellValue::Missing, |team| CellValue::Text(team.nickname.clone()))
    })
    .title("Team")
    .link(|split: &StatSplit| {
        split
            .team
            .as_ref()
            .filter(|team| !team.url_slug.is_empty())
            .map(|team| format!("/teams/{}", team.url_slug))
    })
}

/// Stat columns shared by player and team pitching tables. The footer of
/// each column is the matching value from the career split.
pub fn common_pitching_columns(career: Option<&StatSplit>) -> Vec<Column<StatSplit>> {
    PITCHING_STATS
        .iter()
        .map(|spec| {
            let get = spec.get;
            let column = Column::new(spec.id, spec.label, move |split: &StatSplit| get(&split.stat).into())
                .title(spec.title);

            let column = match career {
                Some(career) => {
                    let career_value: CellValue = get(&career.stat).into();
                    column.summary(move |_| career_value.clone())
                }
                None => column,
            };

            match spec.precision {
                Some(precision) => column.fixed(precision),
                None => column,
            }
        })
        .collect()
}

/// Full pitching table: season, team, then every pitching stat
pub fn pitching_columns(career: Option<&StatSplit>) -> Vec<Column<StatSplit>> {
    let summary_label = career.map(|_| "Career");
    let mut columns = vec![season_column(summary_label), team_column()];
    columns.extend(common_pitching_columns(career));
    columns
}
