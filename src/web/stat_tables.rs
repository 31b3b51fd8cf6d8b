//! Stat table views shared by the player/team pages and CSV downloads.
//!
//! Each table on a page owns its sort state, carried in the query string as
//! `{key}_sort` / `{key}_dir` so header links on one table leave the other
//! untouched.

use std::collections::BTreeMap;

use crate::api_server::AppError;
use crate::columns::pitching_columns;
use crate::model::StatSplit;
use crate::stats_api::{StatType, TargetKind};
use crate::stats_cache::StatsCache;
use crate::table::{RenderedCell, SortDirection, SortState, Table, TableError};

pub type QueryParams = BTreeMap<String, String>;

impl From<TableError> for AppError {
    fn from(e: TableError) -> Self {
        AppError::Internal(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub key: &'static str,
    pub postseason: bool,
    pub heading: &'static str,
    pub export_label: &'static str,
}

pub const PITCHING_TABLES: [TableSpec; 2] = [
    TableSpec {
        key: "regular",
        postseason: false,
        heading: "Standard Pitching Stats",
        export_label: "Regular Season",
    },
    TableSpec {
        key: "postseason",
        postseason: true,
        heading: "Postseason Pitching Stats",
        export_label: "Postseason",
    },
];

pub fn table_spec(key: &str) -> Option<&'static TableSpec> {
    PITCHING_TABLES.iter().find(|spec| spec.key == key)
}

impl TableSpec {
    pub fn export_filename(&self, target_name: &str) -> String {
        format!("{} {} Pitching Stats.csv", target_name, self.export_label)
    }
}

// ============================================================================
// Sort state <-> query string
// ============================================================================

fn sort_key(table: &str) -> String {
    format!("{}_sort", table)
}

fn dir_key(table: &str) -> String {
    format!("{}_dir", table)
}

pub fn sort_state(params: &QueryParams, table: &str) -> SortState {
    let Some(column) = params.get(&sort_key(table)).filter(|c| !c.is_empty()) else {
        return SortState::unsorted();
    };
    let direction = params
        .get(&dir_key(table))
        .and_then(|d| SortDirection::parse(d))
        .unwrap_or_default();
    SortState::by(column.clone(), direction)
}

fn with_sort(params: &QueryParams, table: &str, sort: &SortState) -> QueryParams {
    let mut params = params.clone();
    params.remove(&sort_key(table));
    params.remove(&dir_key(table));
    if let Some(column) = &sort.column {
        params.insert(sort_key(table), column.clone());
        params.insert(dir_key(table), sort.direction.as_str().to_string());
    }
    params
}

pub fn href(path: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    format!("{}?{}", path, query.join("&"))
}

// ============================================================================
// Data + views
// ============================================================================

/// Season splits plus the career line used for the footer
#[derive(Debug, Clone, Default)]
pub struct PitchingData {
    pub splits: Vec<StatSplit>,
    pub career: Option<StatSplit>,
}

/// None when the season splits could not be loaded
pub async fn load_pitching(
    stats: &StatsCache,
    kind: TargetKind,
    id: &str,
    postseason: bool,
) -> Option<PitchingData> {
    let (seasons, career) = tokio::join!(
        stats.pitching_stats(kind, id, StatType::Season, postseason),
        stats.pitching_stats(kind, id, StatType::Career, postseason),
    );

    Some(PitchingData {
        splits: seasons?.splits,
        career: career.and_then(|c| c.splits.into_iter().next()),
    })
}

#[derive(Debug, Clone)]
pub struct HeaderView {
    pub label: String,
    pub title: String,
    pub indicator: &'static str,
    pub aria_sort: &'static str,
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct StatTableView {
    pub key: &'static str,
    pub heading: &'static str,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<Vec<RenderedCell>>,
    pub footer: Vec<RenderedCell>,
    pub csv_href: String,
}

/// `base_path` is the page path, e.g. `/players/york-silk`
pub fn build_view(
    spec: &TableSpec,
    data: &PitchingData,
    base_path: &str,
    params: &QueryParams,
) -> Result<StatTableView, AppError> {
    let columns = pitching_columns(data.career.as_ref());
    let table = Table::new(&columns, &data.splits)?.with_sort(sort_state(params, spec.key));
    let rendered = table.render();

    let headers = rendered
        .header
        .iter()
        .map(|cell| HeaderView {
            label: cell.label.clone(),
            title: cell.title.clone().unwrap_or_else(|| cell.label.clone()),
            indicator: cell.indicator(),
            aria_sort: cell.aria_sort(),
            href: format!(
                "{}#{}",
                href(base_path, &with_sort(params, spec.key, &cell.next_sort)),
                spec.key
            ),
        })
        .collect();

    let mut csv_params = with_sort(&QueryParams::new(), spec.key, table.sort_state());
    csv_params.insert("table".to_string(), spec.key.to_string());

    Ok(StatTableView {
        key: spec.key,
        heading: spec.heading,
        headers,
        rows: rendered.body,
        footer: rendered.footer,
        csv_href: href(&format!("{}/pitching.csv", base_path), &csv_params),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PitchingStat;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sort_state_from_query() {
        let p = params(&[("regular_sort", "earnedRunAverage"), ("regular_dir", "desc")]);
        assert_eq!(
            sort_state(&p, "regular"),
            SortState::by("earnedRunAverage", SortDirection::Descending)
        );
        assert_eq!(sort_state(&p, "postseason"), SortState::unsorted());

        let bad_dir = params(&[("regular_sort", "wins"), ("regular_dir", "sideways")]);
        assert_eq!(
            sort_state(&bad_dir, "regular"),
            SortState::by("wins", SortDirection::Ascending)
        );
    }

    #[test]
    fn test_header_links_keep_other_table_state() {
        let data = PitchingData {
            splits: vec![StatSplit {
                season: Some(2),
                stat: PitchingStat {
                    wins: Some(3.0),
                    ..Default::default()
                },
                ..Default::default()
            }],
            career: None,
        };
        let p = params(&[("postseason_sort", "wins"), ("postseason_dir", "asc")]);

        let view = build_view(&PITCHING_TABLES[0], &data, "/players/york-silk", &p).unwrap();

        let wins = view.headers.iter().find(|h| h.label == "W").unwrap();
        assert_eq!(
            wins.href,
            "/players/york-silk?postseason_dir=asc&postseason_sort=wins&regular_dir=asc&regular_sort=wins#regular"
        );
        assert_eq!(view.csv_href, "/players/york-silk/pitching.csv?table=regular");
        assert_eq!(view.rows[0][0].text, "3");
        assert!(view.footer.is_empty());
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            PITCHING_TABLES[1].export_filename("York Silk"),
            "York Silk Postseason Pitching Stats.csv"
        );
        assert_eq!(table_spec("regular"), Some(&PITCHING_TABLES[0]));
        assert_eq!(table_spec("bogus"), None);
    }
}
