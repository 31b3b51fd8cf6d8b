// CSV download handlers
//
// The download mirrors the on-page table: same columns, same formatting,
// same sort (carried in the query string like the page's header links).

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::api_server::{AppError, AppState};
use crate::columns::pitching_columns;
use crate::csv_export::{self, CsvDownload, ExportError};
use crate::stats_api::TargetKind;
use crate::table::Table;
use crate::web::handlers::pages::resolve_target;
use crate::web::stat_tables::{load_pitching, sort_state, table_spec, PitchingData, QueryParams};

const DEFAULT_TABLE: &str = "regular";

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// Quoted ASCII fallback plus the RFC 5987 form for non-ASCII names
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() && c != '"' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

impl IntoResponse for CsvDownload {
    fn into_response(self) -> Response {
        let disposition = HeaderValue::from_str(&content_disposition(&self.filename))
            .unwrap_or_else(|_| {
                HeaderValue::from_static("attachment; filename=\"export.csv\"")
            });

        (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.body,
        )
            .into_response()
    }
}

async fn pitching_csv(
    state: &AppState,
    kind: TargetKind,
    slug: &str,
    params: &QueryParams,
) -> Result<CsvDownload, AppError> {
    let key = params.get("table").map_or(DEFAULT_TABLE, String::as_str);
    let spec = table_spec(key)
        .ok_or_else(|| AppError::NotFound(format!("Unknown table '{}'", key)))?;

    // Unavailable data exports like an empty table: header row only
    let (name, data) = match resolve_target(state, kind, slug).await? {
        Some(target) => {
            let data = load_pitching(&state.stats, target.kind, &target.id, spec.postseason)
                .await
                .unwrap_or_default();
            (target.name, data)
        }
        None => (slug.to_string(), PitchingData::default()),
    };

    let columns = pitching_columns(data.career.as_ref());
    let table = Table::new(&columns, &data.splits)?.with_sort(sort_state(params, spec.key));

    tracing::debug!(
        "Exporting {} rows of {} {} pitching stats",
        table.rows().len(),
        name,
        spec.key
    );
    Ok(csv_export::export(&table, &spec.export_filename(&name))?)
}

pub async fn player_pitching_csv(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<CsvDownload, AppError> {
    pitching_csv(&state, TargetKind::Player, &slug, &params).await
}

pub async fn team_pitching_csv(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<CsvDownload, AppError> {
    pitching_csv(&state, TargetKind::Team, &slug, &params).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("York Silk Regular Season Pitching Stats.csv"),
            "attachment; filename=\"York Silk Regular Season Pitching Stats.csv\"; \
             filename*=UTF-8''York%20Silk%20Regular%20Season%20Pitching%20Stats.csv"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("Jaylen Hotdogfingers ☠.csv");
        assert!(value.contains("filename=\"Jaylen Hotdogfingers _.csv\""));
        assert!(value.contains("filename*=UTF-8''Jaylen%20Hotdogfingers%20%E2%98%A0.csv"));
    }

    #[test]
    fn test_download_headers() {
        let response = CsvDownload {
            filename: "Stats.csv".to_string(),
            body: "Yr,W\n1*,3\n".to_string(),
        }
        .into_response();

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"Stats.csv\""));
    }
}
