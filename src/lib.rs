//! Blaseball Reference
//!
//! Server-rendered stats site over the read-only Blaseball stats API.
//!
//! - `table` / `columns`: sortable table engine and the pitching column set
//! - `csv_export`: WYSIWYG CSV downloads of any table
//! - `search`: hosted or local search index plus the typeahead client
//! - `stats_api` / `stats_cache`: upstream client and its revalidating cache
//! - `home`: list computations for the landing page
//! - `web` / `api_server`: axum router, askama pages, htmx partials

pub mod columns;
pub mod config;
pub mod csv_export;
pub mod home;
pub mod model;
pub mod search;
pub mod stats_api;
pub mod table;

#[cfg(feature = "api")]
pub mod api_server;
#[cfg(feature = "api")]
pub mod stats_cache;
#[cfg(feature = "api")]
pub mod web;

#[cfg(all(test, feature = "api"))]
mod test_upstream;

// Re-export commonly used types
pub use config::Config;
pub use table::{CellValue, Column, SortDirection, SortState, Table};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
