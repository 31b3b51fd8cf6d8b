//! HTML layer: askama templates, htmx partials and CSV downloads.

pub mod handlers;
pub mod stat_tables;
