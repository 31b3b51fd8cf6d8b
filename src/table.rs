//! Table Engine
//!
//! Generic sortable table over read-only rows. Columns are plain descriptor
//! structs holding boxed closures (accessor, formatter, comparator, summary),
//! so a page builds its column set as data and hands it to [`Table`].
//!
//! Sorting is single-column and stable. Missing values rank after every
//! present value in both directions. Footer summaries run over the full,
//! unsorted input.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

pub type Accessor<R> = Box<dyn Fn(&R) -> CellValue + Send + Sync>;
pub type Formatter = Box<dyn Fn(&CellValue) -> String + Send + Sync>;
pub type Comparator = Box<dyn Fn(&CellValue, &CellValue) -> Ordering + Send + Sync>;
pub type Summary<R> = Box<dyn Fn(&[R]) -> CellValue + Send + Sync>;
pub type LinkTarget<R> = Box<dyn Fn(&R) -> Option<String> + Send + Sync>;

/// Value produced by a column accessor
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// NaN counts as missing so it can never poison an ordering
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Number(n) => n.is_nan(),
            CellValue::Text(_) => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(CellValue::Missing, CellValue::Number)
    }
}

impl From<Option<i64>> for CellValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(CellValue::Missing, |v| CellValue::Number(v as f64))
    }
}

impl From<Option<&str>> for CellValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(CellValue::Missing, |v| CellValue::Text(v.to_string()))
    }
}

/// Placeholder rendered for missing values
pub const MISSING_PLACEHOLDER: &str = "";

/// Integers print without a fractional part, everything else as-is.
pub fn default_format(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) if n.is_nan() => MISSING_PLACEHOLDER.to_string(),
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        CellValue::Number(n) => n.to_string(),
        CellValue::Text(s) => s.clone(),
        CellValue::Missing => MISSING_PLACEHOLDER.to_string(),
    }
}

/// Fixed-point rounding, display only
pub fn fixed_format(precision: usize) -> impl Fn(&CellValue) -> String + Send + Sync + 'static {
    move |value| match value {
        CellValue::Number(n) if !n.is_nan() => format!("{:.*}", precision, n),
        other => default_format(other),
    }
}

/// Numbers numerically, text lexicographically, numbers before text.
pub fn default_compare(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        (CellValue::Text(x), CellValue::Text(y)) => x.cmp(y),
        (CellValue::Number(_), CellValue::Text(_)) => Ordering::Less,
        (CellValue::Text(_), CellValue::Number(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

// ============================================================================
// Column descriptors
// ============================================================================

pub struct Column<R> {
    id: String,
    label: String,
    title: Option<String>,
    accessor: Accessor<R>,
    formatter: Formatter,
    comparator: Option<Comparator>,
    summary: Option<Summary<R>>,
    link: Option<LinkTarget<R>>,
}

impl<R> Column<R> {
    pub fn new<F>(id: impl Into<String>, label: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&R) -> CellValue + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            title: None,
            accessor: Box::new(accessor),
            formatter: Box::new(default_format),
            comparator: None,
            summary: None,
            link: None,
        }
    }

    /// Long-form header text (tooltip)
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&CellValue) -> String + Send + Sync + 'static,
    {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn fixed(self, precision: usize) -> Self {
        self.formatter(fixed_format(precision))
    }

    /// Replaces the default ordering for present values. Missing values
    /// still rank last.
    pub fn comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&CellValue, &CellValue) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Box::new(comparator));
        self
    }

    pub fn summary<F>(mut self, summary: F) -> Self
    where
        F: Fn(&[R]) -> CellValue + Send + Sync + 'static,
    {
        self.summary = Some(Box::new(summary));
        self
    }

    pub fn link<F>(mut self, link: F) -> Self
    where
        F: Fn(&R) -> Option<String> + Send + Sync + 'static,
    {
        self.link = Some(Box::new(link));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn header_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn has_summary(&self) -> bool {
        self.summary.is_some()
    }

    pub fn value(&self, row: &R) -> CellValue {
        (self.accessor)(row)
    }

    pub fn format(&self, value: &CellValue) -> String {
        (self.formatter)(value)
    }

    /// Formatted cell text; the same string is shown on screen and exported
    pub fn display(&self, row: &R) -> String {
        self.format(&self.value(row))
    }

    pub fn href(&self, row: &R) -> Option<String> {
        self.link.as_ref().and_then(|link| link(row))
    }

    pub fn summarize(&self, rows: &[R]) -> Option<CellValue> {
        self.summary.as_ref().map(|summary| summary(rows))
    }

    fn compare(&self, a: &CellValue, b: &CellValue, direction: SortDirection) -> Ordering {
        match (a.is_missing(), b.is_missing()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ordering = match &self.comparator {
                    Some(comparator) => comparator(a, b),
                    None => default_compare(a, b),
                };
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            }
        }
    }
}

impl<R> std::fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("has_summary", &self.summary.is_some())
            .finish()
    }
}

// ============================================================================
// Sort state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortDirection::Ascending),
            "desc" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

/// Single active sort column, or none (input order)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: Some(column.into()),
            direction,
        }
    }

    pub fn is_sorted_by(&self, column_id: &str) -> Option<SortDirection> {
        match &self.column {
            Some(active) if active == column_id => Some(self.direction),
            _ => None,
        }
    }

    /// Header activation: ascending -> descending -> unsorted on the same
    /// column, ascending when switching columns.
    pub fn toggle(&mut self, column_id: &str) {
        *self = self.toggled(column_id);
    }

    pub fn toggled(&self, column_id: &str) -> SortState {
        match self.is_sorted_by(column_id) {
            None => SortState::by(column_id, SortDirection::Ascending),
            Some(SortDirection::Ascending) => SortState::by(column_id, SortDirection::Descending),
            Some(SortDirection::Descending) => SortState::unsorted(),
        }
    }
}

// ============================================================================
// Table
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate column id '{0}'")]
    DuplicateColumn(String),
}

pub struct Table<'a, R> {
    columns: &'a [Column<R>],
    rows: &'a [R],
    sort: SortState,
}

impl<'a, R> Table<'a, R> {
    pub fn new(columns: &'a [Column<R>], rows: &'a [R]) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for column in columns {
            if !seen.insert(column.id()) {
                return Err(TableError::DuplicateColumn(column.id().to_string()));
            }
        }

        Ok(Self {
            columns,
            rows,
            sort: SortState::unsorted(),
        })
    }

    /// Unknown column ids fall back to input order
    pub fn with_sort(mut self, sort: SortState) -> Self {
        let known = sort
            .column
            .as_deref()
            .map_or(true, |id| self.column(id).is_some());

        if known {
            self.sort = sort;
        } else {
            tracing::debug!("Ignoring sort on unknown column {:?}", sort.column);
            self.sort = SortState::unsorted();
        }
        self
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn columns(&self) -> &'a [Column<R>] {
        self.columns
    }

    pub fn rows(&self) -> &'a [R] {
        self.rows
    }

    pub fn column(&self, id: &str) -> Option<&'a Column<R>> {
        self.columns.iter().find(|c| c.id() == id)
    }

    /// Row positions in current sort order
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.rows.len()).collect();

        let Some(column) = self.sort.column.as_deref().and_then(|id| self.column(id)) else {
            return indices;
        };

        let keys: Vec<CellValue> = self.rows.iter().map(|row| column.value(row)).collect();
        // slice::sort_by is stable
        indices.sort_by(|&a, &b| column.compare(&keys[a], &keys[b], self.sort.direction));
        indices
    }

    pub fn sorted_rows(&self) -> Vec<&'a R> {
        self.sorted_indices()
            .into_iter()
            .map(|i| &self.rows[i])
            .collect()
    }

    pub fn has_footer(&self) -> bool {
        self.columns.iter().any(Column::has_summary)
    }

    /// Summaries over the full input, formatted per column
    pub fn footer(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| {
                column
                    .summarize(self.rows)
                    .map(|value| column.format(&value))
                    .unwrap_or_default()
            })
            .collect()
    }

    pub fn render(&self) -> RenderedTable {
        let header = self
            .columns
            .iter()
            .map(|column| HeaderCell {
                id: column.id().to_string(),
                label: column.label().to_string(),
                title: column.header_title().map(str::to_string),
                sorted: self.sort.is_sorted_by(column.id()),
                next_sort: self.sort.toggled(column.id()),
            })
            .collect();

        let body = self
            .sorted_rows()
            .into_iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| RenderedCell {
                        text: column.display(row),
                        href: column.href(row),
                    })
                    .collect()
            })
            .collect();

        let footer = if self.has_footer() {
            self.footer()
                .into_iter()
                .map(|text| RenderedCell { text, href: None })
                .collect()
        } else {
            Vec::new()
        };

        RenderedTable {
            header,
            body,
            footer,
        }
    }
}

/// Header, body and footer regions ready for a template
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTable {
    pub header: Vec<HeaderCell>,
    pub body: Vec<Vec<RenderedCell>>,
    pub footer: Vec<RenderedCell>,
}

impl RenderedTable {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub id: String,
    pub label: String,
    pub title: Option<String>,
    pub sorted: Option<SortDirection>,
    /// State a click on this header moves to
    pub next_sort: SortState,
}

impl HeaderCell {
    pub fn indicator(&self) -> &'static str {
        match self.sorted {
            Some(SortDirection::Ascending) => "▲",
            Some(SortDirection::Descending) => "▼",
            None => "",
        }
    }

    pub fn aria_sort(&self) -> &'static str {
        match self.sorted {
            Some(SortDirection::Ascending) => "ascending",
            Some(SortDirection::Descending) => "descending",
            None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCell {
    pub text: String,
    pub href: Option<String>,
}
