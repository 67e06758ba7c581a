//! Query identity for list requests.
//!
//! A [`QueryKey`] is a plain value: two keys built from the same semantic
//! inputs compare equal no matter how they were assembled, and any change to
//! a filter, the sort, the page or the page size yields a different key.
//! Maps are ordered so that equality, hashing and the transport parameter
//! order are all deterministic.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A closed date interval. `end` is already the last instant of its day.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Text(String),
    Range(DateRange),
}

/// Current value of every set filter dimension, keyed by transport name.
///
/// Unset dimensions are absent, never stored as a sentinel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterSnapshot(BTreeMap<String, FilterValue>);

impl FilterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: Option<FilterValue>) {
        match value {
            Some(value) => {
                self.0.insert(name.to_string(), value);
            }
            None => {
                self.0.remove(name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Date ranges expand to `startDate`/`endDate` in UTC with millisecond
    /// precision.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            match value {
                FilterValue::Text(text) => out.push((name.clone(), text.clone())),
                FilterValue::Range(range) => {
                    out.push(("startDate".to_string(), utc_millis(&range.start)));
                    out.push(("endDate".to_string(), utc_millis(&range.end)));
                }
            }
        }
        out
    }
}

fn utc_millis(at: &DateTime<Tz>) -> String {
    at.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Operator picked in a column filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    Contains,
    Equals,
    Other(String),
}

impl From<&str> for FilterOperator {
    fn from(value: &str) -> Self {
        match value {
            "contains" => Self::Contains,
            "equals" => Self::Equals,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The single active column filter of a table, already in transport form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColumnFilter(BTreeMap<String, String>);

impl ColumnFilter {
    /// `contains` filters on `{field}_like`, `equals` on `{field}`. Any other
    /// operator drops the column filter altogether.
    pub fn compose(field: &str, operator: impl Into<FilterOperator>, value: &str) -> Self {
        let mut map = BTreeMap::new();
        match operator.into() {
            FilterOperator::Contains => {
                map.insert(format!("{field}_like"), value.to_string());
            }
            FilterOperator::Equals => {
                map.insert(field.to_string(), value.to_string());
            }
            FilterOperator::Other(op) => {
                tracing::debug!(operator = %op, field, "unsupported column filter operator, clearing filter");
            }
        }
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn params(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// At most one active sort.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SortModel(Option<SortSpec>);

impl SortModel {
    pub fn by(field: &str, direction: SortDirection) -> Self {
        let mut model = Self::default();
        model.select(field, direction);
        model
    }

    /// Replaces any previous sort.
    pub fn select(&mut self, field: &str, direction: SortDirection) {
        self.0 = Some(SortSpec {
            field: field.to_string(),
            direction,
        });
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn spec(&self) -> Option<&SortSpec> {
        self.0.as_ref()
    }

    pub fn params(&self) -> Vec<(String, String)> {
        match &self.0 {
            Some(spec) => vec![
                ("_sort".to_string(), spec.field.clone()),
                ("_order".to_string(), spec.direction.as_str().to_string()),
            ],
            None => Vec::new(),
        }
    }
}

/// Largest UI page index whose transport page still fits a `u32`.
pub const MAX_UI_PAGE: u32 = u32::MAX - 1;

fn transport_page(ui_page: u32) -> u32 {
    ui_page.min(MAX_UI_PAGE) + 1
}

/// Page position of a list.
///
/// `page` is 1-based, as the transport expects. Tables report a 0-based
/// index; go through [`Pagination::set_ui_page`] and [`Pagination::ui_page`]
/// at that boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn from_ui(ui_page: u32, page_size: u32) -> Self {
        Self {
            page: transport_page(ui_page),
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn ui_page(&self) -> u32 {
        self.page - 1
    }

    pub fn set_ui_page(&mut self, ui_page: u32) {
        self.page = transport_page(ui_page);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn page_count(&self, total_rows: u64) -> u64 {
        total_rows.div_ceil(u64::from(self.page_size))
    }

    pub fn params(&self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("perPage".to_string(), self.page_size.to_string()),
        ]
    }
}

/// Composite identity of a list request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: String,
    pub pagination: Pagination,
    pub filters: FilterSnapshot,
    pub column_filter: ColumnFilter,
    pub sort: SortModel,
    /// Ids of the upstream selections this query depends on.
    pub selection: Vec<String>,
}

/// Builds the key of a list request. Pure: equal inputs give equal keys.
pub fn compose(
    resource: &str,
    pagination: Pagination,
    filters: &FilterSnapshot,
    column_filter: &ColumnFilter,
    sort: &SortModel,
    selection: &[&str],
) -> QueryKey {
    QueryKey {
        resource: resource.to_string(),
        pagination,
        filters: filters.clone(),
        column_filter: column_filter.clone(),
        sort: sort.clone(),
        selection: selection.iter().map(|id| id.to_string()).collect(),
    }
}

impl QueryKey {
    /// Query parameters of the paginated request, in transport order.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut out = self.pagination.params();
        out.extend(self.unpaged_params());
        out
    }

    /// Same filters and sort without pagination, for bulk fetches.
    pub fn unpaged_params(&self) -> Vec<(String, String)> {
        let mut out = self.filters.params();
        out.extend(self.column_filter.params());
        out.extend(self.sort.params());
        out
    }
}
