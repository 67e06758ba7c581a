//! List screens assembled from the generic pieces.
//!
//! Every screen owns one or more [`Table`]s (pagination, column filter, sort
//! and a [`ListQuery`]) and routes table events through them, so none of
//! them re-implements the key composition or fetch bookkeeping.

use crate::{
    list_query::{ListFetcher, ListQuery, Resolution},
    query_key::{
        ColumnFilter, FilterSnapshot, Pagination, QueryKey, SortDirection, SortModel, compose,
    },
};

pub mod merchants;
pub mod report;
pub mod transactions;
pub mod wallets;
pub mod websites;
pub mod withdraw;

pub use merchants::MerchantsScreen;
pub use report::ReportScreen;
pub use transactions::TransactionsScreen;
pub use wallets::WalletsScreen;
pub use websites::WebsitesScreen;
pub use withdraw::WithdrawForm;

/// What an editor dialog was opened for.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorMode<T> {
    Create,
    Edit(T),
}

/// UI state of one paginated table and the query backing it.
#[derive(Debug)]
pub struct Table<T> {
    resource: &'static str,
    pub pagination: Pagination,
    pub column_filter: ColumnFilter,
    pub sort: SortModel,
    pub query: ListQuery<T>,
}

impl<T> Table<T> {
    pub fn new(resource: &'static str, page_size: u32) -> Self {
        Self {
            resource,
            pagination: Pagination::first(page_size),
            column_filter: ColumnFilter::default(),
            sort: SortModel::default(),
            query: ListQuery::new(),
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// Tables report 0-based page indexes.
    pub fn on_page_change(&mut self, ui_page: u32) {
        self.pagination.set_ui_page(ui_page);
    }

    pub fn on_page_size_change(&mut self, page_size: u32) {
        self.pagination.set_page_size(page_size);
    }

    pub fn on_filter_change(&mut self, field: &str, operator: &str, value: &str) {
        self.column_filter = ColumnFilter::compose(field, operator, value);
    }

    /// `None` clears the sort.
    pub fn on_sort_change(&mut self, sort: Option<(&str, SortDirection)>) {
        match sort {
            Some((field, direction)) => self.sort.select(field, direction),
            None => self.sort.clear(),
        }
    }

    pub fn key(&self, filters: &FilterSnapshot, selection: &[&str]) -> QueryKey {
        compose(
            self.resource,
            self.pagination,
            filters,
            &self.column_filter,
            &self.sort,
            selection,
        )
    }

    pub fn page_count(&self) -> u64 {
        self.pagination.page_count(self.query.total_rows())
    }

    pub async fn sync<F: ListFetcher<T>>(
        &mut self,
        filters: &FilterSnapshot,
        selection: &[&str],
        enabled: bool,
        fetcher: &F,
    ) -> Option<Resolution> {
        let key = self.key(filters, selection);
        self.query.sync(key, enabled, fetcher).await
    }
}
