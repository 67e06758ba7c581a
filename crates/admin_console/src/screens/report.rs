//! Revenue report: key performance indicators over confirmed payments.
//!
//! Only the website, payment method and date filters apply. The status is
//! pinned to "confirmed" and there is no table, so the query is keyed on the
//! filters alone and fetched without pagination.

use api_types::report::Report;

use crate::{
    filters::{FilterConfig, FilterState, STATUS_ID, SupportingData, SupportingSource},
    list_query::{ListFetcher, ListQuery, Resolution},
    query_key::{ColumnFilter, Pagination, QueryKey, SortModel, compose},
};

pub const REPORT: &str = "report";

/// Status id of confirmed transactions.
pub const CONFIRMED_STATUS_ID: &str = "8";

pub fn report_filters() -> FilterConfig {
    FilterConfig {
        filter_by_transaction: false,
        filter_by_status: false,
        ..FilterConfig::default()
    }
}

/// Values shown on the indicator cards. Missing figures read as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Indicators {
    pub total_revenue: f64,
    pub net_revenue: f64,
    pub currency: Option<String>,
    pub confirmed_payments: u64,
    pub refund_sum: f64,
    pub refund_count: u64,
}

impl From<&Report> for Indicators {
    fn from(report: &Report) -> Self {
        Self {
            total_revenue: report.total_revenue,
            net_revenue: report.net_revenue,
            currency: report.currency_iso_code.clone(),
            confirmed_payments: report.confirmed_count(),
            refund_sum: report.total_refund.sum,
            refund_count: report.total_refund.count,
        }
    }
}

#[derive(Debug)]
pub struct ReportScreen {
    merchant_id: Option<String>,
    pub filters: FilterState,
    pub supporting: Option<SupportingData>,
    query: ListQuery<Report>,
}

impl ReportScreen {
    pub fn new(merchant_id: Option<String>) -> Self {
        Self {
            merchant_id,
            filters: FilterState::new(report_filters()),
            supporting: None,
            query: ListQuery::new(),
        }
    }

    pub fn key(&self) -> QueryKey {
        let merchant = self.merchant_id.as_deref().unwrap_or("");
        compose(
            REPORT,
            Pagination::default(),
            &self.filters.snapshot(),
            &ColumnFilter::default(),
            &SortModel::default(),
            &[merchant],
        )
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset_filters();
    }

    pub async fn load_supporting<S: SupportingSource>(&mut self, source: &S) {
        let data = self
            .filters
            .load_supporting(source, self.merchant_id.as_deref())
            .await;
        self.supporting = Some(data);
    }

    /// Refetches when the filters changed since the last fetch.
    pub async fn sync<F: ListFetcher<Report>>(&mut self, fetcher: &F) -> Option<Resolution> {
        let key = self.key();
        let ticket = self.query.request(key, true)?;
        let mut params = ticket.key().unpaged_params();
        params.push((STATUS_ID.to_string(), CONFIRMED_STATUS_ID.to_string()));
        let result = fetcher.fetch(params).await;
        Some(self.query.resolve(ticket, result))
    }

    /// The last report received. Kept while a new one loads.
    pub fn report(&self) -> Option<&Report> {
        self.query.rows().first()
    }

    pub fn indicators(&self) -> Indicators {
        self.report().map(Indicators::from).unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.query.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.query.error()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use api_types::{
        list::{ListResult, RowsPage},
        transaction::TransactionStatus,
        website::{PaymentMethod, Website},
    };

    use super::*;
    use crate::{client::ClientError, filters::ALL};

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl Recording {
        fn calls(&self) -> Vec<Vec<(String, String)>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ListFetcher<Report> for Recording {
        async fn fetch(&self, params: Vec<(String, String)>) -> Result<ListResult<Report>, ClientError> {
            self.calls.lock().unwrap().push(params);
            Ok(Report {
                total_revenue: 250.0,
                net_revenue: 200.0,
                currency_iso_code: Some("TND".to_string()),
                transactions: Some(RowsPage {
                    rows: Vec::new(),
                    count: "5".into(),
                }),
                ..Report::default()
            }
            .into())
        }
    }

    #[derive(Default)]
    struct CountingSource {
        methods: AtomicUsize,
        statuses: AtomicUsize,
    }

    impl SupportingSource for CountingSource {
        async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, ClientError> {
            self.methods.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn transaction_statuses(&self) -> Result<Vec<TransactionStatus>, ClientError> {
            self.statuses.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn merchant_websites(&self, _merchant_id: &str) -> Result<Vec<Website>, ClientError> {
            Ok(Vec::new())
        }
    }

    fn names(params: &[(String, String)]) -> Vec<&str> {
        params.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[tokio::test]
    async fn disabled_dimensions_are_never_sent_nor_loaded() {
        let source = CountingSource::default();
        let mut screen = ReportScreen::new(Some("m1".to_string()));
        screen.load_supporting(&source).await;
        assert_eq!(source.statuses.load(Ordering::SeqCst), 0);
        assert_eq!(source.methods.load(Ordering::SeqCst), 1);

        screen.filters.set_status("3");
        screen.filters.set_transaction_draft("tx-1");
        screen.filters.search_transaction();

        let fetcher = Recording::default();
        screen.sync(&fetcher).await;
        let calls = fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(names(&calls[0]), ["statusId"]);
        assert_eq!(calls[0][0].1, CONFIRMED_STATUS_ID);
        assert!(!names(&calls[0]).contains(&"page"));
    }

    #[tokio::test]
    async fn filter_change_refetches_and_keeps_previous_report() {
        let fetcher = Recording::default();
        let mut screen = ReportScreen::new(Some("m1".to_string()));
        assert_eq!(screen.indicators(), Indicators::default());

        assert_eq!(screen.sync(&fetcher).await, Some(Resolution::Applied));
        assert_eq!(screen.sync(&fetcher).await, None);

        let indicators = screen.indicators();
        assert_eq!(indicators.total_revenue, 250.0);
        assert_eq!(indicators.currency.as_deref(), Some("TND"));
        assert_eq!(indicators.confirmed_payments, 5);

        screen.filters.set_payment_method("pm1");
        let key = screen.key();
        let ticket = screen.query.request(key, true).unwrap();
        // Still showing the previous figures while the new report loads.
        assert!(screen.is_loading());
        assert_eq!(screen.indicators().net_revenue, 200.0);
        screen.query.resolve(ticket, fetcher.fetch(Vec::new()).await);

        screen.filters.set_website("w1");
        assert_eq!(screen.sync(&fetcher).await, Some(Resolution::Applied));
        let last = fetcher.calls().pop().unwrap();
        assert!(last.contains(&("websiteId".to_string(), "w1".to_string())));
        assert!(last.contains(&("paymentMethodId".to_string(), "pm1".to_string())));

        screen.filters.set_website(ALL);
        screen.reset_filters();
        assert_eq!(screen.sync(&fetcher).await, Some(Resolution::Applied));
        assert_eq!(fetcher.calls().len(), 4);
    }
}
