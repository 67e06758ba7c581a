//! Filter state shared by the list screens.
//!
//! Each dimension can be switched off per screen through [`FilterConfig`]. A
//! switched-off dimension is not only hidden: its setter is ignored and the
//! supporting data that would populate its selector is never fetched.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone};
use chrono_tz::Tz;

use api_types::{
    transaction::TransactionStatus,
    website::{PaymentMethod, Website},
};

use crate::{
    client::ClientError,
    query_key::{DateRange, FilterSnapshot, FilterValue},
};

/// Selector value meaning "no filter".
pub const ALL: &str = "all";

pub const TRANSACTION_ID: &str = "transactionId";
pub const WEBSITE_ID: &str = "websiteId";
pub const PAYMENT_METHOD_ID: &str = "paymentMethodId";
pub const STATUS_ID: &str = "statusId";
pub const DATE_RANGE: &str = "dateRange";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterConfig {
    pub filter_by_transaction: bool,
    pub filter_by_status: bool,
    pub filter_by_payment_methods: bool,
    pub filter_by_date: bool,
    pub filter_by_website_id: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filter_by_transaction: true,
            filter_by_status: true,
            filter_by_payment_methods: true,
            filter_by_date: true,
            filter_by_website_id: true,
        }
    }
}

impl FilterConfig {
    pub fn none() -> Self {
        Self {
            filter_by_transaction: false,
            filter_by_status: false,
            filter_by_payment_methods: false,
            filter_by_date: false,
            filter_by_website_id: false,
        }
    }
}

/// Last instant of the calendar day of `at`, in its own timezone.
///
/// Computed as the start of the next day minus one millisecond, so days that
/// are shortened or lengthened by a DST change are still covered entirely.
pub fn end_of_day(at: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = at.timezone();
    let next = at.date_naive().succ_opt()?.and_hms_opt(0, 0, 0)?;
    let start_of_next = tz
        .from_local_datetime(&next)
        .earliest()
        // Midnight skipped by a DST gap.
        .or_else(|| tz.from_local_datetime(&(next + TimeDelta::hours(1))).earliest())?;
    Some(start_of_next - TimeDelta::milliseconds(1))
}

/// State of the date range picker control.
///
/// Opening and closing the control never touches the filter; only
/// [`FilterState::confirm_range`] does.
#[derive(Clone, Debug, Default)]
pub struct DatePicker {
    open: bool,
    value: Option<(DateTime<Tz>, DateTime<Tz>)>,
}

impl DatePicker {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Range as drawn by the user, before end-of-day normalisation.
    pub fn value(&self) -> Option<&(DateTime<Tz>, DateTime<Tz>)> {
        self.value.as_ref()
    }
}

/// Which supporting lists a screen may fetch for its selectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupportingQueries {
    pub methods: bool,
    pub statuses: bool,
    pub websites: bool,
}

/// Source of the data that populates the filter selectors.
pub trait SupportingSource {
    fn payment_methods(
        &self,
    ) -> impl Future<Output = Result<Vec<PaymentMethod>, ClientError>> + Send;
    fn transaction_statuses(
        &self,
    ) -> impl Future<Output = Result<Vec<TransactionStatus>, ClientError>> + Send;
    fn merchant_websites(
        &self,
        merchant_id: &str,
    ) -> impl Future<Output = Result<Vec<Website>, ClientError>> + Send;
}

#[derive(Clone, Debug)]
pub struct SupportingData {
    pub methods: Vec<PaymentMethod>,
    pub statuses: Vec<TransactionStatus>,
    pub websites: Vec<Website>,
}

/// Status list shown until (or instead of) the server list.
pub fn placeholder_statuses() -> Vec<TransactionStatus> {
    [
        (1, "PENDING", "gray"),
        (2, "PROCESSING", "#1565c0"),
        (3, "EXPIRED", "#d64045"),
        (4, "DECLINED", "#d64045"),
        (5, "DENIED", "darkmagenta"),
        (6, "CANCELLED", "orange"),
        (7, "COMPLETED", "#02c39a"),
        (8, "CONFIRMED", "#2d8062"),
        (9, "REFUNDED", "deeppink"),
        (10, "FAILED", "brown"),
    ]
    .into_iter()
    .map(|(id, label, color)| TransactionStatus {
        id,
        label: label.to_string(),
        color: Some(color.to_string()),
    })
    .collect()
}

#[derive(Clone, Debug, Default)]
pub struct FilterState {
    config: FilterConfig,
    transaction_draft: String,
    transaction_id: Option<String>,
    website_id: Option<String>,
    payment_method_id: Option<String>,
    status_id: Option<String>,
    date_range: Option<DateRange>,
    picker: DatePicker,
}

fn selector_value(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == ALL {
        None
    } else {
        Some(value.to_string())
    }
}

impl FilterState {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> FilterConfig {
        self.config
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn transaction_draft(&self) -> &str {
        &self.transaction_draft
    }

    pub fn website_id(&self) -> Option<&str> {
        self.website_id.as_deref()
    }

    pub fn payment_method_id(&self) -> Option<&str> {
        self.payment_method_id.as_deref()
    }

    pub fn status_id(&self) -> Option<&str> {
        self.status_id.as_deref()
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    pub fn picker(&self) -> &DatePicker {
        &self.picker
    }

    /// Edits the search box without applying it.
    pub fn set_transaction_draft(&mut self, text: &str) {
        if self.config.filter_by_transaction {
            self.transaction_draft = text.to_string();
        }
    }

    /// Applies the search box content.
    pub fn search_transaction(&mut self) {
        if self.config.filter_by_transaction {
            self.transaction_id = selector_value(&self.transaction_draft);
        }
    }

    pub fn clear_transaction(&mut self) {
        self.transaction_draft.clear();
        self.transaction_id = None;
    }

    /// The website selector is always shown; `filter_by_website_id` only
    /// decides whether the "all" entry is offered. Without it a website must
    /// stay selected, so "all" and empty values are ignored.
    pub fn set_website(&mut self, value: &str) {
        let selected = selector_value(value);
        if selected.is_none() && !self.config.filter_by_website_id {
            tracing::debug!("website selector has no \"all\" entry, keeping selection");
            return;
        }
        self.website_id = selected;
    }

    /// Entries of the website selector, "all" first when it is offered.
    pub fn website_choices<'a>(&self, websites: &'a [Website]) -> Vec<&'a str> {
        let all = self.config.filter_by_website_id.then_some(ALL);
        all.into_iter()
            .chain(websites.iter().map(|website| website.id.as_str()))
            .collect()
    }

    pub fn set_payment_method(&mut self, value: &str) {
        if self.config.filter_by_payment_methods {
            self.payment_method_id = selector_value(value);
        }
    }

    pub fn set_status(&mut self, value: &str) {
        if self.config.filter_by_status {
            self.status_id = selector_value(value);
        }
    }

    pub fn open_picker(&mut self) {
        if self.config.filter_by_date {
            self.picker.open = true;
        }
    }

    pub fn close_picker(&mut self) {
        self.picker.open = false;
    }

    /// Stores the picked range once both bounds are set, with the end moved
    /// to the last instant of its day.
    pub fn confirm_range(&mut self, start: Option<DateTime<Tz>>, end: Option<DateTime<Tz>>) {
        if !self.config.filter_by_date {
            return;
        }
        let (Some(start), Some(end)) = (start, end) else {
            return;
        };
        let Some(last_instant) = end_of_day(&end) else {
            tracing::warn!(%end, "cannot compute end of day, ignoring date range");
            return;
        };
        self.date_range = Some(DateRange {
            start: start.clone(),
            end: last_instant,
        });
        self.picker.value = Some((start, end));
    }

    /// Label of the date picker button, `None` when no range is set.
    pub fn picker_label(&self) -> Option<String> {
        self.date_range.as_ref()?;
        let (start, end) = self.picker.value.as_ref()?;
        Some(format!(
            "{} --> {}",
            start.format("%d/%m/%Y"),
            end.format("%d/%m/%Y")
        ))
    }

    /// Clears every dimension.
    pub fn reset_filters(&mut self) {
        self.transaction_draft.clear();
        self.transaction_id = None;
        self.website_id = None;
        self.payment_method_id = None;
        self.status_id = None;
        self.date_range = None;
        self.picker.value = None;
    }

    /// Clears every dimension, then runs `on_reset` once. Screens use it to
    /// bring pagination back to the first page together with the filters.
    pub fn reset_filters_then(&mut self, on_reset: impl FnOnce()) {
        self.reset_filters();
        on_reset();
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        let text = |value: &Option<String>| value.clone().map(FilterValue::Text);
        let mut snapshot = FilterSnapshot::new();
        snapshot.set(TRANSACTION_ID, text(&self.transaction_id));
        snapshot.set(WEBSITE_ID, text(&self.website_id));
        snapshot.set(PAYMENT_METHOD_ID, text(&self.payment_method_id));
        snapshot.set(STATUS_ID, text(&self.status_id));
        snapshot.set(DATE_RANGE, self.date_range.clone().map(FilterValue::Range));
        snapshot
    }

    pub fn supporting(&self, merchant_id: Option<&str>) -> SupportingQueries {
        let merchant = merchant_id.is_some_and(|id| !id.is_empty());
        SupportingQueries {
            methods: self.config.filter_by_payment_methods,
            statuses: merchant && self.config.filter_by_status,
            websites: merchant,
        }
    }

    /// Fetches the selector lists allowed by [`FilterState::supporting`].
    ///
    /// Failures leave the corresponding list empty (statuses keep the
    /// placeholder list).
    pub async fn load_supporting<S: SupportingSource>(
        &self,
        source: &S,
        merchant_id: Option<&str>,
    ) -> SupportingData {
        let gates = self.supporting(merchant_id);
        let mut data = SupportingData {
            methods: Vec::new(),
            statuses: placeholder_statuses(),
            websites: Vec::new(),
        };

        if gates.methods {
            match source.payment_methods().await {
                Ok(methods) => data.methods = methods,
                Err(err) => tracing::warn!("failed to load payment methods: {err}"),
            }
        }
        if gates.statuses {
            match source.transaction_statuses().await {
                Ok(statuses) => data.statuses = statuses,
                Err(err) => tracing::warn!("failed to load transaction statuses: {err}"),
            }
        }
        if let (true, Some(merchant_id)) = (gates.websites, merchant_id) {
            match source.merchant_websites(merchant_id).await {
                Ok(websites) => data.websites = websites,
                Err(err) => tracing::warn!("failed to load websites: {err}"),
            }
        }
        data
    }
}

/// Convenience for tests and callers holding a plain date.
pub fn local_date(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_hms_opt(hour, minute, 0)?)
        .earliest()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Timelike;

    use super::*;

    fn rome() -> Tz {
        "Europe/Rome".parse().unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn all_sentinel_is_never_stored() {
        let mut filters = FilterState::new(FilterConfig::default());
        filters.set_status("8");
        assert_eq!(filters.status_id(), Some("8"));

        filters.set_status(ALL);
        assert_eq!(filters.status_id(), None);
        assert!(filters.snapshot().get(STATUS_ID).is_none());

        filters.set_website(ALL);
        filters.set_payment_method(ALL);
        assert!(filters.snapshot().is_empty());
    }

    #[test]
    fn disabled_dimensions_ignore_setters() {
        let mut filters = FilterState::new(FilterConfig {
            filter_by_status: false,
            filter_by_date: false,
            ..FilterConfig::default()
        });
        filters.set_status("3");
        let at = local_date(rome(), day(2024, 6, 5), 10, 0);
        filters.confirm_range(at.clone(), at);
        filters.open_picker();

        assert_eq!(filters.status_id(), None);
        assert!(filters.date_range().is_none());
        assert!(!filters.picker().is_open());
    }

    #[test]
    fn website_selector_without_all_keeps_a_selection() {
        let websites = vec![
            Website {
                id: "w1".to_string(),
                ..Website::default()
            },
            Website {
                id: "w2".to_string(),
                ..Website::default()
            },
        ];

        let open = FilterState::new(FilterConfig::default());
        assert_eq!(open.website_choices(&websites), [ALL, "w1", "w2"]);

        let mut required = FilterState::new(FilterConfig {
            filter_by_website_id: false,
            ..FilterConfig::default()
        });
        assert_eq!(required.website_choices(&websites), ["w1", "w2"]);
        required.set_website("w2");
        required.set_website(ALL);
        required.set_website("");
        assert_eq!(required.website_id(), Some("w2"));
        required.set_website("w1");
        assert_eq!(required.website_id(), Some("w1"));
    }

    #[test]
    fn end_bound_is_last_instant_of_day() {
        for (hour, minute) in [(0, 0), (9, 30), (14, 45), (23, 59)] {
            let mut filters = FilterState::new(FilterConfig::default());
            let start = local_date(rome(), day(2024, 6, 1), 0, 0);
            let end = local_date(rome(), day(2024, 6, 5), hour, minute);
            filters.confirm_range(start, end);

            let range = filters.date_range().unwrap();
            assert_eq!(range.end.date_naive(), day(2024, 6, 5));
            assert_eq!(
                (range.end.hour(), range.end.minute(), range.end.second()),
                (23, 59, 59)
            );
            assert_eq!(range.end.timestamp_subsec_millis(), 999);
        }
    }

    #[test]
    fn end_of_day_covers_dst_days() {
        // 2024-03-31 is 23 hours long in Rome.
        let at = local_date(rome(), day(2024, 3, 31), 12, 0).unwrap();
        let end = end_of_day(&at).unwrap();
        assert_eq!(end.date_naive(), day(2024, 3, 31));
        assert_eq!((end.hour(), end.minute()), (23, 59));
    }

    #[test]
    fn range_needs_both_bounds() {
        let mut filters = FilterState::new(FilterConfig::default());
        filters.confirm_range(local_date(rome(), day(2024, 6, 1), 0, 0), None);
        assert!(filters.date_range().is_none());
        assert!(filters.picker_label().is_none());
    }

    #[test]
    fn reopening_the_picker_keeps_the_snapshot() {
        let mut filters = FilterState::new(FilterConfig::default());
        filters.confirm_range(
            local_date(rome(), day(2024, 6, 1), 0, 0),
            local_date(rome(), day(2024, 6, 5), 0, 0),
        );
        let before = filters.snapshot();

        filters.open_picker();
        assert!(filters.picker().is_open());
        assert_eq!(filters.snapshot(), before);
        filters.close_picker();
        assert_eq!(filters.snapshot(), before);
        assert_eq!(
            filters.picker_label().as_deref(),
            Some("01/06/2024 --> 05/06/2024")
        );
    }

    #[test]
    fn search_box_applies_only_on_search() {
        let mut filters = FilterState::new(FilterConfig::default());
        filters.set_transaction_draft("tx-42");
        assert_eq!(filters.transaction_id(), None);
        filters.search_transaction();
        assert_eq!(filters.transaction_id(), Some("tx-42"));
        filters.clear_transaction();
        assert_eq!(filters.transaction_id(), None);
        assert_eq!(filters.transaction_draft(), "");
    }

    #[test]
    fn reset_clears_everything_and_calls_back_once() {
        let mut filters = FilterState::new(FilterConfig::default());
        filters.set_transaction_draft("tx");
        filters.search_transaction();
        filters.set_website("w1");
        filters.set_payment_method("pm");
        filters.set_status("8");
        filters.confirm_range(
            local_date(rome(), day(2024, 6, 1), 0, 0),
            local_date(rome(), day(2024, 6, 5), 0, 0),
        );

        let mut calls = 0;
        filters.reset_filters_then(|| calls += 1);

        assert_eq!(calls, 1);
        assert!(filters.snapshot().is_empty());
        assert_eq!(filters.transaction_draft(), "");
        assert!(filters.picker().value().is_none());
    }

    #[derive(Default)]
    struct CountingSource {
        methods: AtomicUsize,
        statuses: AtomicUsize,
        websites: AtomicUsize,
    }

    impl SupportingSource for CountingSource {
        async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, ClientError> {
            self.methods.fetch_add(1, Ordering::SeqCst);
            Ok(vec![PaymentMethod {
                id: "pm1".to_string(),
                name: "Card".to_string(),
            }])
        }

        async fn transaction_statuses(&self) -> Result<Vec<TransactionStatus>, ClientError> {
            self.statuses.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Server("boom".to_string()))
        }

        async fn merchant_websites(&self, _merchant_id: &str) -> Result<Vec<Website>, ClientError> {
            self.websites.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn disabled_dimensions_fetch_no_supporting_data() {
        let source = CountingSource::default();
        let filters = FilterState::new(FilterConfig::none());
        let data = filters.load_supporting(&source, None).await;

        assert_eq!(source.methods.load(Ordering::SeqCst), 0);
        assert_eq!(source.statuses.load(Ordering::SeqCst), 0);
        assert_eq!(source.websites.load(Ordering::SeqCst), 0);
        assert!(data.methods.is_empty());
        assert_eq!(data.statuses.len(), 10);
    }

    #[tokio::test]
    async fn enabled_dimensions_fetch_supporting_data() {
        let source = CountingSource::default();
        let filters = FilterState::new(FilterConfig::default());
        let data = filters.load_supporting(&source, Some("m1")).await;

        assert_eq!(source.methods.load(Ordering::SeqCst), 1);
        assert_eq!(source.statuses.load(Ordering::SeqCst), 1);
        assert_eq!(source.websites.load(Ordering::SeqCst), 1);
        assert_eq!(data.methods.len(), 1);
        // Failed status fetch keeps the placeholder list.
        assert_eq!(data.statuses[7].label, "CONFIRMED");
    }
}
