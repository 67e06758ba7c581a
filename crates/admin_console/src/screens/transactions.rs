//! Transaction history: filter bar, table, bank-transfer approval and CSV
//! export.

use std::io;

use api_types::transaction::Transaction;

use crate::{
    client::ClientError,
    error::Result,
    export::{TransactionRecord, fetch_all, write_csv},
    filters::{FilterConfig, FilterState, SupportingData, SupportingSource},
    list_query::{ListFetcher, Resolution},
    mutation::{
        DialogState, MutationAction, MutationCoordinator, MutationOutcome, ServerOutcome, Toasts,
        ValidationError,
    },
    query_key::{ColumnFilter, QueryKey},
};

use super::Table;

pub const TRANSACTIONS: &str = "transactions";

#[derive(Debug)]
pub struct TransactionsScreen {
    merchant_id: Option<String>,
    pub filters: FilterState,
    pub table: Table<Transaction>,
    pub supporting: Option<SupportingData>,
    pub approval: DialogState<Transaction>,
    pub toasts: Toasts,
    coordinator: MutationCoordinator,
    exporting: bool,
}

impl TransactionsScreen {
    pub fn new(merchant_id: Option<String>, page_size: u32) -> Self {
        Self {
            merchant_id,
            filters: FilterState::new(FilterConfig::default()),
            table: Table::new(TRANSACTIONS, page_size),
            supporting: None,
            approval: DialogState::default(),
            toasts: Toasts::default(),
            coordinator: MutationCoordinator::new(),
            exporting: false,
        }
    }

    pub fn merchant_id(&self) -> Option<&str> {
        self.merchant_id.as_deref()
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn key(&self) -> QueryKey {
        self.table.key(&self.filters.snapshot(), &[])
    }

    /// Clears the filter bar and the column filter, back to page 1.
    pub fn reset_filters(&mut self) {
        let pagination = &mut self.table.pagination;
        self.filters.reset_filters_then(|| pagination.reset());
        self.table.column_filter = ColumnFilter::default();
    }

    pub async fn load_supporting<S: SupportingSource>(&mut self, source: &S) {
        let data = self
            .filters
            .load_supporting(source, self.merchant_id.as_deref())
            .await;
        self.supporting = Some(data);
    }

    pub async fn sync<F: ListFetcher<Transaction>>(&mut self, fetcher: &F) -> Option<Resolution> {
        let filters = self.filters.snapshot();
        self.table.sync(&filters, &[], true, fetcher).await
    }

    pub fn open_approval(&mut self, transaction: Transaction) {
        self.approval.open_for(transaction);
    }

    /// Completes the bank transfer of the transaction the dialog was opened
    /// for. `complete` receives its id.
    pub async fn approve<F, Fut, R>(&mut self, complete: F) -> MutationOutcome
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = std::result::Result<R, ClientError>>,
        R: ServerOutcome,
    {
        let Some(transaction_id) = self.approval.current().map(|tx| tx.id.clone()) else {
            return MutationOutcome::Invalid(ValidationError::NoSelection);
        };
        self.coordinator
            .execute(
                MutationAction::CompleteBankTransfer,
                complete(transaction_id),
                &mut self.approval,
                Some(&mut self.table.query),
                &mut self.toasts,
            )
            .await
    }

    /// Writes every transaction matching the current filters as CSV.
    /// Pagination, column filter and sort are not applied.
    pub async fn export<F, W>(&mut self, fetcher: &F, writer: W) -> Result<usize>
    where
        F: ListFetcher<Transaction>,
        W: io::Write,
    {
        self.exporting = true;
        let rows = fetch_all(fetcher, &self.filters.snapshot()).await;
        self.exporting = false;

        let rows = rows?;
        let count = rows.len();
        write_csv(writer, rows.into_iter().map(TransactionRecord::from))?;
        tracing::info!(rows = count, "transactions exported");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use api_types::list::ListResult;

    use super::*;
    use crate::query_key::SortDirection;

    fn tx(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            amount: 10.0,
            currency: None,
            status: Some("PENDING".to_string()),
            created_at: None,
            website: None,
            payment_method: None,
            customer_email: None,
        }
    }

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl ListFetcher<Transaction> for Recording {
        async fn fetch(
            &self,
            params: Vec<(String, String)>,
        ) -> std::result::Result<ListResult<Transaction>, ClientError> {
            self.calls.lock().unwrap().push(params);
            Ok(ListResult {
                content: vec![tx("t1"), tx("t2")],
                rows_length: "37".into(),
            })
        }
    }

    #[tokio::test]
    async fn filter_change_refetches_and_reset_goes_back_to_first_page() {
        let mut screen = TransactionsScreen::new(Some("m1".to_string()), 10);
        let fetcher = Recording::default();

        assert_eq!(screen.sync(&fetcher).await, Some(Resolution::Applied));
        assert_eq!(screen.table.page_count(), 4);

        screen.table.on_page_change(2);
        screen.filters.set_status("CONFIRMED");
        screen.table.on_sort_change(Some(("createdAt", SortDirection::Desc)));
        screen.sync(&fetcher).await;

        screen.reset_filters();
        assert_eq!(screen.table.pagination.page(), 1);
        assert!(screen.filters.status_id().is_none());
        screen.sync(&fetcher).await;
        // Unchanged key: no fetch.
        assert_eq!(screen.sync(&fetcher).await, None);

        let calls = fetcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].contains(&("page".to_string(), "3".to_string())));
        assert!(calls[1].contains(&("statusId".to_string(), "CONFIRMED".to_string())));
        assert!(calls[2].contains(&("page".to_string(), "1".to_string())));
        assert!(calls[2].iter().all(|(name, _)| name != "statusId"));
    }

    #[tokio::test]
    async fn approval_invalidates_the_list() {
        let mut screen = TransactionsScreen::new(None, 10);
        let fetcher = Recording::default();
        screen.sync(&fetcher).await;

        screen.open_approval(tx("t2"));
        let outcome = screen
            .approve(|id| async move {
                assert_eq!(id, "t2");
                Ok::<_, ClientError>(())
            })
            .await;
        assert_eq!(outcome, MutationOutcome::Succeeded);
        assert!(!screen.approval.is_open());

        assert_eq!(screen.sync(&fetcher).await, Some(Resolution::Applied));
        assert_eq!(fetcher.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn approval_without_a_row_sends_nothing() {
        let mut screen = TransactionsScreen::new(None, 10);
        let outcome = screen
            .approve(|_| async { Ok::<_, ClientError>(()) })
            .await;
        assert_eq!(outcome, MutationOutcome::Invalid(ValidationError::NoSelection));
    }

    #[tokio::test]
    async fn export_writes_every_row() {
        let mut screen = TransactionsScreen::new(None, 10);
        let fetcher = Recording::default();
        let mut out = Vec::new();

        let count = screen.export(&fetcher, &mut out).await.unwrap();
        assert_eq!(count, 2);
        assert!(!screen.is_exporting());
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);
    }
}
