//! Generic controller keeping a remote list in sync with a [`QueryKey`].
//!
//! The controller fetches on the first request and whenever the key changes,
//! and stays idle otherwise. Each fetch is identified by a [`FetchTicket`];
//! only the ticket of the latest fetch may write the result, so a slow
//! response for an older key is dropped instead of overwriting newer data.
//!
//! There is no cancellation: a superseded fetch still runs to completion and
//! its result is discarded in [`ListQuery::resolve`].

use api_types::list::ListResult;

use crate::{client::ClientError, query_key::QueryKey};

/// A per-resource fetch function.
pub trait ListFetcher<T> {
    fn fetch(
        &self,
        params: Vec<(String, String)>,
    ) -> impl Future<Output = Result<ListResult<T>, ClientError>> + Send;
}

/// Handle of one issued fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    key: QueryKey,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Transport parameters of the paginated request.
    pub fn params(&self) -> Vec<(String, String)> {
        self.key.params()
    }
}

/// What happened to a completed fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Failed(String),
    /// A newer fetch was issued, or the query got disabled, meanwhile.
    Discarded,
}

#[derive(Debug)]
pub struct ListQuery<T> {
    key: Option<QueryKey>,
    data: Option<ListResult<T>>,
    total_rows: u64,
    loading: bool,
    error: Option<String>,
    generation: u64,
    stale: bool,
}

impl<T> Default for ListQuery<T> {
    fn default() -> Self {
        Self {
            key: None,
            data: None,
            total_rows: 0,
            loading: false,
            error: None,
            generation: 0,
            stale: false,
        }
    }
}

impl<T> ListQuery<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of the last successful fetch. Kept while a new key loads.
    pub fn rows(&self) -> &[T] {
        self.data
            .as_ref()
            .map(|data| data.content.as_slice())
            .unwrap_or(&[])
    }

    pub fn data(&self) -> Option<&ListResult<T>> {
        self.data.as_ref()
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn key(&self) -> Option<&QueryKey> {
        self.key.as_ref()
    }

    /// Forces the next request to fetch even if the key is unchanged.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Issues a fetch for `key` when needed.
    ///
    /// Returns `None` when disabled, or when `key` is the current key and the
    /// query was not invalidated.
    pub fn request(&mut self, key: QueryKey, enabled: bool) -> Option<FetchTicket> {
        if !enabled {
            self.disable();
            return None;
        }
        if self.key.as_ref() == Some(&key) && !self.stale {
            return None;
        }

        self.generation += 1;
        self.key = Some(key.clone());
        self.stale = false;
        self.loading = true;
        tracing::debug!(
            resource = %key.resource,
            page = key.pagination.page(),
            generation = self.generation,
            "list fetch issued"
        );
        Some(FetchTicket {
            generation: self.generation,
            key,
        })
    }

    /// Suppresses fetching. Data already shown is kept; a fetch still in
    /// flight will be discarded when it completes.
    pub fn disable(&mut self) {
        if self.loading {
            self.generation += 1;
            self.loading = false;
            self.key = None;
        }
    }

    /// Applies the outcome of a fetch if its ticket is still the latest one.
    pub fn resolve(
        &mut self,
        ticket: FetchTicket,
        result: Result<ListResult<T>, ClientError>,
    ) -> Resolution {
        if ticket.generation != self.generation {
            tracing::debug!(
                resource = %ticket.key.resource,
                generation = ticket.generation,
                current = self.generation,
                "discarding superseded list response"
            );
            return Resolution::Discarded;
        }

        self.loading = false;
        match result {
            Ok(data) => {
                self.total_rows = match data.rows_length.normalize() {
                    Some(total) => total,
                    None => {
                        tracing::warn!(
                            resource = %ticket.key.resource,
                            rows_length = ?data.rows_length,
                            "non-numeric row count, falling back to 0"
                        );
                        0
                    }
                };
                self.data = Some(data);
                self.error = None;
                Resolution::Applied
            }
            Err(err) => {
                tracing::warn!(resource = %ticket.key.resource, "list fetch failed: {err}");
                let message = err.user_message();
                self.error = Some(message.clone());
                Resolution::Failed(message)
            }
        }
    }

    /// Requests `key` and, if a fetch is due, runs it through `fetcher`.
    pub async fn sync<F: ListFetcher<T>>(
        &mut self,
        key: QueryKey,
        enabled: bool,
        fetcher: &F,
    ) -> Option<Resolution> {
        let ticket = self.request(key, enabled)?;
        let result = fetcher.fetch(ticket.params()).await;
        Some(self.resolve(ticket, result))
    }
}
