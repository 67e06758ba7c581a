//! Website → wallet → detail selection chain and the three wallet queries
//! hanging off it.
//!
//! The chain is a single tagged value, so a wallet without a website or an
//! open detail view without a wallet cannot be represented. Each transition
//! disables the queries whose dependency changed; responses still in flight
//! for the old selection are then discarded by [`ListQuery::resolve`].

use api_types::{
    list::ListResult,
    wallet::{Wallet, WalletHistoryEntry, WalletTransaction},
    website::Website,
};
use thiserror::Error;

use crate::{
    client::{ClientError, WalletClient},
    list_query::{FetchTicket, ListFetcher, ListQuery, Resolution},
    query_key::{ColumnFilter, FilterSnapshot, Pagination, QueryKey, SortModel, compose},
    resources::{WalletHistoryFetcher, WalletTransactionsFetcher, WalletsFetcher},
    signer::SigningContext,
};

pub const WALLETS: &str = "wallets";
pub const WALLET_TRANSACTIONS: &str = "walletTransactions";
pub const WALLET_HISTORY: &str = "walletHistory";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailView {
    Transactions,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("no website selected")]
    NoWebsite,
    #[error("no wallet selected")]
    NoWallet,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionChain {
    #[default]
    NoWebsite,
    WebsiteSelected {
        website: Website,
    },
    WalletSelected {
        website: Website,
        wallet: Wallet,
    },
    DetailViewOpen {
        website: Website,
        wallet: Wallet,
        view: DetailView,
    },
}

impl SelectionChain {
    pub fn website(&self) -> Option<&Website> {
        match self {
            Self::NoWebsite => None,
            Self::WebsiteSelected { website }
            | Self::WalletSelected { website, .. }
            | Self::DetailViewOpen { website, .. } => Some(website),
        }
    }

    pub fn wallet(&self) -> Option<&Wallet> {
        match self {
            Self::WalletSelected { wallet, .. } | Self::DetailViewOpen { wallet, .. } => {
                Some(wallet)
            }
            _ => None,
        }
    }

    pub fn open_view(&self) -> Option<DetailView> {
        match self {
            Self::DetailViewOpen { view, .. } => Some(*view),
            _ => None,
        }
    }

    /// Selecting a website (even the same one) drops wallet and detail.
    pub fn select_website(&mut self, website: Website) {
        *self = Self::WebsiteSelected { website };
    }

    pub fn clear_website(&mut self) {
        *self = Self::NoWebsite;
    }

    /// Selects a wallet row, closing any open detail view.
    pub fn select_wallet(&mut self, wallet: Wallet) -> Result<(), ChainError> {
        let website = self.website().cloned().ok_or(ChainError::NoWebsite)?;
        *self = Self::WalletSelected { website, wallet };
        Ok(())
    }

    pub fn open_detail(&mut self, view: DetailView) -> Result<(), ChainError> {
        let website = self.website().cloned().ok_or(ChainError::NoWebsite)?;
        let wallet = self.wallet().cloned().ok_or(ChainError::NoWallet)?;
        *self = Self::DetailViewOpen {
            website,
            wallet,
            view,
        };
        Ok(())
    }

    /// Back to the wallet list; the wallet stays selected.
    pub fn close_detail(&mut self) {
        if let Self::DetailViewOpen {
            website, wallet, ..
        } = self
        {
            *self = Self::WalletSelected {
                website: website.clone(),
                wallet: wallet.clone(),
            };
        }
    }
}

/// The three dependent wallet queries and their shared selection chain.
#[derive(Debug, Default)]
pub struct WalletGraph {
    chain: SelectionChain,
    pub wallets: ListQuery<Wallet>,
    pub transactions: ListQuery<WalletTransaction>,
    pub history: ListQuery<WalletHistoryEntry>,
    pub wallets_page: Pagination,
    pub transactions_page: Pagination,
    pub history_page: Pagination,
}

impl WalletGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(&self) -> &SelectionChain {
        &self.chain
    }

    pub fn select_website(&mut self, website: Website) {
        self.chain.select_website(website);
        self.wallets.disable();
        self.disable_details();
        self.wallets_page.reset();
    }

    pub fn clear_website(&mut self) {
        self.chain.clear_website();
        self.wallets.disable();
        self.disable_details();
    }

    pub fn select_wallet(&mut self, wallet: Wallet) -> Result<(), ChainError> {
        self.chain.select_wallet(wallet)?;
        self.disable_details();
        self.transactions_page.reset();
        self.history_page.reset();
        Ok(())
    }

    pub fn open_detail(&mut self, view: DetailView) -> Result<(), ChainError> {
        self.chain.open_detail(view)?;
        match view {
            DetailView::Transactions => self.history.disable(),
            DetailView::History => self.transactions.disable(),
        }
        Ok(())
    }

    pub fn close_detail(&mut self) {
        self.chain.close_detail();
        self.disable_details();
    }

    fn disable_details(&mut self) {
        self.transactions.disable();
        self.history.disable();
    }

    /// Signing context of the selected website, derived on each call.
    pub fn signing_context(&self) -> Option<SigningContext> {
        self.chain.website().and_then(SigningContext::from_website)
    }

    pub fn wallets_enabled(&self) -> bool {
        self.signing_context().is_some()
    }

    pub fn detail_enabled(&self, view: DetailView) -> bool {
        self.wallets_enabled() && self.chain.open_view() == Some(view)
    }

    fn key(resource: &str, pagination: Pagination, selection: &[&str]) -> QueryKey {
        compose(
            resource,
            pagination,
            &FilterSnapshot::new(),
            &ColumnFilter::default(),
            &SortModel::default(),
            selection,
        )
    }

    pub fn wallets_key(&self) -> QueryKey {
        let website = self.chain.website().map(|w| w.id.as_str()).unwrap_or("");
        Self::key(WALLETS, self.wallets_page, &[website])
    }

    pub fn detail_key(&self, view: DetailView) -> QueryKey {
        let website = self.chain.website().map(|w| w.id.as_str()).unwrap_or("");
        let user = self.chain.wallet().map(|w| w.user_id.as_str()).unwrap_or("");
        match view {
            DetailView::Transactions => {
                Self::key(WALLET_TRANSACTIONS, self.transactions_page, &[website, user])
            }
            DetailView::History => Self::key(WALLET_HISTORY, self.history_page, &[website, user]),
        }
    }

    pub fn request_wallets(&mut self) -> Option<FetchTicket> {
        let key = self.wallets_key();
        let enabled = self.wallets_enabled();
        self.wallets.request(key, enabled)
    }

    pub fn request_detail(&mut self, view: DetailView) -> Option<FetchTicket> {
        let key = self.detail_key(view);
        let enabled = self.detail_enabled(view);
        match view {
            DetailView::Transactions => self.transactions.request(key, enabled),
            DetailView::History => self.history.request(key, enabled),
        }
    }

    /// Walks the wallet pages of the selected website from the first one
    /// until the wallet of `user_id` shows up. The wallet pagination is left
    /// on the page holding it, or on the last page when there is none.
    pub async fn locate_wallet<F: ListFetcher<Wallet>>(
        &mut self,
        fetcher: &F,
        user_id: &str,
    ) -> Result<Option<Wallet>, ClientError> {
        if !self.wallets_enabled() {
            return Err(ClientError::MissingCredentials("website keys"));
        }
        self.wallets_page.reset();
        loop {
            if let Some(ticket) = self.request_wallets() {
                let result = fetcher.fetch(ticket.params()).await;
                if let Resolution::Failed(message) = self.wallets.resolve(ticket, result) {
                    return Err(ClientError::Server(message));
                }
            }
            if let Some(wallet) = self.wallets.rows().iter().find(|w| w.user_id == user_id) {
                return Ok(Some(wallet.clone()));
            }
            // The 1-based current page is the 0-based index of the next one.
            let next = self.wallets_page.page();
            if u64::from(next) >= self.wallets_page.page_count(self.wallets.total_rows()) {
                return Ok(None);
            }
            self.wallets_page.set_ui_page(next);
        }
    }

    /// [`WalletGraph::locate_wallet`] against the wallet service, signed with
    /// the selected website.
    pub async fn find_wallet(
        &mut self,
        client: &WalletClient,
        user_id: &str,
    ) -> Result<Option<Wallet>, ClientError> {
        let ctx = self
            .signing_context()
            .ok_or(ClientError::MissingCredentials("website keys"))?;
        self.locate_wallet(&WalletsFetcher::new(client, ctx), user_id)
            .await
    }

    /// Fetches whatever the current selection calls for.
    pub async fn sync(&mut self, client: &WalletClient) -> Vec<Resolution> {
        let mut out = Vec::new();

        if let Some(ticket) = self.request_wallets() {
            let result = match self.signing_context() {
                Some(ctx) => WalletsFetcher::new(client, ctx).fetch(ticket.params()).await,
                None => Err(ClientError::MissingCredentials("website keys")),
            };
            out.push(self.wallets.resolve(ticket, result));
        }

        for view in [DetailView::Transactions, DetailView::History] {
            let Some(ticket) = self.request_detail(view) else {
                continue;
            };
            let ctx = self
                .signing_context()
                .ok_or(ClientError::MissingCredentials("website keys"));
            let user_id = self.chain.wallet().map(|wallet| wallet.user_id.clone());
            let resolution = match view {
                DetailView::Transactions => {
                    let result = match (ctx, user_id) {
                        (Ok(ctx), Some(user_id)) => {
                            WalletTransactionsFetcher::new(client, ctx, user_id)
                                .fetch(ticket.params())
                                .await
                        }
                        (Err(err), _) => Err(err),
                        (_, None) => Err(ClientError::Server("no wallet selected".to_string())),
                    };
                    self.transactions.resolve(ticket, result)
                }
                DetailView::History => {
                    let result: Result<ListResult<WalletHistoryEntry>, _> = match (ctx, user_id) {
                        (Ok(ctx), Some(user_id)) => {
                            WalletHistoryFetcher::new(client, ctx, user_id)
                                .fetch(ticket.params())
                                .await
                        }
                        (Err(err), _) => Err(err),
                        (_, None) => Err(ClientError::Server("no wallet selected".to_string())),
                    };
                    self.history.resolve(ticket, result)
                }
            };
            out.push(resolution);
        }
        out
    }
}
