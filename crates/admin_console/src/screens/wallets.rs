//! Wallets of a selected website.
//!
//! Every write is signed with the keys of the website selected at submit
//! time and carries the injected action owner.

use api_types::{
    wallet::{Wallet, WalletAdjust, WalletEnable},
    website::Website,
};

use crate::{
    cascade::{ChainError, DetailView, WalletGraph},
    client::{ClientError, WalletClient},
    list_query::Resolution,
    mutation::{
        DialogState, MutationAction, MutationCoordinator, MutationOutcome, ServerOutcome, Toasts,
        ValidationError,
    },
    signer::SigningContext,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Adjustment {
    Increase,
    Decrease,
}

impl Adjustment {
    pub fn action(self) -> MutationAction {
        match self {
            Self::Increase => MutationAction::IncreaseBalance,
            Self::Decrease => MutationAction::DecreaseBalance,
        }
    }
}

#[derive(Debug, Clone)]
pub enum WalletRequest {
    Enable(WalletEnable),
    Increase(WalletAdjust),
    Decrease(WalletAdjust),
}

impl WalletRequest {
    pub async fn send(
        self,
        client: &WalletClient,
        ctx: &SigningContext,
    ) -> Result<serde_json::Value, ClientError> {
        match self {
            Self::Enable(body) => client.enable(ctx, &body).await,
            Self::Increase(body) => client.increase(ctx, &body).await,
            Self::Decrease(body) => client.decrease(ctx, &body).await,
        }
    }
}

async fn signed<F, Fut, R>(
    ctx: Option<SigningContext>,
    request: WalletRequest,
    send: F,
) -> Result<R, ClientError>
where
    F: FnOnce(SigningContext, WalletRequest) -> Fut,
    Fut: Future<Output = Result<R, ClientError>>,
{
    let ctx = ctx.ok_or(ClientError::MissingCredentials("website keys"))?;
    send(ctx, request).await
}

#[derive(Debug)]
pub struct WalletsScreen {
    action_owner: String,
    pub graph: WalletGraph,
    pub toggle: DialogState<Wallet>,
    pub adjust: DialogState<(Wallet, Adjustment)>,
    pub amount_input: String,
    pub comment: String,
    pub toasts: Toasts,
    coordinator: MutationCoordinator,
}

impl WalletsScreen {
    pub fn new(action_owner: impl Into<String>) -> Self {
        Self {
            action_owner: action_owner.into(),
            graph: WalletGraph::new(),
            toggle: DialogState::default(),
            adjust: DialogState::default(),
            amount_input: String::new(),
            comment: String::new(),
            toasts: Toasts::default(),
            coordinator: MutationCoordinator::new(),
        }
    }

    pub fn select_website(&mut self, website: Website) {
        self.graph.select_website(website);
    }

    /// The website selector is the only filter of this screen.
    pub fn reset_filters(&mut self) {
        self.graph.clear_website();
    }

    pub fn select_wallet(&mut self, wallet: Wallet) -> Result<(), ChainError> {
        self.graph.select_wallet(wallet)
    }

    pub fn open_detail(&mut self, view: DetailView) -> Result<(), ChainError> {
        self.graph.open_detail(view)
    }

    pub fn close_detail(&mut self) {
        self.graph.close_detail();
    }

    pub async fn sync(&mut self, client: &WalletClient) -> Vec<Resolution> {
        self.graph.sync(client).await
    }

    pub fn open_toggle(&mut self, wallet: Wallet) {
        self.toggle.open_for(wallet);
    }

    /// Flips the enabled flag of the wallet the dialog was opened for.
    pub async fn confirm_toggle<F, Fut, R>(&mut self, send: F) -> MutationOutcome
    where
        F: FnOnce(SigningContext, WalletRequest) -> Fut,
        Fut: Future<Output = Result<R, ClientError>>,
        R: ServerOutcome,
    {
        let Some(wallet) = self.toggle.current() else {
            return MutationOutcome::Invalid(ValidationError::NoSelection);
        };
        let request = WalletRequest::Enable(WalletEnable {
            user_id: wallet.user_id.clone(),
            action_owner: self.action_owner.clone(),
            enabled: !wallet.enabled,
        });
        let ctx = self.graph.signing_context();

        self.coordinator
            .execute(
                MutationAction::EnableWallet,
                signed(ctx, request, send),
                &mut self.toggle,
                Some(&mut self.graph.wallets),
                &mut self.toasts,
            )
            .await
    }

    pub fn open_adjust(&mut self, wallet: Wallet, adjustment: Adjustment) {
        self.amount_input.clear();
        self.comment.clear();
        self.adjust.open_for((wallet, adjustment));
    }

    /// Sends the typed amount. Nothing is sent for a zero or non-numeric
    /// amount; the dialog stays open.
    pub async fn confirm_adjust<F, Fut, R>(&mut self, send: F) -> MutationOutcome
    where
        F: FnOnce(SigningContext, WalletRequest) -> Fut,
        Fut: Future<Output = Result<R, ClientError>>,
        R: ServerOutcome,
    {
        let Some((wallet, adjustment)) = self.adjust.current().cloned() else {
            return MutationOutcome::Invalid(ValidationError::NoSelection);
        };
        let action_owner = self.action_owner.clone();
        let comment = self.comment.trim().to_string();
        let ctx = self.graph.signing_context();

        let outcome = self
            .coordinator
            .execute_with_amount(
                adjustment.action(),
                &self.amount_input,
                move |amount| {
                    let body = WalletAdjust {
                        user_id: wallet.user_id,
                        action_owner,
                        comment,
                        amount,
                    };
                    let request = match adjustment {
                        Adjustment::Increase => WalletRequest::Increase(body),
                        Adjustment::Decrease => WalletRequest::Decrease(body),
                    };
                    signed(ctx, request, send)
                },
                &mut self.adjust,
                Some(&mut self.graph.wallets),
                &mut self.toasts,
            )
            .await;

        if outcome == MutationOutcome::Succeeded {
            self.amount_input.clear();
            self.comment.clear();
            self.graph.history.invalidate();
        }
        outcome
    }
}
