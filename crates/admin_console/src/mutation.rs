//! Remote writes and their effect on local state.
//!
//! A mutation goes through [`MutationCoordinator::start`] (at most one in
//! flight per [`MutationAction`]) and [`MutationCoordinator::settle`]. The
//! [`Submission`] returned by `start` holds the action's in-flight slot until
//! it is settled or dropped, so an abandoned submission never blocks later
//! ones. Errors
//! stop here: they become an error toast and a [`MutationOutcome`], never a
//! `Result` bubbling further up.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use api_types::withdraw::WithdrawResult;
use thiserror::Error;

use crate::{client::ClientError, list_query::ListQuery};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must not be zero")]
    ZeroAmount,
    #[error("amount is not a number")]
    NotNumeric,
    #[error("no merchant selected")]
    NoMerchant,
    #[error("nothing selected")]
    NoSelection,
}

/// Parses a user-typed amount.
///
/// Blank input counts as zero. Zero and non-numeric input are rejected.
pub fn parse_amount(input: &str) -> Result<f64, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::ZeroAmount);
    }
    let amount = input
        .parse::<f64>()
        .map_err(|_| ValidationError::NotNumeric)?;
    if !amount.is_finite() {
        return Err(ValidationError::NotNumeric);
    }
    if amount == 0.0 {
        return Err(ValidationError::ZeroAmount);
    }
    Ok(amount)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationAction {
    EnableWallet,
    IncreaseBalance,
    DecreaseBalance,
    CreateWebsite,
    UpdateWebsite,
    CreateMerchant,
    UpdateMerchant,
    CompleteBankTransfer,
    Withdraw,
}

impl MutationAction {
    pub fn success_message(self) -> &'static str {
        match self {
            Self::CreateWebsite | Self::CreateMerchant => "Successfully created !",
            Self::CompleteBankTransfer => "Successfully approved !",
            Self::Withdraw => "Successful withdraw request !",
            _ => "Successfully updated !",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::CreateWebsite => "cannot create new Website !",
            Self::CreateMerchant => "cannot create new merchant !",
            Self::CompleteBankTransfer => "cannot approve this transaction !",
            Self::Withdraw => "Cannot process withdrawal request !",
            _ => "cannot update !",
        }
    }
}

/// Payload of a successful HTTP answer that may still encode a rejection.
pub trait ServerOutcome {
    /// The server message when the payload is a business rejection.
    fn rejection(&self) -> Option<String> {
        None
    }
}

impl ServerOutcome for () {}

impl ServerOutcome for WithdrawResult {
    fn rejection(&self) -> Option<String> {
        self.is_rejected()
            .then(|| self.message.clone().unwrap_or_default())
    }
}

impl ServerOutcome for serde_json::Value {
    fn rejection(&self) -> Option<String> {
        let state = self.get("TRANSACTION_STATE")?.as_str()?;
        (state == api_types::withdraw::REJECTED).then(|| {
            self.get("MESSAGE")
                .and_then(|message| message.as_str())
                .unwrap_or_default()
                .to_string()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastState {
    pub level: ToastLevel,
    pub message: String,
}

/// Sink for transient notifications.
pub trait Notifier {
    fn loading(&mut self, message: &str);
    fn success(&mut self, message: &str);
    fn error(&mut self, message: &str);
    /// Removes any pending notification.
    fn dismiss(&mut self);
}

/// Toasts kept in [`Toasts::shown`]; older ones are forgotten.
pub const TOAST_HISTORY: usize = 16;

/// In-memory notifier keeping the visible toast and the most recent toasts
/// shown.
#[derive(Debug, Default)]
pub struct Toasts {
    current: Option<ToastState>,
    shown: Vec<ToastState>,
}

impl Toasts {
    pub fn current(&self) -> Option<&ToastState> {
        self.current.as_ref()
    }

    pub fn shown(&self) -> &[ToastState] {
        &self.shown
    }

    fn push(&mut self, level: ToastLevel, message: &str) {
        let toast = ToastState {
            level,
            message: message.to_string(),
        };
        if self.shown.len() == TOAST_HISTORY {
            self.shown.remove(0);
        }
        self.shown.push(toast.clone());
        self.current = Some(toast);
    }
}

impl Notifier for Toasts {
    fn loading(&mut self, message: &str) {
        self.push(ToastLevel::Loading, message);
    }

    fn success(&mut self, message: &str) {
        self.push(ToastLevel::Success, message);
    }

    fn error(&mut self, message: &str) {
        self.push(ToastLevel::Error, message);
    }

    fn dismiss(&mut self) {
        self.current = None;
    }
}

/// Dialog bound to a mutation, with the row it was opened for.
#[derive(Debug, Clone)]
pub struct DialogState<I> {
    open: bool,
    current: Option<I>,
}

impl<I> Default for DialogState<I> {
    fn default() -> Self {
        Self {
            open: false,
            current: None,
        }
    }
}

impl<I> DialogState<I> {
    pub fn open_for(&mut self, item: I) {
        self.current = Some(item);
        self.open = true;
    }

    pub fn close(&mut self) {
        self.current = None;
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn current(&self) -> Option<&I> {
        self.current.as_ref()
    }
}

type InFlight = Arc<Mutex<HashSet<MutationAction>>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashSet<MutationAction>> {
    in_flight
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Proof that a submission was accepted by [`MutationCoordinator::start`].
///
/// Releases the action when dropped.
#[derive(Debug)]
#[must_use]
pub struct Submission {
    action: MutationAction,
    in_flight: InFlight,
}

impl Submission {
    pub fn action(&self) -> MutationAction {
        self.action
    }
}

impl Drop for Submission {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.action);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Succeeded,
    /// Transport failure or business rejection, with the shown message.
    Failed(String),
    /// Rejected locally; nothing was sent.
    Invalid(ValidationError),
    /// The same action was already in flight; nothing was sent.
    Skipped,
}

#[derive(Debug, Default)]
pub struct MutationCoordinator {
    in_flight: InFlight,
}

impl MutationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, action: MutationAction) -> bool {
        lock(&self.in_flight).contains(&action)
    }

    /// Marks `action` as in flight. Returns `None` when it already is.
    pub fn start(&mut self, action: MutationAction) -> Option<Submission> {
        if !lock(&self.in_flight).insert(action) {
            tracing::debug!(?action, "submission ignored, already in flight");
            return None;
        }
        Some(Submission {
            action,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Applies the outcome of a submission.
    ///
    /// On success the dialog closes, its current item is cleared and the
    /// owning list is invalidated so its next sync refetches. On failure
    /// dialog and item are left as they are so the user can retry.
    pub fn settle<R, I, T, N>(
        &mut self,
        submission: Submission,
        result: Result<R, ClientError>,
        dialog: &mut DialogState<I>,
        owner: Option<&mut ListQuery<T>>,
        notifier: &mut N,
    ) -> MutationOutcome
    where
        R: ServerOutcome,
        N: Notifier,
    {
        let action = submission.action;
        drop(submission);
        notifier.dismiss();

        let failure = match result {
            Ok(payload) => payload.rejection(),
            Err(err) => Some(err.user_message()),
        };

        match failure {
            None => {
                tracing::info!(?action, "mutation succeeded");
                notifier.success(action.success_message());
                dialog.close();
                if let Some(owner) = owner {
                    owner.invalidate();
                }
                MutationOutcome::Succeeded
            }
            Some(reason) => {
                tracing::warn!(?action, "mutation failed: {reason}");
                let message = format!("{}\n{reason}", action.failure_message());
                notifier.error(&message);
                MutationOutcome::Failed(message)
            }
        }
    }

    /// Runs `mutate` guarded by the in-flight flag of `action`.
    ///
    /// Dropping the returned future before it completes frees the action.
    pub async fn execute<R, I, T, N, Fut>(
        &mut self,
        action: MutationAction,
        mutate: Fut,
        dialog: &mut DialogState<I>,
        owner: Option<&mut ListQuery<T>>,
        notifier: &mut N,
    ) -> MutationOutcome
    where
        R: ServerOutcome,
        N: Notifier,
        Fut: Future<Output = Result<R, ClientError>>,
    {
        let Some(submission) = self.start(action) else {
            return MutationOutcome::Skipped;
        };
        notifier.loading("processing");
        let result = mutate.await;
        self.settle(submission, result, dialog, owner, notifier)
    }

    /// Like [`MutationCoordinator::execute`] for amount-bearing actions:
    /// the amount is validated first and `mutate` only runs for a valid one.
    pub async fn execute_with_amount<R, I, T, N, F, Fut>(
        &mut self,
        action: MutationAction,
        amount_input: &str,
        mutate: F,
        dialog: &mut DialogState<I>,
        owner: Option<&mut ListQuery<T>>,
        notifier: &mut N,
    ) -> MutationOutcome
    where
        R: ServerOutcome,
        N: Notifier,
        F: FnOnce(f64) -> Fut,
        Fut: Future<Output = Result<R, ClientError>>,
    {
        let amount = match parse_amount(amount_input) {
            Ok(amount) => amount,
            Err(err) => {
                notifier.error(&err.to_string());
                return MutationOutcome::Invalid(err);
            }
        };
        self.execute(action, mutate(amount), dialog, owner, notifier)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, future, time::Duration};

    use api_types::list::ListResult;

    use super::*;
    use crate::query_key::{ColumnFilter, FilterSnapshot, Pagination, SortModel, compose};

    fn loaded_query() -> ListQuery<String> {
        let mut query = ListQuery::new();
        let key = compose(
            "wallets",
            Pagination::default(),
            &FilterSnapshot::new(),
            &ColumnFilter::default(),
            &SortModel::default(),
            &["w1"],
        );
        let ticket = query.request(key, true).unwrap();
        query.resolve(
            ticket,
            Ok(ListResult {
                content: vec!["row".to_string()],
                rows_length: "1".into(),
            }),
        );
        query
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount("12.5"), Ok(12.5));
        assert_eq!(parse_amount(" -3 "), Ok(-3.0));
        assert_eq!(parse_amount("0"), Err(ValidationError::ZeroAmount));
        assert_eq!(parse_amount("0.00"), Err(ValidationError::ZeroAmount));
        assert_eq!(parse_amount(""), Err(ValidationError::ZeroAmount));
        assert_eq!(parse_amount("NaN"), Err(ValidationError::NotNumeric));
        assert_eq!(parse_amount("12,5"), Err(ValidationError::NotNumeric));
        assert_eq!(parse_amount("abc"), Err(ValidationError::NotNumeric));
    }

    #[tokio::test]
    async fn success_closes_dialog_and_invalidates_owner() {
        let mut coordinator = MutationCoordinator::new();
        let mut dialog = DialogState::default();
        dialog.open_for("user-1");
        let mut owner = loaded_query();
        let mut toasts = Toasts::default();

        let outcome = coordinator
            .execute(
                MutationAction::EnableWallet,
                async { Ok::<_, ClientError>(()) },
                &mut dialog,
                Some(&mut owner),
                &mut toasts,
            )
            .await;

        assert_eq!(outcome, MutationOutcome::Succeeded);
        assert!(!dialog.is_open());
        assert!(dialog.current().is_none());
        assert_eq!(
            toasts.current(),
            Some(&ToastState {
                level: ToastLevel::Success,
                message: "Successfully updated !".to_string(),
            })
        );
        // Same key, yet a refetch is due.
        let key = owner.key().cloned().unwrap();
        assert!(owner.request(key, true).is_some());
        assert!(!coordinator.is_in_flight(MutationAction::EnableWallet));
    }

    #[tokio::test]
    async fn failure_keeps_dialog_and_item() {
        let mut coordinator = MutationCoordinator::new();
        let mut dialog = DialogState::default();
        dialog.open_for("user-1");
        let mut owner = loaded_query();
        let mut toasts = Toasts::default();

        let outcome = coordinator
            .execute(
                MutationAction::EnableWallet,
                async { Err::<(), _>(ClientError::Server("wallet locked".to_string())) },
                &mut dialog,
                Some(&mut owner),
                &mut toasts,
            )
            .await;

        assert_eq!(
            outcome,
            MutationOutcome::Failed("cannot update !\nwallet locked".to_string())
        );
        assert!(dialog.is_open());
        assert_eq!(dialog.current(), Some(&"user-1"));
        let key = owner.key().cloned().unwrap();
        assert!(owner.request(key, true).is_none());
        assert_eq!(toasts.current().unwrap().level, ToastLevel::Error);
    }

    #[tokio::test]
    async fn rejected_state_in_200_is_a_failure() {
        let mut coordinator = MutationCoordinator::new();
        let mut dialog = DialogState::<()>::default();
        let mut toasts = Toasts::default();

        let outcome = coordinator
            .execute(
                MutationAction::Withdraw,
                async {
                    Ok::<_, ClientError>(WithdrawResult {
                        transaction_state: Some("REJECTED".to_string()),
                        message: Some("daily limit".to_string()),
                    })
                },
                &mut dialog,
                None::<&mut ListQuery<()>>,
                &mut toasts,
            )
            .await;

        assert_eq!(
            outcome,
            MutationOutcome::Failed("Cannot process withdrawal request !\ndaily limit".to_string())
        );
    }

    #[test]
    fn json_payload_rejection() {
        let value = serde_json::json!({"TRANSACTION_STATE": "REJECTED", "MESSAGE": "nope"});
        assert_eq!(value.rejection().as_deref(), Some("nope"));
        let value = serde_json::json!({"TRANSACTION_STATE": "ACCEPTED"});
        assert_eq!(value.rejection(), None);
        assert_eq!(serde_json::json!({"ok": true}).rejection(), None);
    }

    #[test]
    fn second_submission_while_in_flight_is_a_no_op() {
        let mut coordinator = MutationCoordinator::new();
        let first = coordinator.start(MutationAction::IncreaseBalance).unwrap();
        assert!(coordinator.start(MutationAction::IncreaseBalance).is_none());
        // Other actions are independent.
        let other = coordinator.start(MutationAction::DecreaseBalance).unwrap();

        let mut dialog = DialogState::<()>::default();
        let mut toasts = Toasts::default();
        coordinator.settle(
            first,
            Ok(()),
            &mut dialog,
            None::<&mut ListQuery<()>>,
            &mut toasts,
        );
        assert!(coordinator.start(MutationAction::IncreaseBalance).is_some());
        assert_eq!(other.action(), MutationAction::DecreaseBalance);
    }

    #[tokio::test]
    async fn invalid_amount_never_dispatches() {
        let mut coordinator = MutationCoordinator::new();
        let mut dialog = DialogState::default();
        dialog.open_for("user-1");
        let mut toasts = Toasts::default();

        for input in ["0", "", "NaN", "ten"] {
            let called = Cell::new(false);
            let outcome = coordinator
                .execute_with_amount(
                    MutationAction::IncreaseBalance,
                    input,
                    |_| {
                        called.set(true);
                        async { Ok::<_, ClientError>(()) }
                    },
                    &mut dialog,
                    None::<&mut ListQuery<()>>,
                    &mut toasts,
                )
                .await;
            assert!(matches!(outcome, MutationOutcome::Invalid(_)));
            assert!(!called.get());
            assert!(dialog.is_open());
        }
    }

    #[tokio::test]
    async fn valid_amount_is_dispatched_parsed() {
        let mut coordinator = MutationCoordinator::new();
        let mut dialog = DialogState::<()>::default();
        let mut toasts = Toasts::default();
        let sent = Cell::new(None);

        let outcome = coordinator
            .execute_with_amount(
                MutationAction::DecreaseBalance,
                "12.5",
                |amount| {
                    sent.set(Some(amount));
                    async { Ok::<_, ClientError>(()) }
                },
                &mut dialog,
                None::<&mut ListQuery<()>>,
                &mut toasts,
            )
            .await;
        assert_eq!(outcome, MutationOutcome::Succeeded);
        assert_eq!(sent.get(), Some(12.5));
        assert_eq!(toasts.shown()[0].level, ToastLevel::Loading);
    }

    #[tokio::test]
    async fn abandoned_submission_frees_its_action() {
        let mut coordinator = MutationCoordinator::new();
        let mut dialog = DialogState::<()>::default();
        let mut toasts = Toasts::default();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            coordinator.execute(
                MutationAction::Withdraw,
                future::pending::<Result<(), ClientError>>(),
                &mut dialog,
                None::<&mut ListQuery<()>>,
                &mut toasts,
            ),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(!coordinator.is_in_flight(MutationAction::Withdraw));

        let outcome = coordinator
            .execute(
                MutationAction::Withdraw,
                async { Ok::<_, ClientError>(()) },
                &mut dialog,
                None::<&mut ListQuery<()>>,
                &mut toasts,
            )
            .await;
        assert_eq!(outcome, MutationOutcome::Succeeded);
    }

    #[test]
    fn dropped_submission_frees_its_action() {
        let mut coordinator = MutationCoordinator::new();
        let submission = coordinator.start(MutationAction::UpdateWebsite).unwrap();
        assert!(coordinator.is_in_flight(MutationAction::UpdateWebsite));
        drop(submission);
        assert!(coordinator.start(MutationAction::UpdateWebsite).is_some());
    }

    #[test]
    fn toast_history_is_bounded() {
        let mut toasts = Toasts::default();
        for n in 0..TOAST_HISTORY + 5 {
            toasts.success(&format!("toast {n}"));
        }
        assert_eq!(toasts.shown().len(), TOAST_HISTORY);
        assert_eq!(toasts.shown()[0].message, "toast 5");
        assert_eq!(
            toasts.current().map(|toast| toast.message.as_str()),
            Some(format!("toast {}", TOAST_HISTORY + 4).as_str())
        );
    }
}
