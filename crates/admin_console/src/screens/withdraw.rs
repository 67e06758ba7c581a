use api_types::withdraw::WithdrawResult;

use crate::{
    client::ClientError,
    list_query::ListQuery,
    mutation::{
        DialogState, MutationAction, MutationCoordinator, MutationOutcome, Toasts,
        ValidationError, parse_amount,
    },
};

/// Amount entry and confirmation of a withdrawal request.
#[derive(Debug, Default)]
pub struct WithdrawForm {
    amount_input: String,
    error: Option<ValidationError>,
    pub confirm: DialogState<f64>,
    pub toasts: Toasts,
    coordinator: MutationCoordinator,
}

impl WithdrawForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount_input(&self) -> &str {
        &self.amount_input
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    /// Keystrokes with anything but digits and separators are ignored.
    pub fn set_amount(&mut self, text: &str) {
        if text.chars().any(|c| !(c.is_ascii_digit() || c == '.')) {
            return;
        }
        self.amount_input = text.to_string();
        self.error = None;
    }

    /// Opens the confirmation dialog for a valid amount.
    pub fn open_confirm(&mut self) -> Result<f64, ValidationError> {
        match parse_amount(&self.amount_input) {
            Ok(amount) => {
                self.confirm.open_for(amount);
                Ok(amount)
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Sends the confirmed amount. A `REJECTED` answer is a failure even
    /// though the request itself succeeded.
    pub async fn submit<F, Fut>(&mut self, send: F) -> MutationOutcome
    where
        F: FnOnce(f64) -> Fut,
        Fut: Future<Output = Result<WithdrawResult, ClientError>>,
    {
        let Some(amount) = self.confirm.current().copied() else {
            return MutationOutcome::Invalid(ValidationError::NoSelection);
        };
        let outcome = self
            .coordinator
            .execute(
                MutationAction::Withdraw,
                send(amount),
                &mut self.confirm,
                None::<&mut ListQuery<()>>,
                &mut self.toasts,
            )
            .await;
        if outcome == MutationOutcome::Succeeded {
            self.amount_input.clear();
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_keystrokes_are_ignored() {
        let mut form = WithdrawForm::new();
        form.set_amount("12");
        form.set_amount("12a");
        assert_eq!(form.amount_input(), "12");
        form.set_amount("12.75");
        assert_eq!(form.amount_input(), "12.75");
    }

    #[test]
    fn zero_amount_does_not_open_the_dialog() {
        let mut form = WithdrawForm::new();
        assert_eq!(form.open_confirm(), Err(ValidationError::ZeroAmount));
        assert_eq!(form.error(), Some(&ValidationError::ZeroAmount));
        assert!(!form.confirm.is_open());

        form.set_amount("0");
        assert!(form.error().is_none());
        assert!(form.open_confirm().is_err());
    }

    #[tokio::test]
    async fn rejected_withdraw_keeps_the_amount() {
        let mut form = WithdrawForm::new();
        form.set_amount("50");
        assert_eq!(form.open_confirm(), Ok(50.0));

        let outcome = form
            .submit(|amount| async move {
                assert_eq!(amount, 50.0);
                Ok(WithdrawResult {
                    transaction_state: Some("REJECTED".to_string()),
                    message: Some("insufficient balance".to_string()),
                })
            })
            .await;
        assert_eq!(
            outcome,
            MutationOutcome::Failed(
                "Cannot process withdrawal request !\ninsufficient balance".to_string()
            )
        );
        assert_eq!(form.amount_input(), "50");
        assert!(form.confirm.is_open());
    }

    #[tokio::test]
    async fn accepted_withdraw_clears_the_form() {
        let mut form = WithdrawForm::new();
        form.set_amount("50");
        form.open_confirm().unwrap();

        let outcome = form
            .submit(|_| async {
                Ok(WithdrawResult {
                    transaction_state: Some("ACCEPTED".to_string()),
                    message: None,
                })
            })
            .await;
        assert_eq!(outcome, MutationOutcome::Succeeded);
        assert_eq!(form.amount_input(), "");
        assert_eq!(
            form.toasts.current().map(|t| t.message.as_str()),
            Some("Successful withdraw request !")
        );
    }
}
