use api_types::merchant::{Merchant, MerchantUpsert};

use crate::{
    client::{ClientError, PaymentClient},
    list_query::{ListFetcher, Resolution},
    mutation::{
        DialogState, MutationAction, MutationCoordinator, MutationOutcome, ServerOutcome, Toasts,
        ValidationError,
    },
    query_key::FilterSnapshot,
};

use super::{EditorMode, Table};

pub const MERCHANTS: &str = "merchants";

#[derive(Debug, Clone)]
pub enum MerchantRequest {
    Create(MerchantUpsert),
    Update { id: String, body: MerchantUpsert },
}

impl MerchantRequest {
    pub fn action(&self) -> MutationAction {
        match self {
            Self::Create(_) => MutationAction::CreateMerchant,
            Self::Update { .. } => MutationAction::UpdateMerchant,
        }
    }

    pub async fn send(self, client: &PaymentClient) -> Result<serde_json::Value, ClientError> {
        match self {
            Self::Create(body) => client.create_merchant(&body).await,
            Self::Update { id, body } => client.update_merchant(&id, &body).await,
        }
    }
}

#[derive(Debug)]
pub struct MerchantsScreen {
    pub table: Table<Merchant>,
    pub editor: DialogState<EditorMode<Merchant>>,
    pub toasts: Toasts,
    coordinator: MutationCoordinator,
}

impl MerchantsScreen {
    pub fn new(page_size: u32) -> Self {
        Self {
            table: Table::new(MERCHANTS, page_size),
            editor: DialogState::default(),
            toasts: Toasts::default(),
            coordinator: MutationCoordinator::new(),
        }
    }

    pub async fn sync<F: ListFetcher<Merchant>>(&mut self, fetcher: &F) -> Option<Resolution> {
        self.table
            .sync(&FilterSnapshot::new(), &[], true, fetcher)
            .await
    }

    pub fn open_create(&mut self) {
        self.editor.open_for(EditorMode::Create);
    }

    pub fn open_edit(&mut self, merchant: Merchant) {
        self.editor.open_for(EditorMode::Edit(merchant));
    }

    pub async fn submit<F, Fut, R>(&mut self, body: MerchantUpsert, send: F) -> MutationOutcome
    where
        F: FnOnce(MerchantRequest) -> Fut,
        Fut: Future<Output = Result<R, ClientError>>,
        R: ServerOutcome,
    {
        let request = match self.editor.current() {
            Some(EditorMode::Create) => MerchantRequest::Create(body),
            Some(EditorMode::Edit(merchant)) => MerchantRequest::Update {
                id: merchant.id.clone(),
                body,
            },
            None => return MutationOutcome::Invalid(ValidationError::NoSelection),
        };
        self.coordinator
            .execute(
                request.action(),
                send(request),
                &mut self.editor,
                Some(&mut self.table.query),
                &mut self.toasts,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use api_types::list::ListResult;

    use super::*;

    struct OnePage;

    impl ListFetcher<Merchant> for OnePage {
        async fn fetch(
            &self,
            params: Vec<(String, String)>,
        ) -> Result<ListResult<Merchant>, ClientError> {
            assert!(params.contains(&("username_like".to_string(), "ali".to_string())));
            Ok(ListResult {
                content: vec![merchant("m1")],
                rows_length: 1u64.into(),
            })
        }
    }

    fn merchant(id: &str) -> Merchant {
        Merchant {
            id: id.to_string(),
            username: Some("alice".to_string()),
            email: None,
            first_name: None,
            last_name: None,
            enabled: Some(true),
            attributes: None,
        }
    }

    fn body() -> MerchantUpsert {
        MerchantUpsert {
            id: None,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Martin".to_string(),
            currency_iso_code: Some("TND".to_string()),
            country_iso_code: None,
            phone_number: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn column_filter_reaches_the_fetcher() {
        let mut screen = MerchantsScreen::new(10);
        screen.table.on_filter_change("username", "contains", "ali");
        assert_eq!(screen.sync(&OnePage).await, Some(Resolution::Applied));
        assert_eq!(screen.table.query.rows().len(), 1);
    }

    #[tokio::test]
    async fn update_refetches_the_list() {
        let mut screen = MerchantsScreen::new(10);
        screen.table.on_filter_change("username", "contains", "ali");
        screen.sync(&OnePage).await;

        screen.open_edit(merchant("m1"));
        let outcome = screen
            .submit(body(), |request| async move {
                assert!(matches!(request, MerchantRequest::Update { ref id, .. } if id == "m1"));
                Ok::<_, ClientError>(())
            })
            .await;
        assert_eq!(outcome, MutationOutcome::Succeeded);
        assert_eq!(screen.sync(&OnePage).await, Some(Resolution::Applied));
    }

    #[tokio::test]
    async fn submit_without_dialog_is_invalid() {
        let mut screen = MerchantsScreen::new(10);
        let outcome = screen
            .submit(body(), |_| async { Ok::<_, ClientError>(()) })
            .await;
        assert_eq!(outcome, MutationOutcome::Invalid(ValidationError::NoSelection));
    }
}
