//! Websites of the current merchant, with a create/edit dialog.

use api_types::website::{Website, WebsiteUpsert};

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

pub const WEBSITES: &str = "websites";

/// A write resolved from the editor mode.
#[derive(Debug, Clone)]
pub enum WebsiteRequest {
    Create {
        merchant_id: String,
        body: WebsiteUpsert,
    },
    Update {
        id: String,
        body: WebsiteUpsert,
    },
}

impl WebsiteRequest {
    pub fn action(&self) -> MutationAction {
        match self {
            Self::Create { .. } => MutationAction::CreateWebsite,
            Self::Update { .. } => MutationAction::UpdateWebsite,
        }
    }

    pub async fn send(self, client: &PaymentClient) -> Result<serde_json::Value, ClientError> {
        match self {
            Self::Create { merchant_id, body } => client.create_website(&merchant_id, &body).await,
            Self::Update { id, body } => client.update_website(&id, &body).await,
        }
    }
}

#[derive(Debug)]
pub struct WebsitesScreen {
    merchant_id: Option<String>,
    pub table: Table<Website>,
    pub editor: DialogState<EditorMode<Website>>,
    pub toasts: Toasts,
    coordinator: MutationCoordinator,
}

impl WebsitesScreen {
    pub fn new(merchant_id: Option<String>, page_size: u32) -> Self {
        Self {
            merchant_id,
            table: Table::new(WEBSITES, page_size),
            editor: DialogState::default(),
            toasts: Toasts::default(),
            coordinator: MutationCoordinator::new(),
        }
    }

    pub async fn sync<F: ListFetcher<Website>>(&mut self, fetcher: &F) -> Option<Resolution> {
        let merchant = self.merchant_id.clone().unwrap_or_default();
        self.table
            .sync(&FilterSnapshot::new(), &[merchant.as_str()], true, fetcher)
            .await
    }

    pub fn open_create(&mut self) {
        self.editor.open_for(EditorMode::Create);
    }

    pub fn open_edit(&mut self, website: Website) {
        self.editor.open_for(EditorMode::Edit(website));
    }

    /// Builds the request for the open editor. Creating needs a merchant.
    pub fn request(&self, body: WebsiteUpsert) -> Result<WebsiteRequest, ValidationError> {
        match self.editor.current() {
            Some(EditorMode::Create) => {
                let merchant_id = self
                    .merchant_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .ok_or(ValidationError::NoMerchant)?;
                Ok(WebsiteRequest::Create { merchant_id, body })
            }
            Some(EditorMode::Edit(website)) => Ok(WebsiteRequest::Update {
                id: website.id.clone(),
                body,
            }),
            None => Err(ValidationError::NoSelection),
        }
    }

    pub async fn submit<F, Fut, R>(&mut self, body: WebsiteUpsert, send: F) -> MutationOutcome
    where
        F: FnOnce(WebsiteRequest) -> Fut,
        Fut: Future<Output = Result<R, ClientError>>,
        R: ServerOutcome,
    {
        let request = match self.request(body) {
            Ok(request) => request,
            Err(err) => return MutationOutcome::Invalid(err),
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
