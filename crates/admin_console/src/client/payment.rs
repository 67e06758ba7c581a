use api_types::{
    list::RowsPage,
    merchant::{Merchant, MerchantUpsert},
    report::Report,
    transaction::{BankTransferCompletion, Transaction, TransactionStatus},
    website::{PaymentMethod, Website, WebsiteUpsert},
    withdraw::{WithdrawRequest, WithdrawResult},
};
use reqwest::{Method, Url};
use serde::{Serialize, de::DeserializeOwned};

use super::{ClientError, base_url, decode, endpoint};
use crate::filters::SupportingSource;

/// Client of the payment API (`{payment_url}/api/v1`).
///
/// Requests carry the session bearer token handed over at construction.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    base_url: Url,
    bearer: Option<String>,
    locale: String,
    http: reqwest::Client,
}

impl PaymentClient {
    pub fn new(payment_url: &str, bearer: Option<String>) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: base_url(payment_url, "api/v1")?,
            bearer: bearer.filter(|token| !token.is_empty()),
            locale: "fr".to_string(),
            http: reqwest::Client::new(),
        })
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let req = self.http.request(method, url);
        match &self.bearer {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ClientError> {
        let url = endpoint(&self.base_url, path)?;
        let res = self.request(Method::GET, url).query(query).send().await?;
        decode(res).await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: &B,
    ) -> Result<T, ClientError> {
        let url = endpoint(&self.base_url, path)?;
        let res = self
            .request(method, url)
            .query(query)
            .json(body)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn transactions(
        &self,
        params: &[(String, String)],
    ) -> Result<RowsPage<Transaction>, ClientError> {
        self.get("transactions", params).await
    }

    /// Revenue indicators for the period and scope in `params`.
    pub async fn report(&self, params: &[(String, String)]) -> Result<Report, ClientError> {
        self.get("transactions/report", params).await
    }

    pub async fn transaction_statuses(&self) -> Result<Vec<TransactionStatus>, ClientError> {
        self.get("transactions/status", &[]).await
    }

    pub async fn complete_bank_transfer(
        &self,
        transaction_id: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let body = BankTransferCompletion {
            transaction_id: transaction_id.to_string(),
        };
        self.send(Method::PUT, "transactions/bank-transfer", &[], &body)
            .await
    }

    pub async fn websites(
        &self,
        params: &[(String, String)],
    ) -> Result<RowsPage<Website>, ClientError> {
        self.get("websites", params).await
    }

    pub async fn create_website(
        &self,
        merchant_id: &str,
        website: &WebsiteUpsert,
    ) -> Result<serde_json::Value, ClientError> {
        let query = [("merchantId".to_string(), merchant_id.to_string())];
        self.send(Method::POST, "websites", &query, website).await
    }

    pub async fn update_website(
        &self,
        website_id: &str,
        website: &WebsiteUpsert,
    ) -> Result<serde_json::Value, ClientError> {
        self.send(Method::PUT, &format!("websites/{website_id}"), &[], website)
            .await
    }

    pub async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, ClientError> {
        let query = [("locale".to_string(), self.locale.clone())];
        self.get("websites/methods", &query).await
    }

    pub async fn merchants(
        &self,
        params: &[(String, String)],
    ) -> Result<RowsPage<Merchant>, ClientError> {
        self.get("merchants", params).await
    }

    pub async fn create_merchant(
        &self,
        merchant: &MerchantUpsert,
    ) -> Result<serde_json::Value, ClientError> {
        self.send(Method::POST, "merchants", &[], merchant).await
    }

    pub async fn update_merchant(
        &self,
        merchant_id: &str,
        merchant: &MerchantUpsert,
    ) -> Result<serde_json::Value, ClientError> {
        self.send(Method::PUT, &format!("merchants/{merchant_id}"), &[], merchant)
            .await
    }

    pub async fn request_withdraw(&self, amount: f64) -> Result<WithdrawResult, ClientError> {
        self.send(Method::POST, "withdraw", &[], &WithdrawRequest { amount })
            .await
    }
}

impl SupportingSource for PaymentClient {
    async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, ClientError> {
        PaymentClient::payment_methods(self).await
    }

    async fn transaction_statuses(&self) -> Result<Vec<TransactionStatus>, ClientError> {
        PaymentClient::transaction_statuses(self).await
    }

    async fn merchant_websites(&self, merchant_id: &str) -> Result<Vec<Website>, ClientError> {
        let query = [("merchantId".to_string(), merchant_id.to_string())];
        let page = self.websites(&query).await?;
        Ok(page.rows)
    }
}
