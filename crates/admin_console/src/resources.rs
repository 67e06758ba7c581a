//! Per-resource adapters from the HTTP clients to [`ListFetcher`].

use api_types::{
    list::ListResult,
    merchant::Merchant,
    report::Report,
    transaction::Transaction,
    wallet::{Wallet, WalletHistoryEntry, WalletTransaction},
    website::Website,
};

use crate::{
    client::{ClientError, PaymentClient, WalletClient},
    list_query::ListFetcher,
    signer::SigningContext,
};

fn with_merchant(
    mut params: Vec<(String, String)>,
    merchant_id: Option<&str>,
) -> Vec<(String, String)> {
    if let Some(merchant_id) = merchant_id {
        params.push(("merchantId".to_string(), merchant_id.to_string()));
    }
    params
}

pub struct TransactionsFetcher<'a> {
    client: &'a PaymentClient,
    merchant_id: Option<&'a str>,
}

impl<'a> TransactionsFetcher<'a> {
    pub fn new(client: &'a PaymentClient, merchant_id: Option<&'a str>) -> Self {
        Self {
            client,
            merchant_id,
        }
    }
}

impl ListFetcher<Transaction> for TransactionsFetcher<'_> {
    async fn fetch(
        &self,
        params: Vec<(String, String)>,
    ) -> Result<ListResult<Transaction>, ClientError> {
        let params = with_merchant(params, self.merchant_id);
        Ok(self.client.transactions(&params).await?.into())
    }
}

/// Revenue report, seen as a one-row list whose count is the number of
/// confirmed payments.
pub struct ReportFetcher<'a> {
    client: &'a PaymentClient,
    merchant_id: Option<&'a str>,
}

impl<'a> ReportFetcher<'a> {
    pub fn new(client: &'a PaymentClient, merchant_id: Option<&'a str>) -> Self {
        Self {
            client,
            merchant_id,
        }
    }
}

impl ListFetcher<Report> for ReportFetcher<'_> {
    async fn fetch(&self, params: Vec<(String, String)>) -> Result<ListResult<Report>, ClientError> {
        let params = with_merchant(params, self.merchant_id);
        Ok(self.client.report(&params).await?.into())
    }
}

pub struct WebsitesFetcher<'a> {
    client: &'a PaymentClient,
    merchant_id: Option<&'a str>,
}

impl<'a> WebsitesFetcher<'a> {
    pub fn new(client: &'a PaymentClient, merchant_id: Option<&'a str>) -> Self {
        Self {
            client,
            merchant_id,
        }
    }
}

impl ListFetcher<Website> for WebsitesFetcher<'_> {
    async fn fetch(&self, params: Vec<(String, String)>) -> Result<ListResult<Website>, ClientError> {
        let params = with_merchant(params, self.merchant_id);
        Ok(self.client.websites(&params).await?.into())
    }
}

pub struct MerchantsFetcher<'a> {
    client: &'a PaymentClient,
}

impl<'a> MerchantsFetcher<'a> {
    pub fn new(client: &'a PaymentClient) -> Self {
        Self { client }
    }
}

impl ListFetcher<Merchant> for MerchantsFetcher<'_> {
    async fn fetch(
        &self,
        params: Vec<(String, String)>,
    ) -> Result<ListResult<Merchant>, ClientError> {
        Ok(self.client.merchants(&params).await?.into())
    }
}

/// Signed wallet list. The context is built for this fetch only.
pub struct WalletsFetcher<'a> {
    client: &'a WalletClient,
    ctx: SigningContext,
}

impl<'a> WalletsFetcher<'a> {
    pub fn new(client: &'a WalletClient, ctx: SigningContext) -> Self {
        Self { client, ctx }
    }
}

impl ListFetcher<Wallet> for WalletsFetcher<'_> {
    async fn fetch(&self, params: Vec<(String, String)>) -> Result<ListResult<Wallet>, ClientError> {
        Ok(self.client.wallets(&self.ctx, &params).await?.into())
    }
}

pub struct WalletTransactionsFetcher<'a> {
    client: &'a WalletClient,
    ctx: SigningContext,
    user_id: String,
}

impl<'a> WalletTransactionsFetcher<'a> {
    pub fn new(client: &'a WalletClient, ctx: SigningContext, user_id: String) -> Self {
        Self {
            client,
            ctx,
            user_id,
        }
    }
}

impl ListFetcher<WalletTransaction> for WalletTransactionsFetcher<'_> {
    async fn fetch(
        &self,
        params: Vec<(String, String)>,
    ) -> Result<ListResult<WalletTransaction>, ClientError> {
        let page = self
            .client
            .transactions(&self.ctx, &self.user_id, &params)
            .await?;
        Ok(page.into())
    }
}

pub struct WalletHistoryFetcher<'a> {
    client: &'a WalletClient,
    ctx: SigningContext,
    user_id: String,
}

impl<'a> WalletHistoryFetcher<'a> {
    pub fn new(client: &'a WalletClient, ctx: SigningContext, user_id: String) -> Self {
        Self {
            client,
            ctx,
            user_id,
        }
    }
}

impl ListFetcher<WalletHistoryEntry> for WalletHistoryFetcher<'_> {
    async fn fetch(
        &self,
        params: Vec<(String, String)>,
    ) -> Result<ListResult<WalletHistoryEntry>, ClientError> {
        let page = self.client.history(&self.ctx, &self.user_id, &params).await?;
        Ok(page.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_scope_is_appended() {
        let params = with_merchant(vec![("page".to_string(), "1".to_string())], Some("m9"));
        assert_eq!(
            params.last(),
            Some(&("merchantId".to_string(), "m9".to_string()))
        );
        assert!(with_merchant(Vec::new(), None).is_empty());
    }
}
