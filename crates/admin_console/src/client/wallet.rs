use api_types::{
    list::RowsPage,
    wallet::{Wallet, WalletAdjust, WalletEnable, WalletHistoryEntry, WalletTransaction},
};
use reqwest::{Method, Url};
use serde::{Serialize, de::DeserializeOwned};

use super::{ClientError, base_url, decode, endpoint};
use crate::signer::{SignedHeaders, SigningContext};

/// Client of the wallet service (`{wallet_url}/api/v1/wallet`).
///
/// Every call is signed with the key pair of the selected website; the
/// signing context is passed per call and never stored.
#[derive(Debug, Clone)]
pub struct WalletClient {
    base_url: Url,
    http: reqwest::Client,
}

impl WalletClient {
    pub fn new(wallet_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: base_url(wallet_url, "api/v1/wallet")?,
            http: reqwest::Client::new(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        if path.is_empty() {
            let root = self.base_url.as_str().trim_end_matches('/');
            return Url::parse(root)
                .map_err(|err| ClientError::Server(format!("invalid base_url: {err}")));
        }
        endpoint(&self.base_url, path)
    }

    /// Headers are derived before the request is built, so missing
    /// credentials never reach the network.
    async fn signed<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &SigningContext,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let headers = SignedHeaders::derive(ctx)?.to_header_map()?;
        let url = self.url(path)?;
        tracing::debug!(%method, %url, public_key = ctx.public_key(), "signed wallet request");

        let mut req = self.http.request(method, url).headers(headers).query(query);
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = req.send().await?;
        decode(res).await
    }

    pub async fn wallets(
        &self,
        ctx: &SigningContext,
        params: &[(String, String)],
    ) -> Result<RowsPage<Wallet>, ClientError> {
        self.signed::<(), _>(ctx, Method::GET, "", params, None)
            .await
    }

    pub async fn enable(
        &self,
        ctx: &SigningContext,
        body: &WalletEnable,
    ) -> Result<serde_json::Value, ClientError> {
        self.signed(ctx, Method::PUT, "enable", &[], Some(body))
            .await
    }

    pub async fn increase(
        &self,
        ctx: &SigningContext,
        body: &WalletAdjust,
    ) -> Result<serde_json::Value, ClientError> {
        self.signed(ctx, Method::POST, "increase", &[], Some(body))
            .await
    }

    pub async fn decrease(
        &self,
        ctx: &SigningContext,
        body: &WalletAdjust,
    ) -> Result<serde_json::Value, ClientError> {
        self.signed(ctx, Method::POST, "decrease", &[], Some(body))
            .await
    }

    pub async fn transactions(
        &self,
        ctx: &SigningContext,
        user_id: &str,
        params: &[(String, String)],
    ) -> Result<RowsPage<WalletTransaction>, ClientError> {
        self.signed::<(), _>(
            ctx,
            Method::GET,
            &format!("{user_id}/transactions"),
            params,
            None,
        )
        .await
    }

    pub async fn history(
        &self,
        ctx: &SigningContext,
        user_id: &str,
        params: &[(String, String)],
    ) -> Result<RowsPage<WalletHistoryEntry>, ClientError> {
        self.signed::<(), _>(
            ctx,
            Method::GET,
            &format!("{user_id}/history"),
            params,
            None,
        )
        .await
    }
}
