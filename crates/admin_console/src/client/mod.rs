//! HTTP clients for the payment API and the wallet service.

use api_types::error::ErrorBody;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

mod payment;
mod wallet;

pub use payment::PaymentClient;
pub use wallet::WalletClient;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{0}")]
    Server(String),
    #[error("missing signing credentials: {0}")]
    MissingCredentials(&'static str),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Message shown to the user. Server-provided text is passed verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Conflict(message) | Self::Validation(message) | Self::Server(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Parses `base` and makes sure it ends with a slash, so relative joins keep
/// the whole path.
pub(crate) fn base_url(base: &str, suffix: &str) -> Result<Url, ClientError> {
    let mut raw = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        suffix.trim_matches('/')
    );
    raw.push('/');
    Url::parse(&raw).map_err(|err| ClientError::Server(format!("invalid base_url: {err}")))
}

pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|err| ClientError::Server(format!("invalid endpoint {path}: {err}")))
}

/// Decodes a success body or maps the failure status to a [`ClientError`].
pub(crate) async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    if res.status().is_success() {
        return res.json::<T>().await.map_err(ClientError::Transport);
    }
    Err(error_for(res).await)
}

pub(crate) async fn error_for(res: Response) -> ClientError {
    let status = res.status();
    let body = res
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.describe())
        .unwrap_or_else(|| "unknown error".to_string());

    match status.as_u16() {
        401 => ClientError::Unauthorized,
        403 => ClientError::Forbidden,
        404 => ClientError::NotFound,
        409 => ClientError::Conflict(body),
        422 => ClientError::Validation(body),
        _ => ClientError::Server(body),
    }
}
