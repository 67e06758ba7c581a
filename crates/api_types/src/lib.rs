//! Wire types shared by the payment API and the wallet service.
//!
//! Both services are JSON over HTTP with camelCase field names. List
//! endpoints answer with a [`list::RowsPage`], whose `count` may be either a
//! number or a numeric string depending on the endpoint.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

pub mod list {
    use super::*;

    /// Total row count as sent by the server.
    ///
    /// Observed payloads carry both `"37"` and `37`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum RowsLength {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    impl Default for RowsLength {
        fn default() -> Self {
            Self::Integer(0)
        }
    }

    impl RowsLength {
        /// Reads the count as a whole number. Surrounding whitespace is
        /// ignored and fractional values are truncated (`"37"`, `" 37 "`,
        /// `"37.0"` are all 37). Anything that is not entirely numeric, such
        /// as `"37abc"`, and negative values yield `None`.
        pub fn normalize(&self) -> Option<u64> {
            match self {
                Self::Integer(value) => u64::try_from(*value).ok(),
                Self::Float(value) => float_count(*value),
                Self::Text(value) => {
                    let value = value.trim();
                    value
                        .parse::<u64>()
                        .ok()
                        .or_else(|| value.parse::<f64>().ok().and_then(float_count))
                }
            }
        }
    }

    fn float_count(value: f64) -> Option<u64> {
        if value.is_finite() && value >= 0.0 {
            Some(value.trunc() as u64)
        } else {
            None
        }
    }

    impl From<u64> for RowsLength {
        fn from(value: u64) -> Self {
            Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
        }
    }

    impl From<&str> for RowsLength {
        fn from(value: &str) -> Self {
            Self::Text(value.to_string())
        }
    }

    /// Page of rows as returned by list endpoints.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RowsPage<T> {
        #[serde(default = "Vec::new")]
        pub rows: Vec<T>,
        #[serde(default)]
        pub count: RowsLength,
    }

    /// The contract every list fetch returns, regardless of resource.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListResult<T> {
        pub content: Vec<T>,
        pub rows_length: RowsLength,
    }

    impl<T> From<RowsPage<T>> for ListResult<T> {
        fn from(page: RowsPage<T>) -> Self {
            Self {
                content: page.rows,
                rows_length: page.count,
            }
        }
    }
}

pub mod error {
    use super::*;

    /// Error body returned by both services on non-2xx responses.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ErrorBody {
        #[serde(default)]
        pub message: Option<String>,
        /// Field validation errors, keyed by field name.
        #[serde(default)]
        pub errors: Option<BTreeMap<String, serde_json::Value>>,
    }

    impl ErrorBody {
        /// Renders field errors as `field: reason` lines, falling back to the
        /// plain message.
        pub fn describe(&self) -> Option<String> {
            if let Some(errors) = &self.errors {
                let mut out = String::new();
                for (field, reason) in errors {
                    let reason = match reason {
                        serde_json::Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    out.push_str(&format!("{field}: {reason}\n"));
                }
                return Some(out);
            }
            self.message.clone()
        }
    }
}

pub mod website {
    use super::*;

    /// A merchant website. Owns the key pair used to sign wallet requests.
    #[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Website {
        pub id: String,
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub url: Option<String>,
        #[serde(default)]
        pub public_key: Option<String>,
        #[serde(default)]
        pub secret_key: Option<String>,
        #[serde(default)]
        pub merchant_id: Option<String>,
        #[serde(default)]
        pub enabled: Option<bool>,
        #[serde(default)]
        pub payment_methods: Vec<String>,
    }

    impl fmt::Debug for Website {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Website")
                .field("id", &self.id)
                .field("name", &self.name)
                .field("url", &self.url)
                .field("public_key", &self.public_key)
                .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
                .field("merchant_id", &self.merchant_id)
                .field("enabled", &self.enabled)
                .finish()
        }
    }

    /// Create/update body for a website.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WebsiteUpsert {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub id: Option<String>,
        pub name: String,
        pub url: String,
        #[serde(default)]
        pub payment_methods: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub enabled: Option<bool>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct PaymentMethod {
        pub id: String,
        pub name: String,
    }
}

pub mod merchant {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Merchant {
        pub id: String,
        #[serde(default)]
        pub username: Option<String>,
        #[serde(default)]
        pub email: Option<String>,
        #[serde(default)]
        pub first_name: Option<String>,
        #[serde(default)]
        pub last_name: Option<String>,
        #[serde(default)]
        pub enabled: Option<bool>,
        /// Free-form profile attributes (currency, country, phone, address).
        #[serde(default)]
        pub attributes: Option<serde_json::Value>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MerchantUpsert {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub id: Option<String>,
        pub username: String,
        pub email: String,
        pub first_name: String,
        pub last_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub currency_iso_code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub country_iso_code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub phone_number: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub address: Option<String>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct WebsiteRef {
        #[serde(default)]
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct PaymentMethodRef {
        #[serde(default)]
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Transaction {
        pub id: String,
        #[serde(default)]
        pub amount: f64,
        #[serde(default)]
        pub currency: Option<String>,
        #[serde(default)]
        pub status: Option<String>,
        #[serde(default)]
        pub created_at: Option<String>,
        #[serde(default)]
        pub website: Option<WebsiteRef>,
        #[serde(default)]
        pub payment_method: Option<PaymentMethodRef>,
        #[serde(default)]
        pub customer_email: Option<String>,
    }

    /// One entry of the transaction status list.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TransactionStatus {
        pub id: u32,
        pub label: String,
        #[serde(default)]
        pub color: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BankTransferCompletion {
        pub transaction_id: String,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Wallet {
        #[serde(default)]
        pub id: Option<String>,
        pub user_id: String,
        #[serde(default)]
        pub balance: f64,
        #[serde(default)]
        pub enabled: bool,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WalletTransaction {
        pub id: String,
        #[serde(default)]
        pub amount: f64,
        #[serde(default, rename = "type")]
        pub kind: Option<String>,
        #[serde(default)]
        pub created_at: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WalletHistoryEntry {
        pub id: String,
        #[serde(default)]
        pub action: Option<String>,
        #[serde(default)]
        pub action_owner: Option<String>,
        #[serde(default)]
        pub comment: Option<String>,
        #[serde(default)]
        pub amount: Option<f64>,
        #[serde(default)]
        pub created_at: Option<String>,
    }

    /// Body of `PUT /wallet/enable`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WalletEnable {
        pub user_id: String,
        pub action_owner: String,
        pub enabled: bool,
    }

    /// Body of `POST /wallet/increase` and `POST /wallet/decrease`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WalletAdjust {
        pub user_id: String,
        pub action_owner: String,
        pub comment: String,
        pub amount: f64,
    }
}

pub mod withdraw {
    use super::*;

    pub const REJECTED: &str = "REJECTED";

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct WithdrawRequest {
        pub amount: f64,
    }

    /// Withdrawal answer. A 200 response may still carry a rejection.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct WithdrawResult {
        #[serde(rename = "TRANSACTION_STATE", default)]
        pub transaction_state: Option<String>,
        #[serde(rename = "MESSAGE", default)]
        pub message: Option<String>,
    }

    impl WithdrawResult {
        pub fn is_rejected(&self) -> bool {
            self.transaction_state.as_deref() == Some(REJECTED)
        }
    }
}

pub mod report {
    use super::{
        list::{ListResult, RowsPage},
        transaction::Transaction,
        *,
    };

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct RefundTotals {
        #[serde(default)]
        pub count: u64,
        #[serde(default)]
        pub sum: f64,
    }

    /// Revenue indicators over the confirmed transactions of a period.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Report {
        #[serde(default)]
        pub total_revenue: f64,
        /// Total revenue minus refunds.
        #[serde(default)]
        pub net_revenue: f64,
        #[serde(default)]
        pub currency_iso_code: Option<String>,
        #[serde(default)]
        pub transactions: Option<RowsPage<Transaction>>,
        #[serde(default)]
        pub total_refund: RefundTotals,
    }

    impl Report {
        /// Number of captured payments, 0 when absent or malformed.
        pub fn confirmed_count(&self) -> u64 {
            self.transactions
                .as_ref()
                .and_then(|page| page.count.normalize())
                .unwrap_or(0)
        }
    }

    impl From<Report> for ListResult<Report> {
        fn from(report: Report) -> Self {
            let count = report.confirmed_count();
            Self {
                content: vec![report],
                rows_length: count.into(),
            }
        }
    }
}
