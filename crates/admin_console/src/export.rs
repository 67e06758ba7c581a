//! CSV export of a whole filtered list.
//!
//! The export goes through the same fetch function as the table, with the
//! same filters and no pagination, and buffers every row before writing.

use std::io;

use api_types::transaction::Transaction;
use serde::Serialize;

use crate::{
    error::Result,
    list_query::ListFetcher,
    query_key::FilterSnapshot,
};

pub const TRANSACTIONS_FILE_NAME: &str = "Transaction_history.csv";

/// Fetches every row matching `filters`.
pub async fn fetch_all<T, F: ListFetcher<T>>(fetcher: &F, filters: &FilterSnapshot) -> Result<Vec<T>> {
    let result = fetcher.fetch(filters.params()).await?;
    tracing::info!(rows = result.content.len(), "export rows fetched");
    Ok(result.content)
}

/// Writes `rows` as CSV with a header row taken from the field names.
pub fn write_csv<W, R>(writer: W, rows: impl IntoIterator<Item = R>) -> Result<()>
where
    W: io::Write,
    R: Serialize,
{
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}

/// Flat CSV record of a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "Creation date")]
    pub created_at: String,
    #[serde(rename = "Payment method")]
    pub payment_method: String,
    #[serde(rename = "Status")]
    pub status: String,
}

impl From<Transaction> for TransactionRecord {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            website: tx.website.map(|w| w.name).unwrap_or_default(),
            amount: tx.amount,
            currency: tx.currency.unwrap_or_default(),
            created_at: tx.created_at.unwrap_or_default(),
            payment_method: tx.payment_method.map(|m| m.name).unwrap_or_default(),
            status: tx.status.unwrap_or_default(),
        }
    }
}
