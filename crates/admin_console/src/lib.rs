//! Client-side core of the payment admin console: list synchronisation,
//! filter and query-key composition, signed wallet requests, mutations and
//! the website → wallet query cascade.

pub mod cascade;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod list_query;
pub mod mutation;
pub mod query_key;
pub mod resources;
pub mod screens;
pub mod signer;

pub use error::{ConsoleError, Result};
