use std::path::PathBuf;

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::{
    error::{ConsoleError, Result},
    export::TRANSACTIONS_FILE_NAME,
    query_key::DEFAULT_PAGE_SIZE,
};

const DEFAULT_CONFIG_PATH: &str = "config/console.toml";
const ENV_PREFIX: &str = "ADMIN_CONSOLE";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub payment_url: String,
    pub wallet_url: String,
    /// Session token of the signed-in operator.
    pub bearer_token: Option<String>,
    pub merchant_id: Option<String>,
    /// Operator id recorded on wallet writes.
    pub action_owner: String,
    pub timezone: String,
    pub locale: String,
    pub page_size: u32,
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            payment_url: "http://127.0.0.1:8080".to_string(),
            wallet_url: "http://127.0.0.1:8081".to_string(),
            bearer_token: None,
            merchant_id: None,
            action_owner: String::new(),
            timezone: "Africa/Tunis".to_string(),
            locale: "fr".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConsoleError::Timezone(self.timezone.clone()))
    }
}

#[derive(Debug, Parser)]
#[command(name = "admin_console", disable_version_flag = true)]
#[command(about = "Payment admin console: list, filter and export resources")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the payment API base URL.
    #[arg(long)]
    payment_url: Option<String>,
    /// Override the wallet service base URL.
    #[arg(long)]
    wallet_url: Option<String>,
    /// Override the merchant scope (the bearer token is never read from CLI).
    #[arg(long)]
    merchant_id: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Override log level.
    #[arg(long)]
    level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show one page of transactions.
    Transactions(TransactionFilters),
    /// Write every transaction matching the filters to a CSV file.
    Export {
        #[command(flatten)]
        filters: TransactionFilters,
        #[arg(long, default_value = TRANSACTIONS_FILE_NAME)]
        output: PathBuf,
    },
    /// Revenue indicators over confirmed payments.
    Report(ReportArgs),
    /// Show one page of the merchant's websites.
    Websites(PageArgs),
    /// Show one page of merchants.
    Merchants(PageArgs),
    /// Wallets of one website.
    Wallets(Wallets),
    /// Request a withdrawal.
    Withdraw {
        #[arg(long)]
        amount: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// 0-based page index.
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    /// `field:operator:value`, e.g. `name:contains:shop`.
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TransactionFilters {
    #[command(flatten)]
    pub page: PageArgs,
    #[arg(long)]
    pub transaction_id: Option<String>,
    #[arg(long)]
    pub website_id: Option<String>,
    #[arg(long)]
    pub payment_method_id: Option<String>,
    #[arg(long)]
    pub status_id: Option<String>,
    /// First day of the date range (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day of the date range, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Sort field, e.g. `createdAt`.
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub desc: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    #[arg(long)]
    pub website_id: Option<String>,
    #[arg(long)]
    pub payment_method_id: Option<String>,
    /// First day of the period (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day of the period, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct Wallets {
    /// Website whose keys sign the requests.
    #[arg(long)]
    pub website_id: String,
    #[command(subcommand)]
    pub command: WalletCommand,
}

#[derive(Debug, Subcommand)]
pub enum WalletCommand {
    /// Show one page of wallets.
    List(PageArgs),
    /// Show the transactions of one wallet.
    Transactions {
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Show the history of one wallet.
    History {
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Enable or disable a wallet.
    Toggle {
        #[arg(long)]
        user_id: String,
    },
    Increase(AdjustArgs),
    Decrease(AdjustArgs),
}

#[derive(Debug, Args)]
pub struct AdjustArgs {
    #[arg(long)]
    pub user_id: String,
    #[arg(long)]
    pub amount: String,
    #[arg(long, default_value = "")]
    pub comment: String,
}

/// Layers the config file and the environment, without CLI overrides.
pub fn settings(config_path: &str) -> Result<AppConfig> {
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));
    Ok(builder.build()?.try_deserialize()?)
}

pub fn load() -> Result<(AppConfig, Command)> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut settings = settings(config_path)?;

    if let Some(payment_url) = cli.payment_url {
        settings.payment_url = payment_url;
    }
    if let Some(wallet_url) = cli.wallet_url {
        settings.wallet_url = wallet_url;
    }
    if let Some(merchant_id) = cli.merchant_id {
        settings.merchant_id = Some(merchant_id);
    }
    if let Some(timezone) = cli.timezone {
        settings.timezone = timezone;
    }
    if let Some(level) = cli.level {
        settings.level = level;
    }
    if settings.page_size == 0 {
        settings.page_size = DEFAULT_PAGE_SIZE;
    }

    Ok((settings, cli.command))
}
