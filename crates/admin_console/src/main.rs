use std::fs::File;

use admin_console::{
    cascade::DetailView,
    client::{PaymentClient, WalletClient},
    config::{
        self, AppConfig, Command, PageArgs, ReportArgs, TransactionFilters, WalletCommand, Wallets,
    },
    error::{ConsoleError, Result},
    filters::{SupportingSource, local_date},
    list_query::{ListQuery, Resolution},
    mutation::MutationOutcome,
    query_key::{Pagination, SortDirection},
    resources::{MerchantsFetcher, ReportFetcher, TransactionsFetcher, WebsitesFetcher},
    screens::{
        MerchantsScreen, ReportScreen, Table, TransactionsScreen, WalletsScreen, WebsitesScreen,
        WithdrawForm, wallets::Adjustment,
    },
};
use chrono_tz::Tz;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "admin_console={level},api_types={level}",
            level = config.level
        ))
        .init();

    let tz = config.tz()?;
    let payment = PaymentClient::new(&config.payment_url, config.bearer_token.clone())?
        .with_locale(&config.locale);

    match command {
        Command::Transactions(filters) => transactions(&config, tz, &payment, filters).await,
        Command::Export { filters, output } => {
            let mut screen = transactions_screen(&config, tz, &filters);
            let fetcher = TransactionsFetcher::new(&payment, config.merchant_id.as_deref());
            let count = screen.export(&fetcher, File::create(&output)?).await?;
            println!("{count} transactions written to {}", output.display());
            Ok(())
        }
        Command::Report(args) => report_indicators(&config, tz, &payment, args).await,
        Command::Websites(args) => {
            let mut screen = WebsitesScreen::new(config.merchant_id.clone(), config.page_size);
            apply_page(&mut screen.table, &args);
            let fetcher = WebsitesFetcher::new(&payment, config.merchant_id.as_deref());
            check(screen.sync(&fetcher).await)?;
            print_page(&screen.table.query, screen.table.pagination, |w| {
                format!("{}\t{}\t{}", w.id, w.name, w.url.as_deref().unwrap_or("-"))
            });
            Ok(())
        }
        Command::Merchants(args) => {
            let mut screen = MerchantsScreen::new(config.page_size);
            apply_page(&mut screen.table, &args);
            check(screen.sync(&MerchantsFetcher::new(&payment)).await)?;
            print_page(&screen.table.query, screen.table.pagination, |m| {
                format!(
                    "{}\t{}\t{}",
                    m.id,
                    m.username.as_deref().unwrap_or("-"),
                    m.email.as_deref().unwrap_or("-")
                )
            });
            Ok(())
        }
        Command::Wallets(args) => wallets(&config, &payment, args).await,
        Command::Withdraw { amount } => {
            let mut form = WithdrawForm::new();
            form.set_amount(&amount);
            form.open_confirm()
                .map_err(|err| ConsoleError::Generic(err.to_string()))?;
            let outcome = form
                .submit(|amount| payment.request_withdraw(amount))
                .await;
            report(outcome)
        }
    }
}

fn apply_page<T>(table: &mut Table<T>, args: &PageArgs) {
    table.on_page_change(args.page);
    if let Some(filter) = &args.filter {
        let mut parts = filter.splitn(3, ':');
        if let (Some(field), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next()) {
            table.on_filter_change(field, operator, value);
        } else {
            tracing::warn!(%filter, "ignoring malformed column filter");
        }
    }
}

fn transactions_screen(config: &AppConfig, tz: Tz, args: &TransactionFilters) -> TransactionsScreen {
    let mut screen = TransactionsScreen::new(config.merchant_id.clone(), config.page_size);
    apply_page(&mut screen.table, &args.page);

    let filters = &mut screen.filters;
    if let Some(id) = &args.transaction_id {
        filters.set_transaction_draft(id);
        filters.search_transaction();
    }
    if let Some(website) = &args.website_id {
        filters.set_website(website);
    }
    if let Some(method) = &args.payment_method_id {
        filters.set_payment_method(method);
    }
    if let Some(status) = &args.status_id {
        filters.set_status(status);
    }
    let start = args.from.and_then(|day| local_date(tz, day, 0, 0));
    let end = args.to.and_then(|day| local_date(tz, day, 0, 0));
    filters.confirm_range(start, end);

    if let Some(field) = &args.sort {
        let direction = if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        screen.table.on_sort_change(Some((field.as_str(), direction)));
    }
    screen
}

async fn transactions(
    config: &AppConfig,
    tz: Tz,
    payment: &PaymentClient,
    args: TransactionFilters,
) -> Result<()> {
    let mut screen = transactions_screen(config, tz, &args);
    screen.load_supporting(payment).await;
    if let Some(label) = screen.filters.picker_label() {
        println!("date range: {label}");
    }

    let fetcher = TransactionsFetcher::new(payment, config.merchant_id.as_deref());
    check(screen.sync(&fetcher).await)?;
    print_page(&screen.table.query, screen.table.pagination, |tx| {
        format!(
            "{}\t{}\t{}\t{}",
            tx.id,
            tx.amount,
            tx.status.as_deref().unwrap_or("-"),
            tx.created_at.as_deref().unwrap_or("-")
        )
    });
    Ok(())
}

async fn report_indicators(
    config: &AppConfig,
    tz: Tz,
    payment: &PaymentClient,
    args: ReportArgs,
) -> Result<()> {
    let mut screen = ReportScreen::new(config.merchant_id.clone());
    screen.load_supporting(payment).await;

    let filters = &mut screen.filters;
    if let Some(website) = &args.website_id {
        filters.set_website(website);
    }
    if let Some(method) = &args.payment_method_id {
        filters.set_payment_method(method);
    }
    let start = args.from.and_then(|day| local_date(tz, day, 0, 0));
    let end = args.to.and_then(|day| local_date(tz, day, 0, 0));
    filters.confirm_range(start, end);
    if let Some(label) = filters.picker_label() {
        println!("period: {label}");
    }

    let fetcher = ReportFetcher::new(payment, config.merchant_id.as_deref());
    check(screen.sync(&fetcher).await)?;
    let indicators = screen.indicators();
    let currency = indicators.currency.as_deref().unwrap_or("");
    println!("total revenue\t{} {currency}", indicators.total_revenue);
    println!("net revenue\t{} {currency}", indicators.net_revenue);
    println!("confirmed payments\t{}", indicators.confirmed_payments);
    println!("total refunds\t{} {currency}", indicators.refund_sum);
    println!("refunds\t{}", indicators.refund_count);
    Ok(())
}

async fn wallets(config: &AppConfig, payment: &PaymentClient, args: Wallets) -> Result<()> {
    let merchant_id = config
        .merchant_id
        .as_deref()
        .ok_or_else(|| ConsoleError::Generic("merchant_id is required for wallets".to_string()))?;
    let website = payment
        .merchant_websites(merchant_id)
        .await?
        .into_iter()
        .find(|website| website.id == args.website_id)
        .ok_or_else(|| ConsoleError::Generic(format!("unknown website {}", args.website_id)))?;

    let client = WalletClient::new(&config.wallet_url)?;
    let mut screen = WalletsScreen::new(config.action_owner.clone());
    screen.select_website(website);

    match args.command {
        WalletCommand::List(page) => {
            screen.graph.wallets_page.set_ui_page(page.page);
            check_all(screen.sync(&client).await)?;
            print_page(&screen.graph.wallets, screen.graph.wallets_page, |w| {
                format!("{}\t{}\t{}", w.user_id, w.balance, w.enabled)
            });
        }
        WalletCommand::Transactions { user_id, page } => {
            open_wallet(&mut screen, &client, &user_id, DetailView::Transactions).await?;
            screen.graph.transactions_page.set_ui_page(page);
            check_all(screen.sync(&client).await)?;
            print_page(&screen.graph.transactions, screen.graph.transactions_page, |t| {
                format!(
                    "{}\t{}\t{}\t{}",
                    t.id,
                    t.amount,
                    t.kind.as_deref().unwrap_or("-"),
                    t.created_at.as_deref().unwrap_or("-")
                )
            });
        }
        WalletCommand::History { user_id, page } => {
            open_wallet(&mut screen, &client, &user_id, DetailView::History).await?;
            screen.graph.history_page.set_ui_page(page);
            check_all(screen.sync(&client).await)?;
            print_page(&screen.graph.history, screen.graph.history_page, |h| {
                format!(
                    "{}\t{}\t{}\t{}",
                    h.id,
                    h.action.as_deref().unwrap_or("-"),
                    h.action_owner.as_deref().unwrap_or("-"),
                    h.comment.as_deref().unwrap_or("")
                )
            });
        }
        WalletCommand::Toggle { user_id } => {
            toggle_wallet(&mut screen, &client, &user_id).await?;
        }
        WalletCommand::Increase(adjust) => {
            adjust_wallet(&mut screen, &client, Adjustment::Increase, adjust).await?;
        }
        WalletCommand::Decrease(adjust) => {
            adjust_wallet(&mut screen, &client, Adjustment::Decrease, adjust).await?;
        }
    }
    Ok(())
}

async fn find_wallet(
    screen: &mut WalletsScreen,
    client: &WalletClient,
    user_id: &str,
) -> Result<api_types::wallet::Wallet> {
    screen
        .graph
        .find_wallet(client, user_id)
        .await?
        .ok_or_else(|| ConsoleError::Generic(format!("no wallet for user {user_id}")))
}

async fn open_wallet(
    screen: &mut WalletsScreen,
    client: &WalletClient,
    user_id: &str,
    view: DetailView,
) -> Result<()> {
    let wallet = find_wallet(screen, client, user_id).await?;
    screen
        .select_wallet(wallet)
        .map_err(|err| ConsoleError::Generic(err.to_string()))?;
    screen
        .open_detail(view)
        .map_err(|err| ConsoleError::Generic(err.to_string()))
}

async fn toggle_wallet(screen: &mut WalletsScreen, client: &WalletClient, user_id: &str) -> Result<()> {
    let wallet = find_wallet(screen, client, user_id).await?;
    screen.open_toggle(wallet);
    let outcome = screen
        .confirm_toggle(|ctx, request| async move { request.send(client, &ctx).await })
        .await;
    report(outcome)
}

async fn adjust_wallet(
    screen: &mut WalletsScreen,
    client: &WalletClient,
    adjustment: Adjustment,
    args: config::AdjustArgs,
) -> Result<()> {
    let wallet = find_wallet(screen, client, &args.user_id).await?;
    screen.open_adjust(wallet, adjustment);
    screen.amount_input = args.amount;
    screen.comment = args.comment;
    let outcome = screen
        .confirm_adjust(|ctx, request| async move { request.send(client, &ctx).await })
        .await;
    report(outcome)
}

fn check(resolution: Option<Resolution>) -> Result<()> {
    match resolution {
        Some(Resolution::Failed(message)) => Err(ConsoleError::Generic(message)),
        _ => Ok(()),
    }
}

fn check_all(resolutions: Vec<Resolution>) -> Result<()> {
    resolutions.into_iter().try_for_each(|resolution| check(Some(resolution)))
}

fn report(outcome: MutationOutcome) -> Result<()> {
    match outcome {
        MutationOutcome::Succeeded => {
            println!("done");
            Ok(())
        }
        MutationOutcome::Failed(message) => Err(ConsoleError::Generic(message)),
        MutationOutcome::Invalid(err) => Err(ConsoleError::Generic(err.to_string())),
        MutationOutcome::Skipped => Ok(()),
    }
}

fn print_page<T>(query: &ListQuery<T>, pagination: Pagination, row: impl Fn(&T) -> String) {
    for item in query.rows() {
        println!("{}", row(item));
    }
    println!(
        "page {}/{} ({} rows)",
        pagination.page(),
        pagination.page_count(query.total_rows()),
        query.total_rows()
    );
}
