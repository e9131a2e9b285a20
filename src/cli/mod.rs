use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use crate::application::{ReportingService, TransactionFilter, WalletService};
use crate::domain::{
    Account, Category, LedgerEntry, TransactionKind, TransferLink, format_cents, parse_cents,
};
use crate::storage::{DEFAULT_DATABASE_PATH, DateRange, StoreConfig};

/// Purse - multi-user personal finance wallet
#[derive(Parser)]
#[command(name = "purse")]
#[command(about = "A personal finance wallet with derived balances and atomic transfers")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "PURSE_DATABASE", default_value = DEFAULT_DATABASE_PATH)]
    pub database: PathBuf,

    /// Username of the acting account
    #[arg(short, long, env = "PURSE_USER", global = true)]
    pub user: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Create a new account
    Register {
        /// Username (must be unique)
        username: String,

        /// Email address (must be unique)
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long, env = "PURSE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Check an email and password
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long, env = "PURSE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Record money coming in
    Income(EntryArgs),

    /// Record money going out
    Expense(EntryArgs),

    /// Send money to another account
    Transfer {
        /// Amount to transfer (e.g., "40.00" or "40")
        amount: String,

        /// Receiver username
        #[arg(long)]
        to: String,

        /// Note attached to both sides of the transfer
        #[arg(short, long)]
        note: Option<String>,

        /// Date of the transfer (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show the acting account's balance
    Balance,

    /// Show details about the acting account
    Info,

    /// List the accounts you can transfer to
    Accounts,

    /// List transactions, newest first
    History {
        /// Filter by kind: income, expense
        #[arg(long)]
        kind: Option<String>,

        /// Filter by category label
        #[arg(long)]
        category: Option<String>,

        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from_date: Option<String>,

        /// Filter to date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to_date: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show detailed transaction information
    Show {
        /// Transaction ID
        id: String,
    },

    /// List the categories offered for a kind
    Categories {
        /// income or expense
        kind: String,
    },

    /// Generate reports and analytics
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions (csv), account (json)
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify ledger integrity
    Check,

    /// Delete the acting account and all of its transactions
    DeleteAccount {
        /// Required to actually delete
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(clap::Args)]
pub struct EntryArgs {
    /// Amount (e.g., "50.00" or "50")
    pub amount: String,

    /// Category (see `purse categories <kind>`); "Others" needs --label
    #[arg(short, long)]
    pub category: String,

    /// Custom category name when --category is "Others"
    #[arg(long)]
    pub label: Option<String>,

    /// Free-text reference
    #[arg(short, long)]
    pub reference: Option<String>,

    /// Date of the transaction (YYYY-MM-DD, defaults to now)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Balance, all-time cash flow, top categories and recent transactions
    Summary {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Expense breakdown by category
    Categories {
        /// Start date (YYYY-MM-DD, defaults to all history)
        #[arg(long)]
        from: Option<String>,

        /// End date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// One month against the month before it
    Month {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Expense per day of a month
    Daily {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Transactions grouped by day with each day's net total
    Days {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.database)
    }

    async fn connect(&self) -> Result<WalletService> {
        Ok(WalletService::connect(&self.store_config()).await?)
    }

    async fn acting_account(&self, service: &WalletService) -> Result<Account> {
        let username = self
            .user
            .as_deref()
            .context("No acting account: pass --user or set PURSE_USER")?;
        Ok(service.find_account_by_username(username).await?)
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            Commands::Init => {
                WalletService::init(&self.store_config()).await?;
                println!("Database initialized: {}", self.database.display());
            }

            Commands::Register {
                username,
                email,
                password,
            } => {
                let service = self.connect().await?;
                let account = service.register(username, email, password).await?;
                println!("Registered {} <{}> ({})", account.username, account.email, account.id);
            }

            Commands::Login { email, password } => {
                let service = self.connect().await?;
                let account = service.authenticate(email, password).await?;
                println!("Logged in as {}", account.username);
                println!("Use --user {} (or PURSE_USER) for ledger commands", account.username);
            }

            Commands::Income(args) => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                run_entry_command(&service, &account, TransactionKind::Income, args).await?;
            }

            Commands::Expense(args) => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                run_entry_command(&service, &account, TransactionKind::Expense, args).await?;
            }

            Commands::Transfer {
                amount,
                to,
                note,
                date,
            } => {
                let service = self.connect().await?;
                let sender = self.acting_account(&service).await?;
                let receiver = service.find_receiver(to).await?;
                let amount_cents =
                    parse_cents(amount).context("Invalid amount format. Use '40.00' or '40'")?;
                let timestamp = parse_optional_date(date.as_deref())?;

                let receipt = service
                    .record_transfer_at(
                        sender.id,
                        receiver.id,
                        amount_cents,
                        note.as_deref(),
                        timestamp,
                    )
                    .await?;

                println!(
                    "Sent {} to {} ({} / {})",
                    format_cents(amount_cents),
                    receiver.username,
                    receipt.expense_id,
                    receipt.income_id
                );
            }

            Commands::Balance => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                let balance = service.balance(account.id).await?;
                println!("{}: {}", account.username, format_cents(balance));
            }

            Commands::Info => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                run_info_command(&service, &account).await?;
            }

            Commands::Accounts => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                let others = service.list_counterparties(account.id).await?;
                if others.is_empty() {
                    println!("No other accounts.");
                } else {
                    for other in others {
                        println!("{}", other.username);
                    }
                }
            }

            Commands::History {
                kind,
                category,
                from_date,
                to_date,
                limit,
            } => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                let kind = kind
                    .as_deref()
                    .map(str::parse::<TransactionKind>)
                    .transpose()
                    .map_err(|e| anyhow::anyhow!(e))?;
                let filter = TransactionFilter {
                    kind,
                    category: category.clone(),
                    range: parse_date_range(from_date.as_deref(), to_date.as_deref())?,
                    limit: *limit,
                };
                run_history_command(&service, &account, filter).await?;
            }

            Commands::Show { id } => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                let transaction_id =
                    Uuid::parse_str(id).context("Invalid transaction ID format (expected UUID)")?;
                let entry = service.get_transaction(account.id, transaction_id).await?;
                run_show_command(&entry);
            }

            Commands::Categories { kind } => {
                let service = self.connect().await?;
                let kind: TransactionKind = kind.parse().map_err(|e| anyhow::anyhow!("{}", e))?;
                for label in service.categories_for(kind) {
                    println!("{}", label);
                }
            }

            Commands::Report(cmd) => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                let reporting = ReportingService::new(service.repository().clone());
                run_report_command(&reporting, &account, cmd).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                run_export_command(&service, &account, export_type, output.as_deref()).await?;
            }

            Commands::Check => {
                let service = self.connect().await?;
                run_check_command(&service).await?;
            }

            Commands::DeleteAccount { confirm } => {
                let service = self.connect().await?;
                let account = self.acting_account(&service).await?;
                if !confirm {
                    anyhow::bail!(
                        "Refusing to delete '{}' without --confirm. All of its transactions will be removed.",
                        account.username
                    );
                }
                service.delete_account(account.id).await?;
                println!("Deleted account {}", account.username);
            }
        }

        Ok(())
    }
}

async fn run_entry_command(
    service: &WalletService,
    account: &Account,
    kind: TransactionKind,
    args: &EntryArgs,
) -> Result<()> {
    let amount_cents =
        parse_cents(&args.amount).context("Invalid amount format. Use '50.00' or '50'")?;
    let category = Category::from_selection(&args.category, args.label.as_deref())
        .map_err(|e| anyhow::anyhow!("Invalid category: {}", e))?;
    let timestamp = parse_optional_date(args.date.as_deref())?;

    let id = service
        .record_transaction_at(
            account.id,
            amount_cents,
            kind,
            category.clone(),
            args.reference.clone(),
            timestamp,
        )
        .await?;

    println!(
        "Recorded {}: {} [{}] ({})",
        kind,
        format_cents(amount_cents),
        category.normalized(),
        id
    );
    Ok(())
}

async fn run_info_command(service: &WalletService, account: &Account) -> Result<()> {
    let info = service.account_info(account.id).await?;

    println!("Account: {}", info.account.username);
    println!("  ID:            {}", info.account.id);
    println!("  Email:         {}", info.account.email);
    println!(
        "  Created:       {}",
        info.account.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!("  Balance:       {}", format_cents(info.balance));
    println!("  Income:        {} transaction(s)", info.income_count);
    println!("  Expense:       {} transaction(s)", info.expense_count);
    if let Some(last) = info.last_activity {
        println!("  Last activity: {}", last.format("%Y-%m-%d"));
    }
    Ok(())
}

async fn run_history_command(
    service: &WalletService,
    account: &Account,
    filter: TransactionFilter,
) -> Result<()> {
    let entries = service.transaction_history(account.id, filter).await?;

    if entries.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!(
        "{:<12} {:<8} {:>12} {:<16} REFERENCE",
        "DATE", "KIND", "AMOUNT", "CATEGORY"
    );
    println!("{}", "-".repeat(70));

    for entry in &entries {
        print_entry_row(entry);
    }
    Ok(())
}

fn print_entry_row(entry: &LedgerEntry) {
    let txn = &entry.transaction;
    let reference = txn.reference.as_deref().unwrap_or("");
    let marker = match entry.link {
        Some(TransferLink::Dangling(_)) => " (counterpart deleted)",
        _ => "",
    };

    println!(
        "{:<12} {:<8} {:>12} {:<16} {}{}",
        txn.timestamp.format("%Y-%m-%d"),
        txn.kind,
        format_cents(txn.signed_amount()),
        truncate(txn.category.label(), 16),
        truncate(reference, 30),
        marker
    );
}

fn run_show_command(entry: &LedgerEntry) {
    let txn = &entry.transaction;

    println!("Transaction: {}", txn.id);
    println!("  Sequence:    {}", txn.sequence);
    println!("  Date:        {}", txn.timestamp.format("%Y-%m-%d %H:%M:%S"));
    println!("  Kind:        {}", txn.kind);
    println!("  Amount:      {}", format_cents(txn.amount_cents));
    println!("  Category:    {}", txn.category);
    if let Some(reference) = &txn.reference {
        println!("  Reference:   {}", reference);
    }
    println!(
        "  Recorded at: {}",
        txn.recorded_at.format("%Y-%m-%d %H:%M:%S")
    );

    match entry.link {
        Some(TransferLink::Live(id)) => {
            println!();
            println!("  Transfer counterpart: {}", id);
        }
        Some(TransferLink::Dangling(id)) => {
            println!();
            println!("  Transfer counterpart: {} (deleted with its account)", id);
        }
        None => {}
    }
}

async fn run_report_command(
    reporting: &ReportingService,
    account: &Account,
    cmd: &ReportCommands,
) -> Result<()> {
    match cmd {
        ReportCommands::Summary { format } => {
            let dashboard = reporting.dashboard(account.id).await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
                return Ok(());
            }

            println!("Summary for {}", account.username);
            println!();
            println!("Balance:        {:>15}", format_cents(dashboard.balance));
            println!(
                "Total Income:   {:>15}",
                format_cents(dashboard.cash_flow.total_income)
            );
            println!(
                "Total Expense:  {:>15}",
                format_cents(dashboard.cash_flow.total_expense)
            );

            if !dashboard.categories.is_empty() {
                println!();
                println!("Top Expense Categories:");
                for (i, cat) in dashboard.categories.iter().take(10).enumerate() {
                    println!(
                        "  {}. {:<18} {:>12} ({:.1}%)",
                        i + 1,
                        truncate(&cat.category, 18),
                        format_cents(cat.total),
                        cat.percentage
                    );
                }
            }

            if !dashboard.recent.is_empty() {
                println!();
                println!("Recent Transactions:");
                for entry in &dashboard.recent {
                    print_entry_row(entry);
                }
            }
        }

        ReportCommands::Categories { from, to, format } => {
            let range = parse_date_range(from.as_deref(), to.as_deref())?;
            let categories = reporting.expense_by_category(account.id, range).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&categories)?);
                }
                "csv" => {
                    println!("category,total,count,percentage");
                    for cat in &categories {
                        println!(
                            "{},{},{},{:.2}",
                            cat.category,
                            format_cents(cat.total),
                            cat.count,
                            cat.percentage
                        );
                    }
                }
                _ => {
                    println!("{:<20} {:>12} {:>8} {:>8}", "CATEGORY", "TOTAL", "COUNT", "PERCENT");
                    println!("{}", "-".repeat(51));
                    for cat in &categories {
                        println!(
                            "{:<20} {:>12} {:>8} {:>7.1}%",
                            truncate(&cat.category, 20),
                            format_cents(cat.total),
                            cat.count,
                            cat.percentage
                        );
                    }
                    let total = categories.iter().map(|c| c.total).sum::<i64>();
                    println!("{}", "-".repeat(51));
                    println!("{:<20} {:>12}", "TOTAL", format_cents(total));
                }
            }
        }

        ReportCommands::Month { month, format } => {
            let (year, month) = parse_month(month.as_deref())?;
            let comparison = reporting.month_comparison(account.id, year, month).await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
                return Ok(());
            }

            let current = &comparison.current;
            println!("Month {}-{:02}", current.year, current.month);
            println!();
            println!("Income:              {:>15}", format_cents(current.total_income));
            println!("Expense:             {:>15}", format_cents(current.total_expense));
            println!("{}", "-".repeat(36));
            println!("Net:                 {:>15}", format_cents(current.net));
            println!(
                "Avg daily expense:   {:>15}",
                format_cents(current.average_daily_expense)
            );
            println!();
            println!(
                "Previous month ({}-{:02}) net: {} (change {})",
                comparison.previous.year,
                comparison.previous.month,
                format_cents(comparison.previous.net),
                format_cents(comparison.change)
            );
        }

        ReportCommands::Daily { month, format } => {
            let (year, month) = parse_month(month.as_deref())?;
            let days = reporting.daily_expenses(account.id, year, month).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&days)?);
                }
                "csv" => {
                    println!("date,expense");
                    for day in &days {
                        println!("{},{}", day.date, format_cents(day.amount));
                    }
                }
                _ => {
                    if days.is_empty() {
                        println!("No expenses in {}-{:02}.", year, month);
                    }
                    for day in &days {
                        println!("Day {:<4} {:>12}", day.date.day(), format_cents(day.amount));
                    }
                }
            }
        }

        ReportCommands::Days { format } => {
            let groups = reporting.daily_net_totals(account.id).await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&groups)?);
                return Ok(());
            }

            if groups.is_empty() {
                println!("No transactions found.");
            }
            for group in &groups {
                println!("{}  net {}", group.date, format_cents(group.net));
                for entry in &group.transactions {
                    print!("  ");
                    print_entry_row(entry);
                }
            }
        }
    }

    Ok(())
}

async fn run_export_command(
    service: &WalletService,
    account: &Account,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(account.id, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "account" => {
            let snapshot = exporter.export_account_json(account.id, writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported account {} with {} transactions",
                    snapshot.account.username,
                    snapshot.transactions.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, account",
                export_type
            );
        }
    }

    Ok(())
}

async fn run_check_command(service: &WalletService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!("Accounts:        {}", report.account_count);
    println!("Transactions:    {}", report.transaction_count);
    println!("Transfer halves: {}", report.transfer_halves);
    if report.dangling_links > 0 {
        println!(
            "Dangling links:  {} (counterpart account deleted, net {})",
            report.dangling_links,
            format_cents(report.dangling_net)
        );
    }
    println!(
        "Transfer net:    {:>12}  {}",
        format_cents(report.transfer_net),
        if report.transfers_balanced() {
            "OK"
        } else {
            "UNBALANCED!"
        }
    );
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    // Parse YYYY-MM-DD format
    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))?;

    // Convert to UTC datetime at midnight
    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;

    Ok(naive_datetime.and_utc())
}

fn parse_optional_date(date_str: Option<&str>) -> Result<DateTime<Utc>> {
    match date_str {
        Some(date_str) => parse_date(date_str),
        None => Ok(Utc::now()),
    }
}

/// Turn inclusive YYYY-MM-DD bounds into a half-open window.
fn parse_date_range(from: Option<&str>, to: Option<&str>) -> Result<DateRange> {
    Ok(DateRange {
        from: from.map(parse_date).transpose().context("Invalid from-date")?,
        to: to
            .map(|s| parse_date(s).map(|d| d + Duration::days(1)))
            .transpose()
            .context("Invalid to-date")?,
    })
}

fn parse_month(month_str: Option<&str>) -> Result<(i32, u32)> {
    let Some(month_str) = month_str else {
        let now = Utc::now();
        return Ok((now.year(), now.month()));
    };

    let date = NaiveDate::parse_from_str(&format!("{}-01", month_str), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}'. Use YYYY-MM", month_str))?;
    Ok((date.year(), date.month()))
}
