use std::{error::Error, sync::Arc};

use clap::{Args, Parser, Subcommand};
use engine::{
    AccountKind, CreateAccountCmd, Engine, ErrorPolicy, Money, Scheduler, SchedulerConfig,
    SystemClock,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "tally_admin")]
#[command(about = "Admin utilities for Tally (bootstrap accounts, run due payments)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./tally.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(Account),
    Payments(Payments),
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    Show(AccountShowArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    client: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "EUR")]
    currency: String,
    #[arg(long, default_value = "bank", value_parser = parse_kind)]
    kind: AccountKind,
    #[arg(long, value_parser = parse_money)]
    balance: Option<Money>,
}

#[derive(Args, Debug)]
struct AccountShowArgs {
    #[arg(long)]
    client: String,
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Payments {
    #[command(subcommand)]
    command: PaymentsCommand,
}

#[derive(Subcommand, Debug)]
enum PaymentsCommand {
    /// Apply every payment due now, once.
    RunDue {
        /// Stop at the first failing payment.
        #[arg(long)]
        fail_fast: bool,
    },
}

fn parse_kind(raw: &str) -> Result<AccountKind, String> {
    AccountKind::try_from(raw.to_ascii_lowercase().as_str()).map_err(|err| err.to_string())
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse().map_err(|err: engine::EngineError| err.to_string())
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            let mut cmd = CreateAccountCmd::new(args.client, args.name, args.currency, args.kind);
            if let Some(balance) = args.balance {
                cmd = cmd.opening_balance(balance);
            }
            let account = engine.create_account(cmd).await?;
            println!(
                "created account: {} ({}) balance {} {}",
                account.name,
                account.id,
                account.balance.to_stored_string(),
                account.currency_id
            );
        }
        Command::Account(Account {
            command: AccountCommand::Show(args),
        }) => {
            let account = engine.account(args.id, &args.client).await?;
            println!(
                "{} ({}) [{}] balance {} {}",
                account.name,
                account.id,
                account.kind.as_str(),
                account.balance.to_stored_string(),
                account.currency_id
            );
        }
        Command::Payments(Payments {
            command: PaymentsCommand::RunDue { fail_fast },
        }) => {
            let config = SchedulerConfig {
                error_policy: if fail_fast {
                    ErrorPolicy::FailFast
                } else {
                    ErrorPolicy::ContinueOnError
                },
                ..SchedulerConfig::default()
            };
            let scheduler = Scheduler::new(Arc::new(engine), Arc::new(SystemClock), config)?;
            let report = scheduler.run_once().await?;
            println!(
                "applied: {}, skipped: {}, failed: {}",
                report.applied.len(),
                report.skipped.len(),
                report.failed.len()
            );
            for (payment_id, err) in &report.failed {
                eprintln!("payment {payment_id} failed: {err}");
            }
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
