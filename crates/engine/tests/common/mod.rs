#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::Database;

use engine::{Account, AccountKind, CreateAccountCmd, Engine, EngineConfig, ManualClock, Money};
use migration::MigratorTrait;

pub struct Harness {
    pub engine: Arc<Engine>,
    pub clock: Arc<ManualClock>,
}

/// Saturday 2024-06-15 10:30 UTC.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
}

pub fn money(value: &str) -> Money {
    value.parse().unwrap()
}

pub async fn harness() -> Harness {
    harness_with(EngineConfig::default()).await
}

pub async fn harness_with(config: EngineConfig) -> Harness {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let engine = Engine::builder()
        .database(db)
        .config(config)
        .clock(clock.clone())
        .build()
        .await
        .unwrap();
    Harness {
        engine: Arc::new(engine),
        clock,
    }
}

pub async fn open_account(
    engine: &Engine,
    client_id: &str,
    name: &str,
    currency_id: &str,
    balance: &str,
) -> Account {
    engine
        .create_account(
            CreateAccountCmd::new(client_id, name, currency_id, AccountKind::Bank)
                .opening_balance(money(balance)),
        )
        .await
        .unwrap()
}

pub async fn balance_of(engine: &Engine, account: &Account) -> String {
    engine
        .account(account.id, &account.client_id)
        .await
        .unwrap()
        .balance
        .to_stored_string()
}
