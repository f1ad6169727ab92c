//! Ledger schema.
//!
//! - `accounts`: balances, stored as two-decimal strings, with an optimistic
//!   `version`
//! - `ledger_entries`: posted transactions and expenses
//! - `future_payments`: scheduled, optionally rolling, payments

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    ClientId,
    Name,
    CurrencyId,
    Kind,
    Balance,
    Version,
    CreatedAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    ClientId,
    AccountId,
    EntryKind,
    Name,
    IsIncome,
    Amount,
    CurrencyId,
    Category,
    Remarks,
    ExecutedAt,
}

#[derive(Iden)]
enum FuturePayments {
    Table,
    Id,
    ClientId,
    AccountId,
    Name,
    Amount,
    IsIncome,
    IsRolling,
    FrequencySecs,
    CurrencyId,
    ScheduledAt,
    Remarks,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::ClientId).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::CurrencyId).string().not_null())
                    .col(ColumnDef::new(Accounts::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .string()
                            .not_null()
                            .default("0.00"),
                    )
                    .col(
                        ColumnDef::new(Accounts::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-client_id-name-unique")
                    .table(Accounts::Table)
                    .col(Accounts::ClientId)
                    .col(Accounts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::ClientId).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::AccountId).string())
                    .col(ColumnDef::new(LedgerEntries::EntryKind).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Name).string())
                    .col(ColumnDef::new(LedgerEntries::IsIncome).boolean().not_null())
                    .col(ColumnDef::new(LedgerEntries::Amount).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::CurrencyId).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Category).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Remarks).string())
                    .col(
                        ColumnDef::new(LedgerEntries::ExecutedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-account_id")
                            .from(LedgerEntries::Table, LedgerEntries::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-client_id-kind-executed_at")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::ClientId)
                    .col(LedgerEntries::EntryKind)
                    .col(LedgerEntries::ExecutedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FuturePayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FuturePayments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FuturePayments::ClientId).string().not_null())
                    .col(ColumnDef::new(FuturePayments::AccountId).string().not_null())
                    .col(ColumnDef::new(FuturePayments::Name).string().not_null())
                    .col(ColumnDef::new(FuturePayments::Amount).string().not_null())
                    .col(ColumnDef::new(FuturePayments::IsIncome).boolean().not_null())
                    .col(ColumnDef::new(FuturePayments::IsRolling).boolean().not_null())
                    .col(ColumnDef::new(FuturePayments::FrequencySecs).big_integer())
                    .col(ColumnDef::new(FuturePayments::CurrencyId).string().not_null())
                    .col(
                        ColumnDef::new(FuturePayments::ScheduledAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FuturePayments::Remarks).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-future_payments-account_id")
                            .from(FuturePayments::Table, FuturePayments::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-future_payments-scheduled_at")
                    .table(FuturePayments::Table)
                    .col(FuturePayments::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FuturePayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
