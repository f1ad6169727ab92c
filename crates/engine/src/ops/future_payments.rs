use chrono::{DateTime, Utc};
use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::{
    CreateFuturePaymentCmd, FuturePayment, PaymentOutcome, PaymentStatus,
    ResultEngine, ScheduledBalanceCheck, UpdateFuturePaymentCmd,
    store::LedgerStore,
    util::{ensure_amount, normalize_optional_text, normalize_required_text},
};

use super::{Engine, balances::BalanceGate, with_tx};

impl Engine {
    /// Schedules a payment. `scheduled_at` must lie in the future.
    pub async fn create_future_payment(
        &self,
        cmd: CreateFuturePaymentCmd,
    ) -> ResultEngine<FuturePayment> {
        let payment = self.build_payment(Uuid::new_v4(), cmd)?;
        payment.ensure_upcoming(self.clock.now())?;
        with_tx!(self, "create_future_payment", |db_tx| self
            .store_new_payment_in(&db_tx, &payment)
            .await)?;
        tracing::info!(payment_id = %payment.id, scheduled_at = %payment.scheduled_at, "future payment scheduled");
        Ok(payment)
    }

    async fn store_new_payment_in(
        &self,
        db_tx: &DatabaseTransaction,
        payment: &FuturePayment,
    ) -> ResultEngine<()> {
        self.check_payment_account(db_tx, payment).await?;
        LedgerStore::new(db_tx).insert_future_payment(payment).await
    }

    /// Replaces every mutable field of one of the client's payments.
    ///
    /// Unlike creation, the new `scheduled_at` may already be due; the next
    /// scheduler pass then applies it.
    pub async fn update_future_payment(
        &self,
        cmd: UpdateFuturePaymentCmd,
    ) -> ResultEngine<FuturePayment> {
        let payment = self.build_payment(cmd.payment_id, cmd.fields)?;
        with_tx!(self, "update_future_payment", |db_tx| self
            .replace_payment_in(&db_tx, &payment)
            .await)?;
        tracing::info!(payment_id = %payment.id, "future payment updated");
        Ok(payment)
    }

    async fn replace_payment_in(
        &self,
        db_tx: &DatabaseTransaction,
        payment: &FuturePayment,
    ) -> ResultEngine<()> {
        let store = LedgerStore::new(db_tx);
        store
            .owned_future_payment(payment.id, &payment.client_id)
            .await?;
        self.check_payment_account(db_tx, payment).await?;
        store.replace_future_payment(payment).await
    }

    pub async fn delete_future_payment(&self, payment_id: Uuid, client_id: &str) -> ResultEngine<()> {
        with_tx!(self, "delete_future_payment", |db_tx| LedgerStore::new(&db_tx)
            .delete_future_payment(payment_id, client_id)
            .await)?;
        tracing::info!(%payment_id, "future payment deleted");
        Ok(())
    }

    /// The client's payments, soonest first.
    pub async fn future_payments(&self, client_id: &str) -> ResultEngine<Vec<FuturePayment>> {
        self.retry_read("future_payments", || {
            self.store().future_payments_for_client(client_id)
        })
        .await
    }

    /// Payments of every client that are due at `as_of`, oldest first.
    pub async fn due_future_payments(&self, as_of: DateTime<Utc>) -> ResultEngine<Vec<FuturePayment>> {
        self.retry_read("due_future_payments", || self.store().list_due_payments(as_of))
            .await
    }

    /// Applies one due payment as a unit of work: balance move, posted
    /// entry, then reschedule or removal.
    ///
    /// The payment is re-read inside the unit of work; if it is gone or no
    /// longer due at `as_of`, nothing happens and `Skipped` is returned.
    pub async fn execute_future_payment(
        &self,
        payment_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> ResultEngine<PaymentOutcome> {
        let outcome = with_tx!(self, "execute_future_payment", |db_tx| self
            .execute_payment_in(&db_tx, payment_id, as_of)
            .await)?;
        match outcome {
            PaymentOutcome::Skipped => {
                tracing::warn!(%payment_id, "future payment skipped, no longer due");
            }
            PaymentOutcome::Rescheduled { next_scheduled_at } => {
                tracing::info!(%payment_id, %next_scheduled_at, "future payment applied and rescheduled");
            }
            PaymentOutcome::Deleted => {
                tracing::info!(%payment_id, "future payment applied and removed");
            }
        }
        Ok(outcome)
    }

    async fn execute_payment_in(
        &self,
        db_tx: &DatabaseTransaction,
        payment_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> ResultEngine<PaymentOutcome> {
        let store = LedgerStore::new(db_tx);
        let Some(payment) = store.future_payment(payment_id).await? else {
            return Ok(PaymentOutcome::Skipped);
        };
        if payment.status(as_of) != PaymentStatus::Due {
            return Ok(PaymentOutcome::Skipped);
        }
        self.check_payment_account(db_tx, &payment).await?;

        let gate = match self.config.scheduled_balance_check {
            ScheduledBalanceCheck::AllowNegative => BalanceGate::AllowNegative,
            ScheduledBalanceCheck::Enforce => BalanceGate::Enforce,
        };
        self.post_entry(db_tx, &payment.to_entry(), gate).await?;

        let outcome = payment.after_application()?;
        match outcome {
            PaymentOutcome::Rescheduled { next_scheduled_at } => {
                store.advance_schedule(&payment, next_scheduled_at).await?;
            }
            PaymentOutcome::Deleted => store.remove_applied_payment(&payment).await?,
            PaymentOutcome::Skipped => {}
        }
        Ok(outcome)
    }

    /// The payment's account must exist, belong to the payment's client and,
    /// under the same-currency policy, hold the payment's currency.
    async fn check_payment_account(
        &self,
        db_tx: &DatabaseTransaction,
        payment: &FuturePayment,
    ) -> ResultEngine<()> {
        let account = LedgerStore::new(db_tx)
            .owned_account(payment.account_id, &payment.client_id)
            .await?;
        self.ensure_currency(&account, &payment.currency_id)
    }

    fn build_payment(&self, id: Uuid, cmd: CreateFuturePaymentCmd) -> ResultEngine<FuturePayment> {
        ensure_amount(cmd.amount)?;
        let payment = FuturePayment {
            id,
            client_id: normalize_required_text(&cmd.client_id, "client")?,
            account_id: cmd.account_id,
            name: normalize_required_text(&cmd.name, "payment name")?,
            amount: cmd.amount,
            is_income: cmd.is_income,
            is_rolling: cmd.is_rolling,
            // One-off payments carry no frequency.
            frequency: cmd.frequency.filter(|_| cmd.is_rolling),
            currency_id: normalize_required_text(&cmd.currency_id, "currency")?,
            scheduled_at: cmd.scheduled_at,
            remarks: normalize_optional_text(cmd.remarks.as_deref()),
        };
        payment.validate()?;
        Ok(payment)
    }
}
