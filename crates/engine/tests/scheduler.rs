mod common;

use std::{sync::Arc, time::Duration};

use chrono::TimeDelta;
use tokio::sync::watch;

use common::{Harness, balance_of, harness, harness_with, money, open_account, start};
use engine::{
    Clock, CreateFuturePaymentCmd, EngineConfig, EntryKind, ErrorKind, ErrorPolicy,
    FUTURE_PAYMENT_CATEGORY, Frequency, PaymentOutcome, ScheduledBalanceCheck, Scheduler,
    SchedulerConfig, UpdateFuturePaymentCmd,
};

fn scheduler(h: &Harness, error_policy: ErrorPolicy) -> Scheduler {
    let clock: Arc<dyn Clock> = h.clock.clone();
    Scheduler::new(
        h.engine.clone(),
        clock,
        SchedulerConfig {
            interval: Duration::from_secs(3600),
            error_policy,
        },
    )
    .unwrap()
}

#[tokio::test]
async fn rolling_payment_applies_and_advances_from_its_schedule() {
    let h = harness().await;
    let account = open_account(&h.engine, "alice", "HSBC", "HKD", "50.00").await;
    let yesterday = start() - TimeDelta::days(1);

    h.clock.set(start() - TimeDelta::days(2));
    let payment = h
        .engine
        .create_future_payment(
            CreateFuturePaymentCmd::new("alice", account.id, "Salary", money("50.00"), "HKD", yesterday)
                .income(true)
                .rolling(Frequency::days(30).unwrap()),
        )
        .await
        .unwrap();
    h.clock.set(start());

    let report = scheduler(&h, ErrorPolicy::ContinueOnError)
        .run_once()
        .await
        .unwrap();
    assert_eq!(report.applied, vec![payment.id]);
    assert!(report.is_clean());

    assert_eq!(balance_of(&h.engine, &account).await, "100.00");
    let payments = h.engine.future_payments("alice").await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].scheduled_at, yesterday + TimeDelta::days(30));
    assert_eq!(payments[0].amount, payment.amount);
    assert_eq!(payments[0].frequency, payment.frequency);

    let entries = h
        .engine
        .entries("alice", EntryKind::Transaction)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, FUTURE_PAYMENT_CATEGORY);
    assert_eq!(entries[0].executed_at, yesterday);
    assert_eq!(entries[0].name.as_deref(), Some("Salary"));
}

#[tokio::test]
async fn one_off_payment_is_applied_exactly_once() {
    let h = harness().await;
    let account = open_account(&h.engine, "alice", "HSBC", "HKD", "50.00").await;
    let payment = h
        .engine
        .create_future_payment(CreateFuturePaymentCmd::new(
            "alice",
            account.id,
            "Insurance",
            money("20.00"),
            "HKD",
            start() + TimeDelta::hours(1),
        ))
        .await
        .unwrap();

    let scheduler = scheduler(&h, ErrorPolicy::ContinueOnError);
    let report = scheduler.run_once().await.unwrap();
    assert!(report.applied.is_empty(), "not due yet");

    h.clock.advance(TimeDelta::hours(2));
    let report = scheduler.run_once().await.unwrap();
    assert_eq!(report.applied, vec![payment.id]);
    assert_eq!(balance_of(&h.engine, &account).await, "30.00");
    assert!(h.engine.future_payments("alice").await.unwrap().is_empty());

    let report = scheduler.run_once().await.unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(balance_of(&h.engine, &account).await, "30.00");

    let outcome = h
        .engine
        .execute_future_payment(payment.id, h.clock.now())
        .await
        .unwrap();
    assert_eq!(outcome, PaymentOutcome::Skipped);
}

#[tokio::test]
async fn overdue_rolling_payment_catches_up_one_period_per_pass() {
    let h = harness().await;
    let account = open_account(&h.engine, "alice", "HSBC", "HKD", "0").await;
    let first = start() + TimeDelta::days(1);
    h.engine
        .create_future_payment(
            CreateFuturePaymentCmd::new("alice", account.id, "Rent", money("10"), "HKD", first)
                .income(true)
                .rolling(Frequency::days(30).unwrap()),
        )
        .await
        .unwrap();

    h.clock.set(first + TimeDelta::days(65));
    let scheduler = scheduler(&h, ErrorPolicy::ContinueOnError);
    for _ in 0..3 {
        assert_eq!(scheduler.run_once().await.unwrap().applied.len(), 1);
    }
    assert!(scheduler.run_once().await.unwrap().applied.is_empty());

    assert_eq!(balance_of(&h.engine, &account).await, "30.00");
    let payments = h.engine.future_payments("alice").await.unwrap();
    assert_eq!(payments[0].scheduled_at, first + TimeDelta::days(90));
}

#[tokio::test]
async fn scheduled_payments_may_overdraw_by_default() {
    let h = harness().await;
    let account = open_account(&h.engine, "alice", "HSBC", "HKD", "10.00").await;
    h.engine
        .create_future_payment(CreateFuturePaymentCmd::new(
            "alice",
            account.id,
            "Tax",
            money("25.00"),
            "HKD",
            start() + TimeDelta::minutes(5),
        ))
        .await
        .unwrap();
    h.clock.advance(TimeDelta::hours(1));

    let report = scheduler(&h, ErrorPolicy::ContinueOnError)
        .run_once()
        .await
        .unwrap();
    assert_eq!(report.applied.len(), 1);
    assert_eq!(balance_of(&h.engine, &account).await, "-15.00");
}

async fn failing_then_succeeding(h: &Harness) -> (engine::Account, engine::Account) {
    let poor = open_account(&h.engine, "alice", "Poor", "HKD", "10.00").await;
    let rich = open_account(&h.engine, "alice", "Rich", "HKD", "0").await;
    h.engine
        .create_future_payment(CreateFuturePaymentCmd::new(
            "alice",
            poor.id,
            "Car",
            money("500"),
            "HKD",
            start() + TimeDelta::hours(1),
        ))
        .await
        .unwrap();
    h.engine
        .create_future_payment(
            CreateFuturePaymentCmd::new(
                "alice",
                rich.id,
                "Bonus",
                money("5"),
                "HKD",
                start() + TimeDelta::hours(2),
            )
            .income(true),
        )
        .await
        .unwrap();
    h.clock.advance(TimeDelta::hours(3));
    (poor, rich)
}

fn enforcing() -> EngineConfig {
    EngineConfig {
        scheduled_balance_check: ScheduledBalanceCheck::Enforce,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn fail_fast_stops_the_pass() {
    let h = harness_with(enforcing()).await;
    let (poor, rich) = failing_then_succeeding(&h).await;

    let report = scheduler(&h, ErrorPolicy::FailFast)
        .run_once()
        .await
        .unwrap();
    assert!(report.aborted);
    assert!(report.applied.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].1.kind(), ErrorKind::InsufficientBalance);

    assert_eq!(balance_of(&h.engine, &poor).await, "10.00");
    assert_eq!(balance_of(&h.engine, &rich).await, "0.00");
    assert_eq!(h.engine.future_payments("alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn continue_on_error_isolates_failures() {
    let h = harness_with(enforcing()).await;
    let (poor, rich) = failing_then_succeeding(&h).await;

    let report = scheduler(&h, ErrorPolicy::ContinueOnError)
        .run_once()
        .await
        .unwrap();
    assert!(!report.aborted);
    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.failed.len(), 1);

    assert_eq!(balance_of(&h.engine, &poor).await, "10.00");
    assert_eq!(balance_of(&h.engine, &rich).await, "5.00");
    // The failed one-off payment stays due for the next pass.
    let remaining = h.engine.future_payments("alice").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Car");
}

#[tokio::test]
async fn creation_rules() {
    let h = harness().await;
    let account = open_account(&h.engine, "alice", "HSBC", "HKD", "0").await;

    let past = CreateFuturePaymentCmd::new("alice", account.id, "Late", money("1"), "HKD", start());
    let err = h.engine.create_future_payment(past).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut rolling = CreateFuturePaymentCmd::new(
        "alice",
        account.id,
        "Gym",
        money("1"),
        "HKD",
        start() + TimeDelta::days(1),
    );
    rolling.is_rolling = true;
    let err = h.engine.create_future_payment(rolling).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let foreign = CreateFuturePaymentCmd::new(
        "bob",
        account.id,
        "Gym",
        money("1"),
        "HKD",
        start() + TimeDelta::days(1),
    );
    let err = h.engine.create_future_payment(foreign).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn update_and_delete_respect_ownership() {
    let h = harness().await;
    let account = open_account(&h.engine, "alice", "HSBC", "HKD", "0").await;
    let payment = h
        .engine
        .create_future_payment(CreateFuturePaymentCmd::new(
            "alice",
            account.id,
            "Gym",
            money("30"),
            "HKD",
            start() + TimeDelta::days(1),
        ))
        .await
        .unwrap();

    let stolen = CreateFuturePaymentCmd::new(
        "bob",
        account.id,
        "Gym",
        money("1"),
        "HKD",
        start() + TimeDelta::days(1),
    );
    let err = h
        .engine
        .update_future_payment(UpdateFuturePaymentCmd::new(payment.id, stolen))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = h
        .engine
        .delete_future_payment(payment.id, "bob")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let updated = h
        .engine
        .update_future_payment(UpdateFuturePaymentCmd::new(
            payment.id,
            CreateFuturePaymentCmd::new(
                "alice",
                account.id,
                "Gym (annual)",
                money("300"),
                "HKD",
                start() + TimeDelta::days(7),
            )
            .rolling(Frequency::days(365).unwrap())
            .remarks("renews every June"),
        ))
        .await
        .unwrap();
    let stored = h.engine.future_payments("alice").await.unwrap();
    assert_eq!(stored, vec![updated]);
    assert!(stored[0].is_rolling);
    assert_eq!(stored[0].frequency.unwrap().describe().months, 12);

    h.engine
        .delete_future_payment(payment.id, "alice")
        .await
        .unwrap();
    assert!(h.engine.future_payments("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn run_loop_applies_due_payments_until_shutdown() {
    let h = harness().await;
    let account = open_account(&h.engine, "alice", "HSBC", "HKD", "0").await;
    h.engine
        .create_future_payment(
            CreateFuturePaymentCmd::new(
                "alice",
                account.id,
                "Refund",
                money("12.34"),
                "HKD",
                start() + TimeDelta::minutes(1),
            )
            .income(true),
        )
        .await
        .unwrap();
    h.clock.advance(TimeDelta::minutes(2));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler(&h, ErrorPolicy::ContinueOnError).run(shutdown_rx));

    let mut applied = false;
    for _ in 0..200 {
        if balance_of(&h.engine, &account).await == "12.34" {
            applied = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(applied, "first pass runs immediately");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn zero_interval_is_rejected() {
    let h = harness().await;
    let clock: Arc<dyn Clock> = h.clock.clone();
    let err = Scheduler::new(
        h.engine.clone(),
        clock,
        SchedulerConfig {
            interval: Duration::ZERO,
            error_policy: ErrorPolicy::ContinueOnError,
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn update_may_move_a_payment_into_the_past() {
    let h = harness().await;
    let account = open_account(&h.engine, "alice", "HSBC", "HKD", "10.00").await;
    let payment = h
        .engine
        .create_future_payment(CreateFuturePaymentCmd::new(
            "alice",
            account.id,
            "Refund",
            money("5"),
            "HKD",
            start() + TimeDelta::days(3),
        ))
        .await
        .unwrap();

    let overdue = start() - TimeDelta::hours(1);
    let updated = h
        .engine
        .update_future_payment(UpdateFuturePaymentCmd::new(
            payment.id,
            CreateFuturePaymentCmd::new("alice", account.id, "Refund", money("5"), "HKD", overdue)
                .income(true),
        ))
        .await
        .unwrap();
    assert_eq!(updated.scheduled_at, overdue);

    let report = scheduler(&h, ErrorPolicy::ContinueOnError)
        .run_once()
        .await
        .unwrap();
    assert_eq!(report.applied, vec![payment.id]);
    assert_eq!(balance_of(&h.engine, &account).await, "15.00");
    assert!(h.engine.future_payments("alice").await.unwrap().is_empty());
}
