//! In-memory integration tests for concurrent withdrawals and conservation.

use super::helpers::{Ledger, managed, party, task_id};
use escrow_ledger::ledger::{
    domain::LedgerError,
    services::{CreateTaskRequest, EscrowServiceError},
};
use rstest::rstest;

async fn fund_and_approve(ledger: &Ledger, id: u64, amount: u64, worker: &str) {
    ledger
        .service
        .create_task(
            CreateTaskRequest::new(id, amount, "F", worker, "A").fully_funded(),
            &party("manager"),
        )
        .await
        .expect("task creation should succeed");
    ledger
        .service
        .approve_task(task_id(id), &party("A"))
        .await
        .expect("approval should succeed");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_withdrawals_cannot_overdraw(managed: Ledger) {
    fund_and_approve(&managed, 1, 50, "W").await;

    let attempts: Vec<_> = (0..10)
        .map(|_| {
            let service = managed.service.clone();
            tokio::spawn(async move { service.withdraw(10, &party("W")).await })
        })
        .collect();

    let mut succeeded = 0;
    let mut refused = 0;
    for attempt in attempts {
        match attempt.await.expect("withdrawal task should not panic") {
            Ok(_) => succeeded += 1,
            Err(EscrowServiceError::Ledger(LedgerError::InsufficientBalance { .. })) => {
                refused += 1;
            }
            Err(other) => panic!("unexpected withdrawal error: {other}"),
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(refused, 5);
    assert_eq!(managed.service.balance_of(&party("W")).await, 0);
    assert_eq!(managed.funds.releases().expect("release log").len(), 5);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_balance_withdrawal_changes_nothing(managed: Ledger) {
    let result = managed.service.withdraw(1, &party("nobody")).await;

    assert!(matches!(
        result,
        Err(EscrowServiceError::Ledger(LedgerError::InsufficientBalance {
            requested: 1,
            available: 0,
            ..
        }))
    ));
    assert_eq!(managed.service.total_balances().await, 0);
    assert!(managed.funds.releases().expect("release log").is_empty());
    assert!(managed.events.events().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn custody_decreases_only_by_released_amounts(managed: Ledger) {
    fund_and_approve(&managed, 1, 120, "W").await;
    fund_and_approve(&managed, 2, 80, "V").await;
    managed
        .service
        .create_task(
            CreateTaskRequest::new(3, 40, "F", "W", "A").fully_funded(),
            &party("manager"),
        )
        .await
        .expect("task creation should succeed");
    let custody = || async {
        managed.service.total_escrowed().await + managed.service.total_balances().await
    };
    assert_eq!(custody().await, 240);

    managed
        .service
        .withdraw(70, &party("W"))
        .await
        .expect("withdrawal should succeed");
    managed
        .service
        .reject_task(task_id(3), &party("A"))
        .await
        .expect("rejection should succeed");
    managed
        .service
        .withdraw(80, &party("V"))
        .await
        .expect("withdrawal should succeed");

    assert_eq!(custody().await, 240 - 70 - 80);
    assert_eq!(managed.service.balance_of(&party("F")).await, 40);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_release_requires_reconciliation(managed: Ledger) {
    fund_and_approve(&managed, 1, 100, "W").await;
    managed
        .funds
        .fail_releases_to(&party("W"))
        .expect("failure injection");

    let error = managed
        .service
        .withdraw(100, &party("W"))
        .await
        .expect_err("release should fail");

    assert!(error.requires_reconciliation());
    assert_eq!(managed.service.balance_of(&party("W")).await, 0);
    assert_eq!(managed.service.failed_releases().await.len(), 1);
    assert!(!managed.events.names().contains(&"funds_withdrawn"));

    let retry = managed.service.withdraw(100, &party("W")).await;
    assert!(matches!(
        retry,
        Err(EscrowServiceError::Ledger(LedgerError::InsufficientBalance { .. }))
    ));
}
