//! In-memory integration tests for task creation and resolution.

use super::helpers::{Ledger, managed, party, task_id, token_funded};
use escrow_ledger::ledger::{
    domain::{LedgerError, LedgerEventKind, TaskStatus},
    services::{CreateTaskRequest, EscrowServiceError},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approve_then_withdraw_releases_to_worker_once(managed: Ledger) {
    managed
        .service
        .create_task(
            CreateTaskRequest::new(1, 100, "F", "W", "A").fully_funded(),
            &party("manager"),
        )
        .await
        .expect("task creation should succeed");
    managed
        .service
        .approve_task(task_id(1), &party("A"))
        .await
        .expect("approval should succeed");
    assert_eq!(managed.service.balance_of(&party("W")).await, 100);

    managed
        .service
        .withdraw(100, &party("W"))
        .await
        .expect("withdrawal should succeed");

    assert_eq!(managed.service.balance_of(&party("W")).await, 0);
    let releases = managed.funds.releases().expect("release log");
    assert_eq!(releases.len(), 1);
    assert_eq!(
        releases.first().map(|release| (release.party.as_str(), release.amount)),
        Some(("W", 100))
    );
    let last = managed.events.events().pop().map(|event| event.kind().clone());
    assert_eq!(
        last,
        Some(LedgerEventKind::FundsWithdrawn {
            party: party("W"),
            amount: 100,
        })
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_rejection_fails_with_invalid_state(managed: Ledger) {
    managed
        .service
        .create_task(
            CreateTaskRequest::new(2, 50, "F", "W", "A").fully_funded(),
            &party("manager"),
        )
        .await
        .expect("task creation should succeed");

    let rejected = managed
        .service
        .reject_task(task_id(2), &party("A"))
        .await
        .expect("first rejection should succeed");
    assert_eq!(rejected.status(), TaskStatus::Rejected);
    assert_eq!(rejected.amount(), 0);
    assert_eq!(managed.service.balance_of(&party("F")).await, 50);

    let second = managed.service.reject_task(task_id(2), &party("A")).await;
    assert!(matches!(
        second,
        Err(EscrowServiceError::Ledger(LedgerError::InvalidState {
            status: TaskStatus::Rejected,
            ..
        }))
    ));
    assert_eq!(managed.service.balance_of(&party("F")).await, 50);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approver_may_be_the_funder(managed: Ledger) {
    managed
        .service
        .create_task(
            CreateTaskRequest::new(5, 70, "F", "W", "F").fully_funded(),
            &party("manager"),
        )
        .await
        .expect("task creation should succeed");

    let approved = managed
        .service
        .approve_task(task_id(5), &party("F"))
        .await
        .expect("funder acting as approver should succeed");
    assert_eq!(approved.status(), TaskStatus::Approved);
    assert_eq!(managed.service.balance_of(&party("W")).await, 70);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn funder_created_tasks_belong_to_their_caller(token_funded: Ledger) {
    let result = token_funded
        .service
        .create_task(CreateTaskRequest::new(1, 10, "F", "W", "A"), &party("W"))
        .await;
    assert!(matches!(
        result,
        Err(EscrowServiceError::Ledger(LedgerError::Unauthorized { .. }))
    ));

    token_funded
        .service
        .create_task(CreateTaskRequest::new(1, 10, "F", "W", "A"), &party("F"))
        .await
        .expect("funder may create its own task");
    assert_eq!(token_funded.service.total_escrowed().await, 10);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disputed_task_keeps_escrow_until_cleared(managed: Ledger) {
    managed
        .service
        .create_task(
            CreateTaskRequest::new(9, 30, "F", "W", "A").fully_funded(),
            &party("manager"),
        )
        .await
        .expect("task creation should succeed");
    managed
        .service
        .open_dispute(task_id(9), &party("arbiter"))
        .await
        .expect("resolver opens dispute");

    for result in [
        managed.service.approve_task(task_id(9), &party("A")).await,
        managed.service.reject_task(task_id(9), &party("A")).await,
    ] {
        assert!(matches!(
            result,
            Err(EscrowServiceError::Ledger(LedgerError::InvalidState {
                status: TaskStatus::Disputed,
                ..
            }))
        ));
    }
    assert_eq!(managed.service.total_escrowed().await, 30);

    let outsider = managed
        .service
        .clear_dispute(task_id(9), &party("A"))
        .await;
    assert!(matches!(
        outsider,
        Err(EscrowServiceError::Ledger(LedgerError::Unauthorized { .. }))
    ));
}
