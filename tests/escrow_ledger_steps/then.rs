//! Then steps for escrow ledger BDD scenarios.

use super::world::{EscrowWorld, party, run_async, task_id};
use escrow_ledger::ledger::{
    domain::{LedgerError, TaskStatus},
    services::EscrowServiceError,
};
use rstest_bdd_macros::then;

const fn variant_name(error: &LedgerError) -> &'static str {
    match error {
        LedgerError::TaskNotFound(_) => "TaskNotFound",
        LedgerError::Unauthorized { .. } => "Unauthorized",
        LedgerError::InvalidState { .. } => "InvalidState",
        LedgerError::InvalidAmount(_) => "InvalidAmount",
        LedgerError::InvalidParties => "InvalidParties",
        LedgerError::InvalidTaskId => "InvalidTaskId",
        LedgerError::DuplicateTaskId(_) => "DuplicateTaskId",
        LedgerError::InsufficientBalance { .. } => "InsufficientBalance",
        LedgerError::UpdateAlreadyProposed(_) => "UpdateAlreadyProposed",
        LedgerError::NoUpdateProposed(_) => "NoUpdateProposed",
        LedgerError::AlreadyApprovedBySide { .. } => "AlreadyApprovedBySide",
        LedgerError::BalanceOverflow(_) => "BalanceOverflow",
    }
}

#[then("the operation succeeds")]
fn operation_succeeds(world: &EscrowWorld) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Ok(())) => Ok(()),
        other => Err(eyre::eyre!("expected success, got {other:?}")),
    }
}

#[then(r#"the operation fails with "{expected}""#)]
fn operation_fails_with(world: &EscrowWorld, expected: String) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation result"))?;
    let error = match result {
        Ok(()) => return Err(eyre::eyre!("expected {expected} error, operation succeeded")),
        Err(error) => error,
    };
    let actual = error
        .as_ledger_error()
        .map(variant_name)
        .ok_or_else(|| eyre::eyre!("expected ledger error {expected}, got {error}"))?;
    eyre::ensure!(actual == expected, "expected {expected} error, got {actual}");
    Ok(())
}

#[then("the operation fails with a fund transfer error")]
fn operation_fails_with_fund_transfer_error(world: &EscrowWorld) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Err(EscrowServiceError::FundTransferFailed(_))) => Ok(()),
        other => Err(eyre::eyre!("expected fund transfer failure, got {other:?}")),
    }
}

#[then(r#"the balance of "{holder}" is {amount:u64}"#)]
fn balance_is(world: &EscrowWorld, holder: String, amount: u64) -> Result<(), eyre::Report> {
    let holder = party(&holder)?;
    let balance = run_async(world.service()?.balance_of(&holder));
    eyre::ensure!(
        balance == amount,
        "expected balance {amount} for {holder}, found {balance}"
    );
    Ok(())
}

#[then(r#"task {id:u64} holds {amount:u64} with status "{status}""#)]
fn task_holds(
    world: &EscrowWorld,
    id: u64,
    amount: u64,
    status: String,
) -> Result<(), eyre::Report> {
    let expected_status = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = run_async(world.service()?.task(task_id(id)?))
        .ok_or_else(|| eyre::eyre!("task {id} not found"))?;
    eyre::ensure!(
        task.amount() == amount,
        "expected task {id} to hold {amount}, found {}",
        task.amount()
    );
    eyre::ensure!(
        task.status() == expected_status,
        "expected status {expected_status}, found {}",
        task.status()
    );
    Ok(())
}

#[then("task {id:u64} has no update request")]
fn no_update_request(world: &EscrowWorld, id: u64) -> Result<(), eyre::Report> {
    let request = run_async(world.service()?.update_request(task_id(id)?));
    eyre::ensure!(request.is_none(), "expected no update request, found {request:?}");
    Ok(())
}

#[then(r#"exactly one release of {amount:u64} to "{recipient}" is recorded"#)]
fn single_release_recorded(
    world: &EscrowWorld,
    amount: u64,
    recipient: String,
) -> Result<(), eyre::Report> {
    let recipient = party(&recipient)?;
    let releases = world
        .funds
        .releases()
        .map_err(|err| eyre::eyre!("read release log: {err}"))?;
    let matching = releases
        .iter()
        .filter(|release| release.party == recipient && release.amount == amount)
        .count();
    eyre::ensure!(
        matching == 1 && releases.len() == 1,
        "expected one release of {amount} to {recipient}, found {releases:?}"
    );
    Ok(())
}

#[then("no release is recorded")]
fn no_release_recorded(world: &EscrowWorld) -> Result<(), eyre::Report> {
    let releases = world
        .funds
        .releases()
        .map_err(|err| eyre::eyre!("read release log: {err}"))?;
    eyre::ensure!(releases.is_empty(), "expected no releases, found {releases:?}");
    Ok(())
}

#[then(r#"nothing is pulled from "{funder}""#)]
fn nothing_pulled_from(world: &EscrowWorld, funder: String) -> Result<(), eyre::Report> {
    let funder = party(&funder)?;
    let pulls = world
        .funds
        .pulls()
        .map_err(|err| eyre::eyre!("read pull log: {err}"))?;
    eyre::ensure!(
        pulls.iter().all(|pull| pull.party != funder),
        "expected no pulls from {funder}, found {pulls:?}"
    );
    Ok(())
}
