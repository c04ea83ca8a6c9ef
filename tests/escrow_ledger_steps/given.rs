//! Given steps for escrow ledger BDD scenarios.

use super::world::{EscrowWorld, party, run_async};
use escrow_ledger::ledger::{
    domain::CreationPolicy,
    services::{CreateTaskRequest, LedgerConfig},
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a ledger managed by "{manager}""#)]
fn ledger_managed_by(world: &mut EscrowWorld, manager: String) -> Result<(), eyre::Report> {
    world.configure(LedgerConfig::managed_by(party(&manager)?));
    Ok(())
}

#[given(r#""{funder}" holds {amount:u64} units outside the ledger"#)]
fn funder_holds_external_units(
    world: &mut EscrowWorld,
    funder: String,
    amount: u64,
) -> Result<(), eyre::Report> {
    world
        .funds
        .deposit(&party(&funder)?, amount)
        .wrap_err("deposit external funds for scenario")
}

#[given(
    r#"task {id:u64} escrows {amount:u64} from "{funder}" for "{worker}" with approver "{approver}""#
)]
fn task_escrows(
    world: &mut EscrowWorld,
    id: u64,
    amount: u64,
    funder: String,
    worker: String,
    approver: String,
) -> Result<(), eyre::Report> {
    let service = world.service()?;
    let manager = match &service.config().creation {
        CreationPolicy::Manager { manager } => manager.clone(),
        CreationPolicy::Funder => party(&funder)?,
    };
    let request = CreateTaskRequest::new(id, amount, funder, worker, approver).fully_funded();
    run_async(service.create_task(request, &manager))
        .wrap_err("create task in scenario setup")?;
    Ok(())
}
