//! When steps for registration booking BDD scenarios.

use super::world::{BookingWorld, run_async};
use crate::test_helpers::hatchery_named;
use eyre::WrapErr;
use hatchery::worker_model::domain::{CompleteRegistration, Requirement};
use rstest_bdd_macros::when;

#[when(r#"hatchery "{name}" tries to book the model after {seconds:i64} seconds"#)]
fn hatchery_tries_to_book(
    world: &mut BookingWorld,
    name: String,
    seconds: i64,
) -> Result<(), eyre::Report> {
    let model_id = world.model()?.id();
    world.fleet.clock.advance_secs(seconds);
    world.last_booking = Some(run_async(
        world.fleet.lease.acquire(model_id, &hatchery_named(&name)),
    ));
    Ok(())
}

#[when(r#"hatchery "{name}" registers the model with binary "{binary}""#)]
fn hatchery_registers_model(
    world: &mut BookingWorld,
    name: String,
    binary: String,
) -> Result<(), eyre::Report> {
    let model_id = world.model()?.id();
    let registered = run_async(world.fleet.lifecycle.complete_registration(
        CompleteRegistration::new(model_id).with_capabilities([Requirement::binary(binary)]),
    ))
    .wrap_err_with(|| format!("registration by hatchery {name}"))?;
    world.model = Some(registered);
    Ok(())
}

#[when(r#"a job requiring binary "{binary}" is evaluated"#)]
fn job_is_evaluated(world: &mut BookingWorld, binary: String) {
    world.last_assessment = Some(run_async(
        world
            .fleet
            .evaluator
            .evaluate_job(&[Requirement::binary(binary)]),
    ));
}
