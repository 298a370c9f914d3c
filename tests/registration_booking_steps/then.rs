//! Then steps for registration booking BDD scenarios.

use super::world::{BookingWorld, run_async};
use hatchery::worker_model::services::{CredentialAccess, LeaseError};
use rstest_bdd_macros::then;

#[then(r#"the booking is refused because "{name}" holds it"#)]
fn booking_is_refused(world: &BookingWorld, name: String) -> Result<(), eyre::Report> {
    let result = world
        .last_booking
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing booking result in scenario world"))?;
    match result {
        Err(LeaseError::AlreadyBooked {
            holder: Some(holder),
            ..
        }) if holder.name() == name => Ok(()),
        other => Err(eyre::eyre!(
            "expected booking held by {name}, got {other:?}"
        )),
    }
}

#[then("the booking is granted")]
fn booking_is_granted(world: &BookingWorld) -> Result<(), eyre::Report> {
    match world.last_booking.as_ref() {
        Some(Ok(())) => Ok(()),
        other => Err(eyre::eyre!("expected granted booking, got {other:?}")),
    }
}

#[then("the model no longer needs registration")]
fn model_is_registered(world: &BookingWorld) -> Result<(), eyre::Report> {
    let model_id = world.model()?.id();
    let stored = run_async(
        world
            .fleet
            .view
            .get_by_id(model_id, CredentialAccess::Redacted),
    )
    .map_err(|err| eyre::eyre!("lookup failed: {err}"))?;
    if stored.needs_registration() {
        return Err(eyre::eyre!("model {model_id} still needs registration"));
    }
    Ok(())
}

#[then(r#"the job reports "{binary}" as unknown"#)]
fn job_reports_unknown(world: &BookingWorld, binary: String) -> Result<(), eyre::Report> {
    let result = world
        .last_assessment
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing job evaluation in scenario world"))?;
    let assessment = result
        .as_ref()
        .map_err(|err| eyre::eyre!("job evaluation failed: {err}"))?;
    if assessment.unknown_binary() != Some(binary.as_str()) {
        return Err(eyre::eyre!(
            "expected {binary} to be unknown, got {:?}",
            assessment.unknown_binary()
        ));
    }
    Ok(())
}

#[then("the model must be checked again")]
fn model_must_be_checked(world: &BookingWorld) -> Result<(), eyre::Report> {
    let model_id = world.model()?.id();
    let stored = run_async(
        world
            .fleet
            .view
            .get_by_id(model_id, CredentialAccess::Redacted),
    )
    .map_err(|err| eyre::eyre!("lookup failed: {err}"))?;
    if !stored.check_registration() {
        return Err(eyre::eyre!("model {model_id} was not flagged for recheck"));
    }
    Ok(())
}
