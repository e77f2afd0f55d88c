//! Behavioural tests for the daemon bootstrap sequence.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use switchboard_dialplan::Disposition;

use crate::bootstrap::BootstrapError;

use super::support::{
    HealthEvent, LOOPING_DIALPLAN, MALFORMED_DIALPLAN, TestWorld, VALID_DIALPLAN,
};

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}

#[given("an application root containing a valid dialplan")]
fn given_valid_dialplan(world: &RefCell<TestWorld>) {
    world.borrow().write_dialplan(VALID_DIALPLAN);
}

#[given("an application root containing a looping dialplan")]
fn given_looping_dialplan(world: &RefCell<TestWorld>) {
    world.borrow().write_dialplan(LOOPING_DIALPLAN);
}

#[given("an application root containing a malformed dialplan")]
fn given_malformed_dialplan(world: &RefCell<TestWorld>) {
    world.borrow().write_dialplan(MALFORMED_DIALPLAN);
}

#[given("an application root without a dialplan")]
fn given_missing_dialplan(world: &RefCell<TestWorld>) {
    let _ = world;
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[given("auto answer is configured")]
fn given_auto_answer(world: &RefCell<TestWorld>) {
    world.borrow_mut().enable_auto_answer();
}

#[when("the switchboard bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

#[when("a call for context {context} is accepted")]
fn when_call_accepted(world: &RefCell<TestWorld>, context: String) {
    world.borrow_mut().accept(&context);
}

#[when("the switchboard shuts down")]
fn when_shutdown(world: &RefCell<TestWorld>) {
    world.borrow().shutdown();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error().is_none(),
        "bootstrap error: {:?}",
        world.bootstrap_error()
    );
    assert!(world.switchboard().paths().dialplan_path().is_file());
}

#[then("bootstrap fails with a configuration error")]
fn then_configuration_error(world: &RefCell<TestWorld>) {
    assert!(matches!(
        world.borrow().bootstrap_error(),
        Some(BootstrapError::Configuration { .. })
    ));
}

#[then("bootstrap fails with a dialplan error")]
fn then_dialplan_error(world: &RefCell<TestWorld>) {
    assert!(matches!(
        world.borrow().bootstrap_error(),
        Some(BootstrapError::Dialplan { .. })
    ));
}

#[then("the reporter recorded {count} loaded contexts")]
fn then_reporter_loaded(world: &RefCell<TestWorld>, count: usize) {
    let events = world.borrow().reporter.events();
    assert!(
        events.contains(&HealthEvent::DialplanLoaded(count)),
        "dialplan load event missing: {events:?}"
    );
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    assert_eq!(events.first(), Some(&HealthEvent::BootstrapStarting));
    assert_eq!(events.last(), Some(&HealthEvent::BootstrapSucceeded));
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events
        .iter()
        .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)));
    assert!(failed, "bootstrap failure event missing: {events:?}");
}

#[then("the call completes in {context}")]
fn then_call_completes(world: &RefCell<TestWorld>, context: String) {
    let mut world = world.borrow_mut();
    match world.outcome() {
        Ok(Disposition::Completed { context: finished, .. }) => {
            assert_eq!(finished.name(), context);
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[then("the call was answered {count} time")]
fn then_answered(world: &RefCell<TestWorld>, count: usize) {
    assert_eq!(world.borrow().journal.count("answer"), count);
}

#[then("the call is cancelled")]
fn then_call_cancelled(world: &RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    assert!(matches!(world.outcome(), Ok(Disposition::Cancelled)));
    assert_eq!(world.switchboard().supervisor().live_calls(), 0);
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "Bootstrap loads the dialplan from the application root"
)]
fn bootstrap_loads_dialplan(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "A missing dialplan fails bootstrap"
)]
fn missing_dialplan(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "A malformed dialplan fails bootstrap"
)]
fn malformed_dialplan(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "Invalid configuration fails bootstrap"
)]
fn invalid_configuration(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "Configured auto answer applies to accepted calls"
)]
fn auto_answer_applies(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_bootstrap.feature",
    name = "Shutdown cancels a runaway call"
)]
fn shutdown_cancels_runaway(world: RefCell<TestWorld>) {
    drop(world);
}
