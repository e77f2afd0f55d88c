//! Test suites for the Switchboard daemon.

mod behaviour;
mod support;
