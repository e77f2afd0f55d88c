//! Behavioural suites for the dialplan engine.

mod support;
