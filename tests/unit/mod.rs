//! Unit test harness for galvo-stepper.
//!
//! Configuration tests exercised through the public loading API.

mod config_parsing;
mod config_validation;
