//! Shared harness for the scenario tests.

pub mod fixtures;
