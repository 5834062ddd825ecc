//! Integration tests for the profile fitting pipeline

mod config_tests;
mod recovery_tests;
