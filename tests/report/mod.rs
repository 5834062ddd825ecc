//! Integration tests for fit reporting

mod reporter_tests;
