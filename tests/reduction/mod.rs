//! Integration tests for reducing matrices to profiles

mod projection_tests;
