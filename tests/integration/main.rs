//! Integration tests for Nav-Harvest
//!
//! These tests use wiremock to stand in for the fund site and exercise the
//! fetcher and full harvest runs end-to-end.

mod common;
mod fetch_tests;
mod harvest_tests;
