//! Integration tests for the spec-to-test pipeline

mod cli_routes;
mod config_integration;
mod fixture_service;
mod pipeline_run;
mod test_utils;
