//! Integration tests for the salesdesk write pipeline

mod compose_plans;
mod config_loading;
mod normalize_fixtures;
mod staged_execution;
mod test_utils;
