//! Integration test modules.

mod player_mock;
mod polling_session_test;
mod sync_session_test;
