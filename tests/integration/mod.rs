//! Integration test modules.

mod mock_backend;
mod session_persistence_test;
