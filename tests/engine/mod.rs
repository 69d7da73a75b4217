//! Engine behavior tests.

mod messaging_tests;
mod retention_tests;
