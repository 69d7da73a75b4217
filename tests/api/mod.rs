//! HTTP surface tests.

mod channel_api_tests;
mod message_api_tests;
