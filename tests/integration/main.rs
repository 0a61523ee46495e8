//! Integration tests driving the full router in-process

mod api_tests;
mod common;
mod postgres_tests;
