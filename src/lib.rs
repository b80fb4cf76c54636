// ABOUTME: Library root for aidm: re-exports all modules for integration testing.
// ABOUTME: The binary entry point is in main.rs, which uses this crate as a library.

pub mod address;
pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod logging;
pub mod transport;
pub mod tui;
