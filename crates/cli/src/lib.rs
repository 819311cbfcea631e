//! Testmend CLI
//!
//! Command-line interface for triaging failed UI tests and managing healed
//! selectors in a local testmend store.

pub mod client;
pub mod commands;
pub mod output;
