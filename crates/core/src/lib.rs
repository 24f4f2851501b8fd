//! TicketSlave Core - Shared types library.
//!
//! This crate provides common types used across all TicketSlave components:
//! - `server` - The ticket tracker HTTP application
//! - `cli` - Command-line tools for migrations and account recovery
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, usernames, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
