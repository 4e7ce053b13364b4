//! Bazaar Core - Shared types library.
//!
//! Common validated types used across the Bazaar components:
//! - `api` - REST backend (accounts, catalog, cart, orders)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! Validation lives in the constructors so the rest of the system can trust
//! any value of these types it is handed.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, username, and the cart item mapping

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
