//! Bazaar API library.
//!
//! The REST backend as a library, so handlers and services can be tested
//! and the CLI can reuse the repositories for seeding.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
