//! # FuelDesk Shared Library
//!
//! Types, persistence and auth primitives used by the FuelDesk API server.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: one module per table with its CRUD queries
//! - `auth`: password hashing and policy, JWT, request authentication, guards
//! - `theme`: admin theme and UI tweak resolution

pub mod auth;
pub mod db;
pub mod models;
pub mod theme;

/// Current version of the FuelDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
