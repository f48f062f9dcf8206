//! # FuelDesk API Server Library
//!
//! Back-office API and admin console for a fuel station.
//!
//! ## Modules
//!
//! - `admin`: Server-rendered admin console
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP/GraphQL error mapping
//! - `graphql`: GraphQL schema, queries and mutations
//! - `middleware`: Security headers
//! - `routes`: Plain HTTP handlers
//! - `services`: Validation and persistence shared by GraphQL and admin

pub mod admin;
pub mod app;
pub mod config;
pub mod error;
pub mod graphql;
pub mod middleware;
pub mod routes;
pub mod services;
