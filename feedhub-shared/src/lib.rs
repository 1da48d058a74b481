//! # FeedHub Shared Library
//!
//! This crate contains the domain types and business logic behind the FeedHub
//! API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, purpose-scoped tokens, and request auth context
//! - `db`: Connection pool and embedded migrations
//! - `models`: `User` and `Post` records and their queries
//! - `storage`: Remote object store contract and implementations
//! - `upload`: Upload staging and post publishing pipeline

pub mod auth;
pub mod db;
pub mod models;
pub mod storage;
pub mod upload;

/// Current version of the FeedHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
