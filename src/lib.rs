//! Angular Documentation MCP Service
//!
//! This crate provides a Model Context Protocol (MCP) server, spoken as
//! newline-delimited JSON-RPC over stdio, that fetches documentation for
//! Angular and related web development technologies and caches it for the
//! rest of the day.
//!
//! # Features
//!
//! - Official Angular documentation (summary, full or both)
//! - Catalog of TypeScript, RxJS, testing and Nx documentation by category
//! - Arbitrary documentation URLs with caller-chosen cache keys
//! - Bounded cache with day-based expiry
//!
//! # Modules
//!
//! - [`catalog`]: technology/category/URL table
//! - [`cache`]: caching implementation for fetched documents
//! - [`fetcher`]: HTTP(S) GET with timeout
//! - [`resources`]: fetch-through-cache and concurrent fan-out
//! - [`tools`]: the documentation tools
//! - [`dispatcher`] and [`transport`]: JSON-RPC request handling over stdio

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod fetcher;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
