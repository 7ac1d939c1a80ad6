//! services/api/src/lib.rs
//!
//! The HTTP service for the book discovery app: adapters for the hosted auth,
//! storage and database, the book API client, configuration, and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
