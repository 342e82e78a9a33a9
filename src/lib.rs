//! VureKeys - HWID-bound license key service
//!
//! This library provides the core functionality for the VureKeys service:
//! the key lifecycle and binding engine, the expiry sweeper, the key
//! registry, and the HTTP API handlers.

pub mod binding;
pub mod config;
pub mod db;
pub mod duration;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod keygen;
pub mod middleware;
pub mod models;
