//! CAM Server
//!
//! Access-brokering backend for public services. Citizens request
//! access, grantees and administrators resolve the requests, and
//! standing permissions plus the resulting grants feed one evaluator
//! the gateway consults before letting anyone through.

pub mod access;
pub mod actors;
pub mod api;
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod grants;
pub mod permissions;
pub mod requests;
pub mod sessions;
