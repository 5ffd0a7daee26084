//! Mock servers for integration testing
//!
//! Simulates the admin backend so the transport and the navigation
//! controller can be exercised end to end over real HTTP.

pub mod admin;

pub use admin::MockAdminServer;
