//! Admin Console - session routing core
//!
//! Headless core of an admin console front end:
//! - HTTP transport with credential and session-expiry interceptors
//! - Static routes plus menu-driven dynamic routes, installed once per session
//! - Before-navigation guard with single-flight menu fetch
//! - Event bus tying the transport to the router

pub mod bus;
pub mod config;
pub mod http;
pub mod router;
pub mod session;
