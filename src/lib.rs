//! pageserve - embedded HTTP/1.0 page server
//!
//! Parses requests, resolves cookie-based sessions, and dispatches to pages
//! registered by path.

pub mod client;
pub mod config;
pub mod http;
pub mod server;
pub mod session;
