//! Server assembly
//!
//! [`HttpServer`] holds the page registry and the session store; the
//! listener accepts TCP connections and hands each one to a
//! [`Connection`](crate::http::connection::Connection).

pub mod http_server;
pub mod listener;

pub use http_server::HttpServer;
