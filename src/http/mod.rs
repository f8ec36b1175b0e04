//! HTTP/1.0 protocol implementation.
//!
//! One request is served per connection; the connection is closed after the
//! response.
//!
//! # Architecture
//!
//! - **`header`**: case-insensitive header map and the parsed message head
//! - **`parser`**: line-oriented head parser (request and status lines)
//! - **`writer`**: response/request writer with deferred header emission
//! - **`status`**: status codes and reason phrases
//! - **`page`**: the handler trait pages implement
//! - **`connection`**: per-connection dispatcher
//!
//! # Writer head state
//!
//! ```text
//!   ┌──────────────┐  first body write, flush, close   ┌──────────┐
//!   │   Pending    │ ────────────────────────────────► │   Sent   │
//!   │ (set_header, │                                   │ (setters │
//!   │  set_cookie, │                                   │   fail)  │
//!   │  set_status) │                                   └──────────┘
//!   └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pageserve::config::Config;
//! use pageserve::server::{listener, HttpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = HttpServer::new(Config::default());
//!     server.set_page("/", MyPage);
//!     listener::run(Arc::new(server)).await
//! }
//! ```

pub mod connection;
pub mod header;
pub mod page;
pub mod parser;
pub mod status;
pub mod writer;
