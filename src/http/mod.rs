//! Line protocol implementation.
//!
//! A restricted HTTP/1.1 subset: one `GET` request line per connection, one
//! status-coded response, then close. No connection is ever reused.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection handler implementing the request-response state machine
//! - **`parser`**: request-line validation and status-line decoding
//! - **`reader`**: timeout-bounded line reader shared by both roles
//! - **`request`**: request representation and client-side serialization
//! - **`response`**: status codes and response representation
//! - **`writer`**: serializes and writes responses to the peer
//!
//! # Wire format
//!
//! ```text
//! GET <path> HTTP/1.1
//! Host: <host>
//! Connection: Keep-Alive
//!
//! HTTP/1.1 200 OK                  HTTP/1.1 404 Not Found
//! Content-Type: text/plain         (no body)
//!
//! <body>
//! ```
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │  ReadingRequest  │ ← Read one line (bounded by read timeout)
//!        └──────┬───────────┘
//!               │ Valid request          invalid / unreadable → 500
//!               ▼
//!        ┌──────────────────┐
//!        │    Resolving     │ ← File lookup: 200, 404 or 500
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │ WritingResponse  │ ← Written exactly once
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │     Closing      │ ← Grace delay, then close (always reached)
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fetchline::http::connection::{Connection, ConnectionSettings};
//! use fetchline::server::resolver::FsResolver;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let resolver = Arc::new(FsResolver::new());
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let conn = Connection::new(socket, peer, resolver.clone(), ConnectionSettings::default());
//!         tokio::spawn(conn.run());
//!     }
//! }
//! ```

pub mod connection;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod writer;
