//! Fetchline - single-request line protocol over TCP
//!
//! Core library for the listener, connection handler, request codec and
//! client session.

pub mod client;
pub mod config;
pub mod http;
pub mod server;
