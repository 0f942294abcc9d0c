//! Routing and response plumbing for the sleeper HTTP server.

pub mod body;
pub mod routes;
