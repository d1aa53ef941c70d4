//! Domain Entities
//!
//! Field values the core constructs and consumes. Entity lifetime is
//! owned by the durable store; nothing here outlives a request.

pub mod pending;
pub mod session;
pub mod totp;
pub mod user;
