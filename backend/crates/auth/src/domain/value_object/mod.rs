//! Value Objects

pub mod email;
