//! Application layer orchestrating domain logic and infrastructure.

pub mod compile;
pub mod extract;
pub mod minify;
pub mod watch;
