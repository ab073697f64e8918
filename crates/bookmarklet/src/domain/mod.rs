//! Domain types shared by the compiler and watch loop.

pub mod errors;
pub mod model;
