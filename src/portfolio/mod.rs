// src/portfolio/mod.rs
mod loader;
mod models;

pub use loader::*;
pub use models::*;
