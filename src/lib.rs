//! Library entrypoint: re‑export modules

pub mod config;
pub mod errors;
pub mod inspector;
pub mod render;
