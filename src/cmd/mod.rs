pub mod browse;
pub mod config;
pub mod render;
pub mod rewrite;
pub mod session;
