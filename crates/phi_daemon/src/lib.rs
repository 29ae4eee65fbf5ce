pub mod config;
pub mod driver;
pub mod render;
