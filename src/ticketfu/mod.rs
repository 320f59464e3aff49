pub mod config;
pub mod context;
pub mod fetcher;
pub mod parser;
pub mod render;
pub mod sidebar;
pub mod transport;
