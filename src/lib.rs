pub mod config;
pub mod error;
pub mod fetch;
pub mod hls;
pub mod mapping;
pub mod server;
pub mod session;
