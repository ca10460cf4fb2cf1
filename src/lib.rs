pub mod cache;
pub mod config;
pub mod data;
pub mod dedupe;
pub mod error;
pub mod feed;
pub mod filter;
pub mod genre;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;
pub mod source;
pub mod utils;
