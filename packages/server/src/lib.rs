//! Public surface for the `devtalk-server` crate.
//!
//! Exposes the router builder, config and storage types so that external
//! crates (e.g. the conformance test suite) can spin up an in-process server
//! without spawning a subprocess.

pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod oauth;
pub mod render;
pub mod router;
pub mod storage;
pub mod upload;

pub use config::ServerConfig;
pub use oauth::{HttpOAuthClient, OAuthClient};
pub use router::build_router;
pub use storage::{memory::MemoryStorage, Storage};
