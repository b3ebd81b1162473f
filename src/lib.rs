pub mod config;
pub mod cooldown;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod subnet;
pub mod throttler;
pub mod token_store;

pub use config::Config;
pub use error::{Error, Result};
pub use server::create_app;
pub use throttler::Throttler;
