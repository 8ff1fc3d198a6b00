// library entry
pub mod cache;
pub mod config;
pub mod counter;
pub mod error;
pub mod http;
pub mod instance;
pub mod lifecycle;
pub mod load;
pub mod logging;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

#[cfg(test)]
mod tests;

// Re-export key components for convenience
pub use cache::{CacheBackend, CacheClient, ConnectionState};
pub use config::ServiceConfig;
pub use error::{CacheError, Result, ServiceError};
pub use logging::init as init_logging;
pub use service::{CounterRead, CounterService};
