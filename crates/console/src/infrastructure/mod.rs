//! Infrastructure adapters for the console ports.

pub mod clock;
pub mod config;
pub mod http_client;
pub mod storage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clock::{SystemClock, SystemRandom};
pub use config::ConsoleConfig;
pub use http_client::HttpGateway;
pub use storage::FileStorage;
