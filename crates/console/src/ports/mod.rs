//! Outbound ports implemented by infrastructure adapters.

mod gateway;
mod platform;
mod testing;

pub use gateway::{CredentialProvider, GatewayError, RequestGateway};
pub use platform::StorageProvider;
pub use testing::{ClockPort, RandomPort};

#[cfg(any(test, feature = "testing"))]
pub use gateway::MockRequestGateway;
#[cfg(any(test, feature = "testing"))]
pub use testing::MockClockPort;
