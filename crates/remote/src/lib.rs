pub mod error;
pub mod gateway;
mod retry;

pub use crate::gateway::RemoteGateway;
pub use crate::retry::RetryPolicy;
use std::sync::Arc;

pub type GatewayHandle = Arc<dyn RemoteGateway + Send + Sync>;
