pub mod agent;
pub mod config;
pub mod error;
pub mod matching;
pub mod policy;
pub mod spatial;
pub mod types;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use agent::{DispatchAgent, StrategyKind};
pub use error::{DispatchError, Result};
