pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, RotationConfig};
pub use error::RiskWatchError;
pub use types::*;
