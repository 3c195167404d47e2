pub mod config;
pub mod error;
pub mod types;

pub use config::{DomainBounds, DriftConfig, OrientationMode};
pub use error::{DriftError, Result};
pub use types::{ParticleId, ParticleStatus};
