pub mod batch;

pub use batch::{ParticleBatch, RetiredParticle};
