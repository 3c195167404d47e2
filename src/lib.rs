//! Larval Drift - individual-based model of larval dispersal and settlement

pub mod behavior;
pub mod boundary;
pub mod core;
pub mod env;
pub mod habitat;
pub mod particles;
pub mod simulation;
pub mod spatial;
