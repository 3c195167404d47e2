//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Stable identity for a particle, assigned at seeding and never reused
/// while the particle is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

/// Lifecycle status of a particle. Every non-`Active` state is terminal:
/// no component re-activates a deactivated particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleStatus {
    Active,
    /// Stranded on the coastline at or past settlement age
    SettledOnCoast,
    /// Reached the seabed at or past settlement age
    SettledOnBottom,
    /// Reached suitable habitat (habitat-restricted settlement)
    HomeSweetHome,
    /// Exceeded the maximum pelagic age
    Died,
    /// Left the configured validity domain
    Outside,
    /// Seeded directly on land during its first timestep
    SeededOnLand,
}

impl ParticleStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Display color for status summaries and plotting front-ends
    pub fn color(&self) -> &'static str {
        match self {
            Self::Active => "blue",
            Self::SettledOnCoast => "red",
            Self::SettledOnBottom => "magenta",
            Self::HomeSweetHome => "orange",
            Self::Died => "yellow",
            Self::Outside => "gray",
            Self::SeededOnLand => "brown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::SettledOnCoast => "settled_on_coast",
            Self::SettledOnBottom => "settled_on_bottom",
            Self::HomeSweetHome => "home_sweet_home",
            Self::Died => "died",
            Self::Outside => "outside",
            Self::SeededOnLand => "seeded_on_land",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_id_equality() {
        assert_eq!(ParticleId(3), ParticleId(3));
        assert_ne!(ParticleId(3), ParticleId(4));
    }

    #[test]
    fn test_only_active_is_non_terminal() {
        assert!(!ParticleStatus::Active.is_terminal());
        for s in [
            ParticleStatus::SettledOnCoast,
            ParticleStatus::SettledOnBottom,
            ParticleStatus::HomeSweetHome,
            ParticleStatus::Died,
            ParticleStatus::Outside,
            ParticleStatus::SeededOnLand,
        ] {
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn test_status_labels_are_snake_case() {
        assert_eq!(ParticleStatus::HomeSweetHome.label(), "home_sweet_home");
        assert_eq!(ParticleStatus::SeededOnLand.label(), "seeded_on_land");
    }
}
