//! Interactions with the seafloor, the coastline and the habitat
//!
//! Applied after the horizontal and vertical moves of a timestep, against
//! the environment sampled at the new positions. Settlement competency is
//! purely age-based; the habitat check is the only place a particle can
//! reach `home_sweet_home`.

use crate::core::config::DriftConfig;
use crate::core::types::ParticleStatus;
use crate::env::EnvSample;
use crate::habitat::HabitatIndex;
use crate::particles::ParticleBatch;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

pub struct BoundaryPolicy {
    habitat: Option<Arc<HabitatIndex>>,
    settlement_in_habitat: bool,
    min_settlement_age_seconds: f64,
}

impl BoundaryPolicy {
    pub fn new(cfg: &DriftConfig, habitat: Option<Arc<HabitatIndex>>) -> Self {
        Self {
            habitat,
            settlement_in_habitat: cfg.settlement_in_habitat,
            min_settlement_age_seconds: cfg.min_settlement_age_seconds,
        }
    }

    /// Particles that sank below the seabed. Pre-competent larvae are lifted
    /// back onto the bottom; competent larvae settle there, unless
    /// settlement is restricted to habitat, in which case they are lifted
    /// and left for the habitat check.
    pub fn interact_with_seafloor(&self, batch: &mut ParticleBatch, env: &[EnvSample]) {
        let mut lifted = 0usize;
        let mut settled = 0usize;
        for i in 0..batch.len() {
            if !batch.is_active(i) {
                continue;
            }
            let seabed = -env[i].sea_floor_depth;
            if batch.z[i] >= seabed {
                continue;
            }
            batch.z[i] = seabed;
            let competent = batch.age_seconds[i] >= self.min_settlement_age_seconds;
            if competent && !self.settlement_in_habitat {
                batch.deactivate(i, ParticleStatus::SettledOnBottom);
                settled += 1;
            } else {
                lifted += 1;
            }
        }
        if lifted + settled > 0 {
            debug!(lifted, settled, "seafloor contact");
        }
    }

    /// Particles whose new position fell on land. A particle stranded in its
    /// seeding step never drifted at all and is discarded as `seeded_on_land`.
    /// Otherwise, when settlement is restricted to habitat or larvae are
    /// competent from age zero, stranding just reverts the move; when age
    /// gates settlement, competent larvae settle on the coast and the rest
    /// revert to their last wet position.
    pub fn interact_with_coastline(&self, batch: &mut ParticleBatch, env: &[EnvSample]) {
        let mut seeded_on_land = 0usize;
        let mut reverted = 0usize;
        let mut settled = 0usize;
        for i in 0..batch.len() {
            if !batch.is_active(i) || !env[i].land {
                continue;
            }
            if batch.age_seconds[i] == 0.0 {
                batch.deactivate(i, ParticleStatus::SeededOnLand);
                seeded_on_land += 1;
                continue;
            }
            if self.settlement_in_habitat || self.min_settlement_age_seconds == 0.0 {
                batch.revert_to_previous(i);
                reverted += 1;
            } else if batch.age_seconds[i] >= self.min_settlement_age_seconds {
                batch.deactivate(i, ParticleStatus::SettledOnCoast);
                settled += 1;
            } else {
                batch.revert_to_previous(i);
                reverted += 1;
            }
        }
        if seeded_on_land + reverted + settled > 0 {
            debug!(seeded_on_land, reverted, settled, "coastline contact");
        }
    }

    /// Settle competent particles sitting inside the habitat geometry.
    /// Only runs when settlement is restricted to habitat.
    pub fn check_habitat_settlement(&self, batch: &mut ParticleBatch) {
        if !self.settlement_in_habitat {
            return;
        }
        let Some(habitat) = &self.habitat else {
            return;
        };
        // Point-in-polygon over the whole batch is the hot spot of a run;
        // the index is immutable, so the scan parallelizes cleanly.
        let settlers: Vec<usize> = (0..batch.len())
            .into_par_iter()
            .filter(|&i| {
                batch.is_active(i)
                    && batch.age_seconds[i] >= self.min_settlement_age_seconds
                    && habitat.contains(batch.lon[i], batch.lat[i])
            })
            .collect();
        for &i in &settlers {
            batch.deactivate(i, ParticleStatus::HomeSweetHome);
        }
        if !settlers.is_empty() {
            debug!(settled = settlers.len(), "habitat settlement");
        }
    }
}
