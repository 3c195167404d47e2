//! Ontogenetic vertical migration and depth housekeeping
//!
//! Four larval stages (early, pre-flexion, flexion, post-flexion), each with
//! a configured target depth. Every step each active particle swims toward
//! its stage target at the configured rate; a particle already at its target
//! holds depth. Surface and depth-floor clamps keep z inside the water
//! column whatever the mixing scheme did.

use crate::core::config::DriftConfig;
use crate::env::EnvSample;
use crate::particles::ParticleBatch;

/// Larval development stage, derived from age alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeStage {
    Early,
    PreFlexion,
    Flexion,
    PostFlexion,
}

#[derive(Debug, Clone, Copy)]
pub struct VerticalSchedule {
    enabled: bool,
    rate_m_s: f64,
    pre_flexion_seconds: f64,
    flexion_seconds: f64,
    post_flexion_seconds: f64,
    target_early_m: f64,
    target_pre_flexion_m: f64,
    target_flexion_m: f64,
    target_post_flexion_m: f64,
    maximum_depth_m: Option<f64>,
}

impl VerticalSchedule {
    pub fn from_config(cfg: &DriftConfig) -> Self {
        Self {
            enabled: cfg.ovm,
            rate_m_s: cfg.vertical_migration_speed_m_s.unwrap_or(0.0),
            pre_flexion_seconds: cfg.pre_flexion_seconds,
            flexion_seconds: cfg.flexion_seconds,
            post_flexion_seconds: cfg.post_flexion_seconds,
            target_early_m: cfg.depth_early_stage_m,
            target_pre_flexion_m: cfg.depth_pre_flexion_m,
            target_flexion_m: cfg.depth_flexion_m,
            target_post_flexion_m: cfg.depth_post_flexion_m,
            maximum_depth_m: cfg.maximum_depth_m,
        }
    }

    pub fn stage(&self, age_seconds: f64) -> LifeStage {
        if age_seconds < self.pre_flexion_seconds {
            LifeStage::Early
        } else if age_seconds < self.flexion_seconds {
            LifeStage::PreFlexion
        } else if age_seconds < self.post_flexion_seconds {
            LifeStage::Flexion
        } else {
            LifeStage::PostFlexion
        }
    }

    fn target_depth(&self, stage: LifeStage) -> f64 {
        match stage {
            LifeStage::Early => self.target_early_m,
            LifeStage::PreFlexion => self.target_pre_flexion_m,
            LifeStage::Flexion => self.target_flexion_m,
            LifeStage::PostFlexion => self.target_post_flexion_m,
        }
    }

    /// Write each active particle's vertical swimming speed toward its
    /// stage's target depth. Positive = upward, like z.
    pub fn apply(&self, batch: &mut ParticleBatch) {
        if !self.enabled {
            return;
        }
        for i in 0..batch.len() {
            if !batch.is_active(i) {
                continue;
            }
            let target = self.target_depth(self.stage(batch.age_seconds[i]));
            let offset = batch.z[i] - target;
            // A particle exactly on target holds depth rather than
            // overshooting at the full rate.
            let direction = if offset == 0.0 { 0.0 } else { -offset.signum() };
            batch.terminal_velocity[i] = direction * self.rate_m_s;
        }
    }

    /// Clamp particles below the configured depth floor back onto it.
    pub fn clamp_to_maximum_depth(&self, batch: &mut ParticleBatch) {
        let Some(floor) = self.maximum_depth_m else {
            return;
        };
        for i in 0..batch.len() {
            if batch.is_active(i) && batch.z[i] < floor {
                batch.z[i] = floor;
            }
        }
    }

    /// Push particles at or above the sea surface just below it. Mixing can
    /// leave z above the instantaneous surface height.
    pub fn surface_stick(batch: &mut ParticleBatch, env: &[EnvSample]) {
        for i in 0..batch.len() {
            if batch.is_active(i) && batch.z[i] >= env[i].sea_surface_height {
                batch.z[i] = env[i].sea_surface_height - 0.01;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> VerticalSchedule {
        VerticalSchedule {
            enabled: true,
            rate_m_s: 0.002,
            pre_flexion_seconds: 2.0 * 86_400.0,
            flexion_seconds: 5.0 * 86_400.0,
            post_flexion_seconds: 10.0 * 86_400.0,
            target_early_m: -5.0,
            target_pre_flexion_m: -15.0,
            target_flexion_m: -30.0,
            target_post_flexion_m: -50.0,
            maximum_depth_m: Some(-60.0),
        }
    }

    #[test]
    fn test_stage_bands_are_left_closed() {
        let s = schedule();
        assert_eq!(s.stage(0.0), LifeStage::Early);
        assert_eq!(s.stage(2.0 * 86_400.0), LifeStage::PreFlexion);
        assert_eq!(s.stage(5.0 * 86_400.0), LifeStage::Flexion);
        assert_eq!(s.stage(10.0 * 86_400.0), LifeStage::PostFlexion);
        assert_eq!(s.stage(25.0 * 86_400.0), LifeStage::PostFlexion);
    }

    #[test]
    fn test_swims_toward_stage_target() {
        let s = schedule();
        let mut batch = ParticleBatch::new();
        batch.seed(0.0, 0.0, -2.0); // early stage, above -5 m target
        batch.seed(0.0, 0.0, -40.0);
        batch.age_seconds[1] = 3.0 * 86_400.0; // pre-flexion, below -15 m
        s.apply(&mut batch);
        assert_eq!(batch.terminal_velocity[0], -0.002);
        assert_eq!(batch.terminal_velocity[1], 0.002);
    }

    #[test]
    fn test_holds_depth_at_target() {
        let s = schedule();
        let mut batch = ParticleBatch::new();
        batch.seed(0.0, 0.0, -5.0);
        s.apply(&mut batch);
        assert_eq!(batch.terminal_velocity[0], 0.0);
    }

    #[test]
    fn test_disabled_schedule_writes_nothing() {
        let s = VerticalSchedule {
            enabled: false,
            ..schedule()
        };
        let mut batch = ParticleBatch::new();
        batch.seed(0.0, 0.0, -40.0);
        batch.terminal_velocity[0] = 0.123;
        s.apply(&mut batch);
        assert_eq!(batch.terminal_velocity[0], 0.123);
    }

    #[test]
    fn test_maximum_depth_clamp() {
        let s = schedule();
        let mut batch = ParticleBatch::new();
        batch.seed(0.0, 0.0, -80.0);
        batch.seed(0.0, 0.0, -59.0);
        s.clamp_to_maximum_depth(&mut batch);
        assert_eq!(batch.z[0], -60.0);
        assert_eq!(batch.z[1], -59.0);
    }

    #[test]
    fn test_surface_stick() {
        let mut batch = ParticleBatch::new();
        batch.seed(0.0, 0.0, 0.5);
        batch.seed(0.0, 0.0, -1.0);
        let env = vec![EnvSample::default(); 2];
        VerticalSchedule::surface_stick(&mut batch, &env);
        assert_eq!(batch.z[0], -0.01);
        assert_eq!(batch.z[1], -1.0);
    }
}
