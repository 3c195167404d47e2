//! Heading selection for self-propelled swimming
//!
//! One engine, four strategies behind a tagged mode: direct habitat-seeking
//! (biased correlated random walk, Codling 2004 / Staaterman 2012),
//! rheotaxis (counter-current), cardinal (fixed heading) and the two
//! continuous blends. Every eligible particle gets exactly one von Mises
//! draw per timestep. The engine writes the batch's swim-velocity buffer
//! and never moves particles itself.

use crate::behavior::swim_speed::SwimSpeed;
use crate::behavior::von_mises::VonMises;
use crate::core::config::{DriftConfig, OrientationMode};
use crate::core::error::{DriftError, Result};
use crate::env::EnvSample;
use crate::habitat::HabitatIndex;
use crate::particles::ParticleBatch;
use crate::spatial::sphere::bearing;
use rand::Rng;
use std::sync::Arc;

/// Offshore heading strategy used before habitat-seeking takes over
#[derive(Debug, Clone, Copy)]
enum BaseHeading {
    Rheotaxis,
    Cardinal,
}

pub struct OrientationEngine {
    mode: OrientationMode,
    habitat: Option<Arc<HabitatIndex>>,
    swim: SwimSpeed,
    von_mises: VonMises,
    beginning_age_seconds: f64,
    settlement_age_seconds: f64,
    max_distance_km: f64,
    cardinal_heading_rad: f64,
}

impl OrientationEngine {
    pub fn new(cfg: &DriftConfig, habitat: Option<Arc<HabitatIndex>>) -> Result<Self> {
        if cfg.orientation.requires_habitat() {
            let usable = habitat.as_ref().map(|h| !h.is_empty()).unwrap_or(false);
            if !usable {
                return Err(DriftError::EmptyHabitat {
                    context: "direct/continuous orientation needs habitat polygons",
                });
            }
        }
        let cardinal_heading_rad = match cfg.cardinal_heading_deg {
            Some(h) => h.to_radians(),
            None if cfg.orientation.requires_heading() => {
                return Err(DriftError::option(
                    "cardinal_heading_deg",
                    "required for cardinal/continuous-cardinal orientation",
                ))
            }
            None => 0.0,
        };
        Ok(Self {
            mode: cfg.orientation,
            habitat,
            swim: SwimSpeed::from_config(cfg),
            von_mises: VonMises::new(cfg.orientation_kappa),
            beginning_age_seconds: cfg.beginning_orientation_seconds,
            settlement_age_seconds: cfg.min_settlement_age_seconds,
            max_distance_km: cfg.max_orient_distance_km,
            cardinal_heading_rad,
        })
    }

    /// Fill the batch's swim-velocity buffer for this timestep. Particles
    /// younger than the beginning-of-orientation age keep zero velocity.
    /// The caller resets the buffer beforehand.
    pub fn compute<R: Rng + ?Sized>(
        &self,
        batch: &mut ParticleBatch,
        env: &[EnvSample],
        rng: &mut R,
    ) -> Result<()> {
        match self.mode {
            OrientationMode::None => Ok(()),
            OrientationMode::Direct => self.habitat_seeking_pass(batch, self.beginning_age_seconds, rng),
            OrientationMode::Rheotaxis => {
                self.base_pass(batch, env, BaseHeading::Rheotaxis, rng);
                Ok(())
            }
            OrientationMode::Cardinal => {
                self.base_pass(batch, env, BaseHeading::Cardinal, rng);
                Ok(())
            }
            // The continuous blends run two passes over the same buffer:
            // the offshore behavior first, then habitat-seeking for
            // competent particles within detection range. The overwrite
            // order is load-bearing; particles out of range keep the first
            // pass's velocity.
            OrientationMode::ContinuousCurrent => {
                self.base_pass(batch, env, BaseHeading::Rheotaxis, rng);
                self.habitat_seeking_pass(batch, self.settlement_age_seconds, rng)
            }
            OrientationMode::ContinuousCardinal => {
                self.base_pass(batch, env, BaseHeading::Cardinal, rng);
                self.habitat_seeking_pass(batch, self.settlement_age_seconds, rng)
            }
        }
    }

    /// Rheotaxis or cardinal heading for every orientation-eligible particle
    fn base_pass<R: Rng + ?Sized>(
        &self,
        batch: &mut ParticleBatch,
        env: &[EnvSample],
        base: BaseHeading,
        rng: &mut R,
    ) {
        for i in 0..batch.len() {
            if !batch.is_active(i) || batch.age_seconds[i] < self.beginning_age_seconds {
                continue;
            }
            let ti = self.von_mises.sample(rng);
            let speed = self.swim.speed_m_s(batch.age_seconds[i]);
            let (theta, magnitude) = match base {
                BaseHeading::Rheotaxis => {
                    // Heading mirrored against the local current; larvae
                    // cannot out-swim it, so the magnitude is capped at the
                    // current speed.
                    let theta = -env[i].v.atan2(env[i].u) + ti;
                    let uv = env[i].u.hypot(env[i].v);
                    (theta, if speed < uv { speed } else { uv })
                }
                BaseHeading::Cardinal => (self.cardinal_heading_rad + ti, speed),
            };
            batch.swim_u[i] = magnitude * theta.cos();
            batch.swim_v[i] = magnitude * theta.sin();
        }
    }

    /// Biased correlated random walk toward the nearest habitat centroid,
    /// for particles at or past `min_age` and within detection range.
    fn habitat_seeking_pass<R: Rng + ?Sized>(
        &self,
        batch: &mut ParticleBatch,
        min_age: f64,
        rng: &mut R,
    ) -> Result<()> {
        let habitat = self.habitat.as_ref().ok_or(DriftError::EmptyHabitat {
            context: "habitat-seeking orientation without a habitat index",
        })?;
        for i in 0..batch.len() {
            if !batch.is_active(i) || batch.age_seconds[i] < min_age {
                continue;
            }
            let (lon, lat) = (batch.lon[i], batch.lat[i]);
            let (dist_km, habitat_id) = habitat.nearest(lon, lat)?;
            if dist_km > self.max_distance_km {
                continue;
            }

            // Turning strength grows as the habitat gets closer
            let d = 1.0 - dist_km / self.max_distance_km;
            let (clon, clat) = habitat.centroid_deg(habitat_id);
            let theta_pref = -bearing(lon, lat, clon, clat);
            // Recent heading, from the last legal position to here
            let (plon, plat) = batch
                .previous_position(batch.ids[i])
                .unwrap_or((lon, lat));
            let theta_current = bearing(plon, plat, lon, lat);
            let mu = -d * (theta_current - theta_pref);
            let ti = self.von_mises.sample(rng);
            let theta = ti - theta_current - mu;

            let speed = self.swim.speed_m_s(batch.age_seconds[i]);
            batch.swim_u[i] = speed * theta.cos();
            batch.swim_v[i] = speed * theta.sin();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn base_config(mode: OrientationMode) -> DriftConfig {
        DriftConfig {
            orientation: mode,
            hatch_swimming_speed_cm_s: 10.0,
            settle_swimming_speed_cm_s: 10.0, // constant 0.1 m/s
            cardinal_heading_deg: Some(0.0),
            max_orient_distance_km: 20.0,
            orientation_kappa: 200.0,
            ..Default::default()
        }
    }

    fn reef() -> Arc<HabitatIndex> {
        Arc::new(
            HabitatIndex::from_rings(&[vec![
                (170.0, -40.0),
                (170.1, -40.0),
                (170.1, -39.9),
                (170.0, -39.9),
                (170.0, -40.0),
            ]])
            .unwrap(),
        )
    }

    fn one_particle_batch(lon: f64, lat: f64, age: f64) -> ParticleBatch {
        let mut batch = ParticleBatch::new();
        batch.seed(lon, lat, -5.0);
        batch.age_seconds[0] = age;
        batch
    }

    fn quiet_water() -> Vec<EnvSample> {
        vec![EnvSample::default()]
    }

    #[test]
    fn test_young_particles_do_not_swim() {
        for mode in [
            OrientationMode::Direct,
            OrientationMode::Rheotaxis,
            OrientationMode::Cardinal,
            OrientationMode::ContinuousCurrent,
            OrientationMode::ContinuousCardinal,
        ] {
            let cfg = DriftConfig {
                beginning_orientation_seconds: 86_400.0,
                min_settlement_age_seconds: 86_400.0,
                ..base_config(mode)
            };
            let engine = OrientationEngine::new(&cfg, Some(reef())).unwrap();
            let mut batch = one_particle_batch(170.05, -39.95, 100.0);
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            engine
                .compute(&mut batch, &quiet_water(), &mut rng)
                .unwrap();
            assert_eq!(batch.swim_u[0], 0.0, "{mode:?}");
            assert_eq!(batch.swim_v[0], 0.0, "{mode:?}");
        }
    }

    #[test]
    fn test_cardinal_heads_east_on_average() {
        let cfg = base_config(OrientationMode::Cardinal);
        let engine = OrientationEngine::new(&cfg, None).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut batch = one_particle_batch(0.0, 0.0, 3600.0);
        let (mut sum_u, mut sum_v) = (0.0, 0.0);
        for _ in 0..200 {
            batch.reset_swim_velocity();
            engine
                .compute(&mut batch, &quiet_water(), &mut rng)
                .unwrap();
            sum_u += batch.swim_u[0];
            sum_v += batch.swim_v[0];
        }
        assert!(sum_u > 0.0);
        assert!(sum_v.abs() < sum_u / 4.0, "u={sum_u} v={sum_v}");
    }

    #[test]
    fn test_rheotaxis_swims_against_current_capped_at_its_speed() {
        // Current slower than the larva: swim magnitude equals the current
        // speed exactly
        let cfg = base_config(OrientationMode::Rheotaxis);
        let engine = OrientationEngine::new(&cfg, None).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut batch = one_particle_batch(0.0, 0.0, 3600.0);
        let env = vec![EnvSample {
            u: 0.0,
            v: 0.05,
            ..EnvSample::default()
        }];
        engine.compute(&mut batch, &env, &mut rng).unwrap();
        let mag = batch.swim_u[0].hypot(batch.swim_v[0]);
        assert!((mag - 0.05).abs() < 1e-12, "magnitude {mag}");
        // Northward current mirrors to a southward heading; high kappa keeps
        // the draw tight around it
        assert!(batch.swim_v[0] < 0.0);
    }

    #[test]
    fn test_rheotaxis_uses_swim_speed_in_strong_current() {
        let cfg = base_config(OrientationMode::Rheotaxis);
        let engine = OrientationEngine::new(&cfg, None).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut batch = one_particle_batch(0.0, 0.0, 3600.0);
        let env = vec![EnvSample {
            u: 1.0,
            v: 0.5,
            ..EnvSample::default()
        }];
        engine.compute(&mut batch, &env, &mut rng).unwrap();
        let mag = batch.swim_u[0].hypot(batch.swim_v[0]);
        assert!((mag - 0.1).abs() < 1e-12, "magnitude {mag}");
    }

    #[test]
    fn test_direct_outside_detection_range_keeps_zero() {
        let cfg = base_config(OrientationMode::Direct);
        let engine = OrientationEngine::new(&cfg, Some(reef())).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(19);
        // ~500 km from the reef, max detection 20 km
        let mut batch = one_particle_batch(176.0, -40.0, 3600.0);
        engine
            .compute(&mut batch, &quiet_water(), &mut rng)
            .unwrap();
        assert_eq!(batch.swim_u[0], 0.0);
        assert_eq!(batch.swim_v[0], 0.0);
    }

    #[test]
    fn test_direct_in_range_swims_at_age_speed() {
        let cfg = base_config(OrientationMode::Direct);
        let engine = OrientationEngine::new(&cfg, Some(reef())).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let mut batch = one_particle_batch(170.15, -39.95, 3600.0);
        engine
            .compute(&mut batch, &quiet_water(), &mut rng)
            .unwrap();
        let mag = batch.swim_u[0].hypot(batch.swim_v[0]);
        assert!((mag - 0.1).abs() < 1e-12, "magnitude {mag}");
    }

    #[test]
    fn test_continuous_current_overrides_only_in_range() {
        let cfg = DriftConfig {
            min_settlement_age_seconds: 0.0,
            ..base_config(OrientationMode::ContinuousCurrent)
        };
        let engine = OrientationEngine::new(&cfg, Some(reef())).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(29);

        // Quiescent water: the rheotaxis first pass writes zero (capped at
        // the current speed). In range, the habitat-seeking pass overrides.
        let mut near = one_particle_batch(170.15, -39.95, 3600.0);
        engine.compute(&mut near, &quiet_water(), &mut rng).unwrap();
        let mag = near.swim_u[0].hypot(near.swim_v[0]);
        assert!((mag - 0.1).abs() < 1e-12);

        // Out of range, the first pass's value silently stands
        let mut far = one_particle_batch(176.0, -40.0, 3600.0);
        engine.compute(&mut far, &quiet_water(), &mut rng).unwrap();
        assert_eq!(far.swim_u[0], 0.0);
        assert_eq!(far.swim_v[0], 0.0);
    }

    #[test]
    fn test_continuous_blend_needs_habitat() {
        let cfg = base_config(OrientationMode::ContinuousCardinal);
        assert!(matches!(
            OrientationEngine::new(&cfg, None),
            Err(DriftError::EmptyHabitat { .. })
        ));
        let empty = Arc::new(HabitatIndex::new(Vec::new()).unwrap());
        assert!(OrientationEngine::new(&cfg, Some(empty)).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Rheotaxis never out-swims the current, whatever the current
            /// vector or larval age.
            #[test]
            fn rheotaxis_magnitude_capped_by_current(
                u in -2.0f64..2.0,
                v in -2.0f64..2.0,
                age in 0.0f64..2_592_000.0,
                seed in 0u64..1024,
            ) {
                let cfg = DriftConfig {
                    hatch_swimming_speed_cm_s: 2.0,
                    settle_swimming_speed_cm_s: 12.0,
                    ..base_config(OrientationMode::Rheotaxis)
                };
                let engine = OrientationEngine::new(&cfg, None).unwrap();
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut batch = one_particle_batch(0.0, 0.0, age);
                let env = vec![EnvSample { u, v, ..EnvSample::default() }];
                engine.compute(&mut batch, &env, &mut rng).unwrap();
                let mag = batch.swim_u[0].hypot(batch.swim_v[0]);
                prop_assert!(mag <= u.hypot(v) + 1e-12);
            }
        }
    }
}
