//! Per-timestep orchestration
//!
//! The fixed order of operations inside one timestep:
//!
//! 1. snapshot previous positions (the coastline revert target)
//! 2. sample the environment at the current positions
//! 3. advect by the ocean current
//! 4. orientation: one heading draw per eligible particle, then the swim move
//! 5. vertical advection, migration schedule, mixing, depth clamps
//! 6. re-sample the environment at the new positions
//! 7. seafloor, coastline and habitat interactions
//! 8. mortality, aging, lifetime and domain culls, retirement
//!
//! Deactivation order within a step decides a particle's final status; a
//! terminal status is never overwritten.

use crate::behavior::{OrientationEngine, VerticalSchedule};
use crate::boundary::BoundaryPolicy;
use crate::core::config::DriftConfig;
use crate::core::error::{DriftError, Result};
use crate::core::types::{ParticleId, ParticleStatus};
use crate::env::{BuoyancyOnly, EnvironmentProvider, MortalityModel, NoMortality, VerticalSolver};
use crate::habitat::HabitatIndex;
use crate::particles::ParticleBatch;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, info};

/// Meters per degree of latitude (and of longitude at the equator)
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Equirectangular position update: a velocity in m/s integrated over dt,
/// with the longitude step scaled by the cosine of the starting latitude.
fn step_position(lon: f64, lat: f64, u: f64, v: f64, dt: f64) -> (f64, f64) {
    let dlat = v * dt / METERS_PER_DEGREE;
    let dlon = u * dt / (METERS_PER_DEGREE * lat.to_radians().cos());
    (lon + dlon, lat + dlat)
}

/// Particle counts by status, active slots and retirement log combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Census {
    pub active: usize,
    pub settled_on_coast: usize,
    pub settled_on_bottom: usize,
    pub home_sweet_home: usize,
    pub died: usize,
    pub outside: usize,
    pub seeded_on_land: usize,
}

impl Census {
    /// Count for one status, for callers iterating the status set
    pub fn of(&self, status: ParticleStatus) -> usize {
        match status {
            ParticleStatus::Active => self.active,
            ParticleStatus::SettledOnCoast => self.settled_on_coast,
            ParticleStatus::SettledOnBottom => self.settled_on_bottom,
            ParticleStatus::HomeSweetHome => self.home_sweet_home,
            ParticleStatus::Died => self.died,
            ParticleStatus::Outside => self.outside,
            ParticleStatus::SeededOnLand => self.seeded_on_land,
        }
    }

    fn count(&mut self, status: ParticleStatus) {
        match status {
            ParticleStatus::Active => self.active += 1,
            ParticleStatus::SettledOnCoast => self.settled_on_coast += 1,
            ParticleStatus::SettledOnBottom => self.settled_on_bottom += 1,
            ParticleStatus::HomeSweetHome => self.home_sweet_home += 1,
            ParticleStatus::Died => self.died += 1,
            ParticleStatus::Outside => self.outside += 1,
            ParticleStatus::SeededOnLand => self.seeded_on_land += 1,
        }
    }
}

pub struct Simulation<E> {
    cfg: DriftConfig,
    env: E,
    orientation: OrientationEngine,
    schedule: VerticalSchedule,
    boundary: BoundaryPolicy,
    vertical_solver: Box<dyn VerticalSolver>,
    mortality: Box<dyn MortalityModel>,
    batch: ParticleBatch,
    rng: ChaCha8Rng,
    time_seconds: f64,
}

impl<E: EnvironmentProvider> Simulation<E> {
    pub fn new(
        cfg: DriftConfig,
        env: E,
        habitat: Option<Arc<HabitatIndex>>,
        seed: u64,
    ) -> Result<Self> {
        cfg.validate()?;
        if cfg.settlement_in_habitat {
            let usable = habitat.as_ref().map(|h| !h.is_empty()).unwrap_or(false);
            if !usable {
                return Err(DriftError::option(
                    "settlement_in_habitat",
                    "habitat-restricted settlement needs habitat polygons",
                ));
            }
        }
        let orientation = OrientationEngine::new(&cfg, habitat.clone())?;
        let schedule = VerticalSchedule::from_config(&cfg);
        let boundary = BoundaryPolicy::new(&cfg, habitat);
        Ok(Self {
            cfg,
            env,
            orientation,
            schedule,
            boundary,
            vertical_solver: Box::new(BuoyancyOnly),
            mortality: Box::new(NoMortality),
            batch: ParticleBatch::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            time_seconds: 0.0,
        })
    }

    pub fn with_vertical_solver(mut self, solver: impl VerticalSolver + 'static) -> Self {
        self.vertical_solver = Box::new(solver);
        self
    }

    pub fn with_mortality(mut self, mortality: impl MortalityModel + 'static) -> Self {
        self.mortality = Box::new(mortality);
        self
    }

    pub fn seed_particle(&mut self, lon: f64, lat: f64, z: f64) -> ParticleId {
        self.batch.seed(lon, lat, z)
    }

    pub fn time_seconds(&self) -> f64 {
        self.time_seconds
    }

    pub fn batch(&self) -> &ParticleBatch {
        &self.batch
    }

    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for i in 0..self.batch.len() {
            census.count(self.batch.status[i]);
        }
        for r in self.batch.retired() {
            census.count(r.status);
        }
        census
    }

    /// Advance the model by one timestep.
    pub fn step(&mut self) -> Result<()> {
        let dt = self.cfg.timestep_seconds;
        let batch = &mut self.batch;
        batch.record_previous_positions();

        let env_pre = self
            .env
            .sample(self.time_seconds, &batch.lon, &batch.lat, &batch.z);

        // Passive advection by the resolved current
        for i in 0..batch.len() {
            if batch.is_active(i) {
                let (lon, lat) =
                    step_position(batch.lon[i], batch.lat[i], env_pre[i].u, env_pre[i].v, dt);
                batch.lon[i] = lon;
                batch.lat[i] = lat;
            }
        }

        // Self-propulsion, additive on top of the current
        batch.reset_swim_velocity();
        self.orientation.compute(batch, &env_pre, &mut self.rng)?;
        for i in 0..batch.len() {
            if batch.is_active(i) {
                let (lon, lat) =
                    step_position(batch.lon[i], batch.lat[i], batch.swim_u[i], batch.swim_v[i], dt);
                batch.lon[i] = lon;
                batch.lat[i] = lat;
            }
        }

        // Vertical: resolved flow, migration schedule, mixing, then clamps
        self.vertical_solver.advect(batch, &env_pre, dt);
        self.schedule.apply(batch);
        self.vertical_solver.mix(batch, &env_pre, dt);
        VerticalSchedule::surface_stick(batch, &env_pre);
        self.schedule.clamp_to_maximum_depth(batch);

        // Boundary interactions read the environment at the new positions
        let env_post = self
            .env
            .sample(self.time_seconds + dt, &batch.lon, &batch.lat, &batch.z);
        self.boundary.interact_with_seafloor(batch, &env_post);
        self.boundary.interact_with_coastline(batch, &env_post);
        self.boundary.check_habitat_settlement(batch);

        self.mortality.apply(batch, dt);

        // Aging happens last: a particle seeded this step moved at age zero
        for i in 0..batch.len() {
            if batch.is_active(i) {
                batch.age_seconds[i] += dt;
            }
        }

        self.cull_expired();
        self.cull_outside_domain();

        self.batch.retire_deactivated();
        self.time_seconds += dt;
        debug!(
            time_seconds = self.time_seconds,
            active = self.batch.active_count(),
            retired = self.batch.retired().len(),
            "step complete"
        );
        Ok(())
    }

    /// Run a fixed number of timesteps, stopping early once no particle
    /// remains active.
    pub fn run(&mut self, steps: usize) -> Result<Census> {
        for n in 0..steps {
            if self.batch.is_empty() {
                info!(steps_run = n, "all particles retired");
                break;
            }
            self.step()?;
        }
        let census = self.census();
        info!(?census, time_seconds = self.time_seconds, "run finished");
        Ok(census)
    }

    fn cull_expired(&mut self) {
        let batch = &mut self.batch;
        for i in 0..batch.len() {
            if batch.is_active(i) && batch.age_seconds[i] >= self.cfg.max_age_seconds {
                batch.deactivate(i, ParticleStatus::Died);
            }
        }
    }

    fn cull_outside_domain(&mut self) {
        let Some(bounds) = self.cfg.domain else {
            return;
        };
        let batch = &mut self.batch;
        for i in 0..batch.len() {
            if !batch.is_active(i) {
                continue;
            }
            let (lon, lat) = (batch.lon[i], batch.lat[i]);
            let out = bounds.west.is_some_and(|w| lon < w)
                || bounds.east.is_some_and(|e| lon > e)
                || bounds.south.is_some_and(|s| lat < s)
                || bounds.north.is_some_and(|n| lat > n);
            if out {
                batch.deactivate(i, ParticleStatus::Outside);
            }
        }
    }
}
