//! Contracts for the external collaborators this core consumes
//!
//! Field interpolation, turbulent mixing and mortality all live outside the
//! per-timestep decision logic; they are typed here as traits with the
//! simplest useful implementations bundled for tests and demos.

use crate::particles::ParticleBatch;

/// Environment fields interpolated at one particle position
#[derive(Debug, Clone, Copy)]
pub struct EnvSample {
    /// Eastward sea-water velocity, m/s
    pub u: f64,
    /// Northward sea-water velocity, m/s
    pub v: f64,
    /// Land binary mask: true on land, false in water
    pub land: bool,
    /// Sea floor depth below sea level, meters positive down
    pub sea_floor_depth: f64,
    /// Sea surface height relative to mean sea level, meters
    pub sea_surface_height: f64,
}

impl Default for EnvSample {
    /// The fallback values used when a field is unavailable
    fn default() -> Self {
        Self {
            u: 0.0,
            v: 0.0,
            land: false,
            sea_floor_depth: 100.0,
            sea_surface_height: 0.0,
        }
    }
}

/// Ocean/atmosphere field reader: interpolates the required fields at a
/// batch of positions for the given simulation time. The returned vector is
/// index-aligned with the input slices.
pub trait EnvironmentProvider {
    fn sample(&self, time_seconds: f64, lon: &[f64], lat: &[f64], z: &[f64]) -> Vec<EnvSample>;
}

/// Spatially uniform environment built from the fallback table; the default
/// is quiescent water over a 100 m bottom.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformEnvironment {
    pub sample: EnvSample,
}

impl UniformEnvironment {
    pub fn with_current(u: f64, v: f64) -> Self {
        Self {
            sample: EnvSample {
                u,
                v,
                ..EnvSample::default()
            },
        }
    }
}

impl EnvironmentProvider for UniformEnvironment {
    fn sample(&self, _time: f64, lon: &[f64], _lat: &[f64], _z: &[f64]) -> Vec<EnvSample> {
        vec![self.sample; lon.len()]
    }
}

/// Closure-backed environment, handy for tests that need position-dependent
/// fields (a land mask east of some meridian, a shoaling bottom, ...).
pub struct FnEnvironment<F>(pub F)
where
    F: Fn(f64, f64, f64) -> EnvSample;

impl<F> EnvironmentProvider for FnEnvironment<F>
where
    F: Fn(f64, f64, f64) -> EnvSample,
{
    fn sample(&self, _time: f64, lon: &[f64], lat: &[f64], z: &[f64]) -> Vec<EnvSample> {
        (0..lon.len()).map(|i| (self.0)(lon[i], lat[i], z[i])).collect()
    }
}

/// Vertical advection plus turbulent-mixing-or-buoyancy solver.
pub trait VerticalSolver {
    /// Vertical advection by the resolved flow; default none
    fn advect(&self, _batch: &mut ParticleBatch, _env: &[EnvSample], _dt: f64) {}

    /// Mixing or buoyancy step, applied after the migration schedule has
    /// written `terminal_velocity`
    fn mix(&self, batch: &mut ParticleBatch, env: &[EnvSample], dt: f64);
}

/// Settling-only solver: integrates `terminal_velocity` and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuoyancyOnly;

impl VerticalSolver for BuoyancyOnly {
    fn mix(&self, batch: &mut ParticleBatch, _env: &[EnvSample], dt: f64) {
        for i in 0..batch.len() {
            if batch.is_active(i) {
                batch.z[i] += batch.terminal_velocity[i] * dt;
            }
        }
    }
}

/// Per-step mortality hook. Environmental mortality is a planned extension;
/// the bundled implementation removes nobody.
pub trait MortalityModel {
    fn apply(&self, batch: &mut ParticleBatch, dt: f64);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoMortality;

impl MortalityModel for NoMortality {
    fn apply(&self, _batch: &mut ParticleBatch, _dt: f64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_environment_is_batch_aligned() {
        let env = UniformEnvironment::with_current(0.3, -0.1);
        let samples = env.sample(0.0, &[1.0, 2.0, 3.0], &[0.0; 3], &[-5.0; 3]);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].u, 0.3);
        assert_eq!(samples[2].v, -0.1);
        assert!(!samples[0].land);
    }

    #[test]
    fn test_buoyancy_only_integrates_terminal_velocity() {
        let mut batch = ParticleBatch::new();
        batch.seed(0.0, 0.0, -10.0);
        batch.terminal_velocity[0] = 0.01;
        BuoyancyOnly.mix(&mut batch, &[EnvSample::default()], 100.0);
        assert!((batch.z[0] + 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_fn_environment_masks_by_position() {
        let env = FnEnvironment(|lon, _lat, _z| EnvSample {
            land: lon > 0.0,
            ..EnvSample::default()
        });
        let samples = env.sample(0.0, &[-1.0, 1.0], &[0.0; 2], &[0.0; 2]);
        assert!(!samples[0].land);
        assert!(samples[1].land);
    }
}
