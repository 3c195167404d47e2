//! Age-dependent horizontal swimming speed
//!
//! Speed develops from the hatching speed toward the settlement-stage speed
//! as a power law of age normalized by the maximum pelagic age (Fisher &
//! Bellwood form): `(hatch + (settle - hatch)^(ln age / ln max_age)) / 100`,
//! inputs in cm/s, output in m/s.

use crate::core::config::DriftConfig;

#[derive(Debug, Clone, Copy)]
pub struct SwimSpeed {
    hatch_cm_s: f64,
    settle_cm_s: f64,
    max_age_seconds: f64,
    /// Floor applied to the age before evaluation; the formula is singular
    /// at age <= 0, so ages are clamped to one timestep.
    min_age_seconds: f64,
}

impl SwimSpeed {
    /// Config is validated before this point: `max_age > 1`,
    /// `settle >= hatch`, positive timestep.
    pub fn from_config(cfg: &DriftConfig) -> Self {
        Self {
            hatch_cm_s: cfg.hatch_swimming_speed_cm_s,
            settle_cm_s: cfg.settle_swimming_speed_cm_s,
            max_age_seconds: cfg.max_age_seconds,
            min_age_seconds: cfg.timestep_seconds,
        }
    }

    pub fn speed_m_s(&self, age_seconds: f64) -> f64 {
        let growth = self.settle_cm_s - self.hatch_cm_s;
        if growth == 0.0 {
            // 0^x is 0 or +inf depending on the exponent's sign; a species
            // with no speed development just swims at the hatch speed.
            return self.hatch_cm_s / 100.0;
        }
        let age = age_seconds.max(self.min_age_seconds);
        let exponent = age.ln() / self.max_age_seconds.ln();
        (self.hatch_cm_s + growth.powf(exponent)) / 100.0
    }
}
