//! Von Mises sampling for the stochastic heading perturbation
//!
//! Best & Fisher (1979) rejection sampling from a wrapped Cauchy envelope.
//! Location is fixed at zero (the perturbation is always added to a
//! preferred heading); concentration kappa comes from configuration.

use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct VonMises {
    kappa: f64,
    r: f64,
}

impl VonMises {
    /// Negligible concentration below which the distribution is treated as
    /// circular uniform.
    const UNIFORM_KAPPA: f64 = 1e-7;

    pub fn new(kappa: f64) -> Self {
        let r = if kappa < Self::UNIFORM_KAPPA {
            1.0
        } else {
            let tau = 1.0 + (1.0 + 4.0 * kappa * kappa).sqrt();
            let rho = (tau - (2.0 * tau).sqrt()) / (2.0 * kappa);
            (1.0 + rho * rho) / (2.0 * rho)
        };
        Self { kappa, r }
    }

    /// One draw from VonMises(0, kappa), in (-pi, pi].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.kappa < Self::UNIFORM_KAPPA {
            return rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
        }
        loop {
            let u1: f64 = rng.gen_range(0.0..1.0);
            let z = (std::f64::consts::PI * u1).cos();
            let f = (1.0 + self.r * z) / (self.r + z);
            let c = self.kappa * (self.r - f);
            let u2: f64 = rng.gen_range(0.0..1.0);
            if c * (2.0 - c) - u2 > 0.0 || (c / u2).ln() + 1.0 - c >= 0.0 {
                let u3: f64 = rng.gen_range(0.0..1.0);
                return (u3 - 0.5).signum() * f.clamp(-1.0, 1.0).acos();
            }
        }
    }
}
