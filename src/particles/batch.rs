//! Columnar particle storage
//!
//! One slot per particle, index-aligned across every field array. Particles
//! are appended at seeding and removed only through retirement; ids stay
//! stable across compaction. The previous-position table is an explicit
//! id -> position map, the invariant being that it always holds the last
//! legal (wet, in-domain) position of that particle.

use crate::core::types::{ParticleId, ParticleStatus};
use ahash::AHashMap;

/// Final record for a deactivated particle; keeps the causal status
/// retrievable after the slot is compacted away.
#[derive(Debug, Clone, Copy)]
pub struct RetiredParticle {
    pub id: ParticleId,
    pub status: ParticleStatus,
    pub lon: f64,
    pub lat: f64,
    pub z: f64,
    pub age_seconds: f64,
}

#[derive(Default)]
pub struct ParticleBatch {
    pub ids: Vec<ParticleId>,
    /// Degrees, WGS84-like geographic position
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Meters, negative down
    pub z: Vec<f64>,
    pub age_seconds: Vec<f64>,
    pub status: Vec<ParticleStatus>,
    /// Signed vertical self-propulsion, m/s, written by the vertical schedule
    pub terminal_velocity: Vec<f64>,
    /// Horizontal swim velocity buffer, m/s, written by the orientation engine
    pub swim_u: Vec<f64>,
    pub swim_v: Vec<f64>,

    previous: AHashMap<ParticleId, (f64, f64)>,
    retired: Vec<RetiredParticle>,
    next_id: u64,
}

impl ParticleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new particle at the given position, age zero, active.
    pub fn seed(&mut self, lon: f64, lat: f64, z: f64) -> ParticleId {
        self.next_id += 1;
        let id = ParticleId(self.next_id);
        self.ids.push(id);
        self.lon.push(lon);
        self.lat.push(lat);
        self.z.push(z);
        self.age_seconds.push(0.0);
        self.status.push(ParticleStatus::Active);
        self.terminal_velocity.push(0.0);
        self.swim_u.push(0.0);
        self.swim_v.push(0.0);
        id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_active(&self, i: usize) -> bool {
        self.status[i] == ParticleStatus::Active
    }

    pub fn iter_active(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&i| self.is_active(i))
    }

    pub fn active_count(&self) -> usize {
        self.iter_active().count()
    }

    /// Snapshot the current position of every active particle as its last
    /// legal position. Called at the start of a timestep, before any move.
    pub fn record_previous_positions(&mut self) {
        for i in 0..self.len() {
            if self.is_active(i) {
                self.previous.insert(self.ids[i], (self.lon[i], self.lat[i]));
            }
        }
    }

    pub fn previous_position(&self, id: ParticleId) -> Option<(f64, f64)> {
        self.previous.get(&id).copied()
    }

    /// Move a particle back to its recorded previous wet position. No-op if
    /// nothing was recorded yet (a particle in its seeding step).
    pub fn revert_to_previous(&mut self, i: usize) {
        if let Some(&(plon, plat)) = self.previous.get(&self.ids[i]) {
            self.lon[i] = plon;
            self.lat[i] = plat;
        }
    }

    pub fn reset_swim_velocity(&mut self) {
        self.swim_u.fill(0.0);
        self.swim_v.fill(0.0);
    }

    /// Mark a particle with a terminal status. Terminal states are one-way:
    /// a particle already deactivated this step keeps its first cause.
    pub fn deactivate(&mut self, i: usize, status: ParticleStatus) {
        debug_assert!(status.is_terminal());
        if self.status[i] == ParticleStatus::Active {
            self.status[i] = status;
        }
    }

    /// Compact deactivated particles out of the active arrays into the
    /// retirement log. Ids of surviving particles are untouched.
    pub fn retire_deactivated(&mut self) {
        if self.status.iter().all(|s| *s == ParticleStatus::Active) {
            return;
        }
        let mut keep = 0;
        for i in 0..self.len() {
            if self.is_active(i) {
                if keep != i {
                    self.ids[keep] = self.ids[i];
                    self.lon[keep] = self.lon[i];
                    self.lat[keep] = self.lat[i];
                    self.z[keep] = self.z[i];
                    self.age_seconds[keep] = self.age_seconds[i];
                    self.status[keep] = self.status[i];
                    self.terminal_velocity[keep] = self.terminal_velocity[i];
                    self.swim_u[keep] = self.swim_u[i];
                    self.swim_v[keep] = self.swim_v[i];
                }
                keep += 1;
            } else {
                self.previous.remove(&self.ids[i]);
                self.retired.push(RetiredParticle {
                    id: self.ids[i],
                    status: self.status[i],
                    lon: self.lon[i],
                    lat: self.lat[i],
                    z: self.z[i],
                    age_seconds: self.age_seconds[i],
                });
            }
        }
        self.ids.truncate(keep);
        self.lon.truncate(keep);
        self.lat.truncate(keep);
        self.z.truncate(keep);
        self.age_seconds.truncate(keep);
        self.status.truncate(keep);
        self.terminal_velocity.truncate(keep);
        self.swim_u.truncate(keep);
        self.swim_v.truncate(keep);
    }

    pub fn retired(&self) -> &[RetiredParticle] {
        &self.retired
    }

    /// Retirement record for one particle, if it has been deactivated
    pub fn retired_status(&self, id: ParticleId) -> Option<ParticleStatus> {
        self.retired.iter().find(|r| r.id == id).map(|r| r.status)
    }
}
