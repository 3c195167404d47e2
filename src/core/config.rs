//! Run configuration for the dispersal model
//!
//! A flat set of named options, validated once before the first timestep and
//! read-only for the remainder of the run. Ages are seconds, depths are
//! meters negative down, swimming speeds are centimeters per second
//! (converted to m/s by the swim-speed model), headings are degrees with
//! 0 = East.

use crate::core::error::{DriftError, Result};
use serde::{Deserialize, Serialize};

/// Heading-selection strategy for self-propelled swimming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationMode {
    /// No orientation behavior; particles drift passively
    #[default]
    None,
    /// Biased correlated random walk toward the nearest habitat
    Direct,
    /// Counter-current swimming
    Rheotaxis,
    /// Swimming toward a fixed configured heading
    Cardinal,
    /// Rheotaxis offshore, direct orientation once competent and in range
    ContinuousCurrent,
    /// Cardinal offshore, direct orientation once competent and in range
    ContinuousCardinal,
}

impl OrientationMode {
    /// Modes that query the habitat index every step
    pub fn requires_habitat(&self) -> bool {
        matches!(
            self,
            Self::Direct | Self::ContinuousCurrent | Self::ContinuousCardinal
        )
    }

    /// Modes that need a cardinal heading configured
    pub fn requires_heading(&self) -> bool {
        matches!(self, Self::Cardinal | Self::ContinuousCardinal)
    }
}

/// Optional rectangular validity domain; each bound is checked
/// independently and only when configured.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainBounds {
    pub west: Option<f64>,
    pub east: Option<f64>,
    pub south: Option<f64>,
    pub north: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    // === BEHAVIOR SELECTION ===
    /// Active orientation mode
    pub orientation: OrientationMode,

    /// Restrict settlement to the habitat polygons; seafloor and coastline
    /// contact then clamp/revert instead of deactivating
    pub settlement_in_habitat: bool,

    /// Enable ontogenetic vertical migration (age-banded target depths)
    pub ovm: bool,

    // === AGE THRESHOLDS (seconds) ===
    /// Minimum age at which larvae can settle on habitat, seabed or shoreline
    pub min_settlement_age_seconds: f64,

    /// Age at which orientation behavior switches on
    pub beginning_orientation_seconds: f64,

    /// Maximum pelagic age; older particles are retired as `died`
    pub max_age_seconds: f64,

    // === ORIENTATION PARAMETERS ===
    /// Maximum habitat detection distance, kilometers.
    /// Required (> 0) for direct and continuous modes.
    pub max_orient_distance_km: f64,

    /// Cardinal heading in degrees East (0.0 = due east).
    /// Required for cardinal and continuous-cardinal modes.
    pub cardinal_heading_deg: Option<f64>,

    /// Concentration of the von Mises heading perturbation.
    /// Higher = tighter headings. The legacy model hard-coded 5.0.
    pub orientation_kappa: f64,

    // === SWIMMING SPEED (cm/s) ===
    /// Swimming speed at hatching
    pub hatch_swimming_speed_cm_s: f64,

    /// Swimming speed at settlement stage; must be >= hatch speed
    pub settle_swimming_speed_cm_s: f64,

    // === VERTICAL BEHAVIOR ===
    /// Constant vertical migration rate, m/s; required when `ovm` is set
    pub vertical_migration_speed_m_s: Option<f64>,

    /// Depth floor, meters negative down; deeper particles are clamped to it
    pub maximum_depth_m: Option<f64>,

    /// Life-stage transitions (seconds) and the target depth per stage
    pub pre_flexion_seconds: f64,
    pub flexion_seconds: f64,
    pub post_flexion_seconds: f64,
    pub depth_early_stage_m: f64,
    pub depth_pre_flexion_m: f64,
    pub depth_flexion_m: f64,
    pub depth_post_flexion_m: f64,

    // === SCHEDULING ===
    /// Duration of one timestep, seconds
    pub timestep_seconds: f64,

    /// Optional validity domain; particles outside are retired as `outside`
    pub domain: Option<DomainBounds>,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            orientation: OrientationMode::None,
            settlement_in_habitat: false,
            ovm: false,
            min_settlement_age_seconds: 0.0,
            beginning_orientation_seconds: 0.0,
            max_age_seconds: 30.0 * 86_400.0,
            max_orient_distance_km: 0.0,
            cardinal_heading_deg: None,
            orientation_kappa: 5.0,
            hatch_swimming_speed_cm_s: 0.0,
            settle_swimming_speed_cm_s: 0.0,
            vertical_migration_speed_m_s: None,
            maximum_depth_m: None,
            pre_flexion_seconds: 0.0,
            flexion_seconds: 0.0,
            post_flexion_seconds: 0.0,
            depth_early_stage_m: 0.0,
            depth_pre_flexion_m: 0.0,
            depth_flexion_m: 0.0,
            depth_post_flexion_m: 0.0,
            timestep_seconds: 3600.0,
            domain: None,
        }
    }
}

impl DriftConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Validate internal consistency. Fatal: a run must not start with an
    /// invalid configuration, and the message names the offending option.
    pub fn validate(&self) -> Result<()> {
        if self.timestep_seconds <= 0.0 {
            return Err(DriftError::option(
                "timestep_seconds",
                format!("must be positive, got {}", self.timestep_seconds),
            ));
        }

        if self.orientation != OrientationMode::None {
            // Age-dependent swim speed takes ln(max_age); the formula is
            // singular at max_age <= 1.
            if self.max_age_seconds <= 1.0 {
                return Err(DriftError::option(
                    "max_age_seconds",
                    format!(
                        "must be > 1 when an orientation mode is active, got {}",
                        self.max_age_seconds
                    ),
                ));
            }
            if self.settle_swimming_speed_cm_s < self.hatch_swimming_speed_cm_s {
                return Err(DriftError::option(
                    "settle_swimming_speed_cm_s",
                    format!(
                        "must be >= hatch_swimming_speed_cm_s ({} < {})",
                        self.settle_swimming_speed_cm_s, self.hatch_swimming_speed_cm_s
                    ),
                ));
            }
            if self.orientation_kappa <= 0.0 {
                return Err(DriftError::option(
                    "orientation_kappa",
                    format!("must be positive, got {}", self.orientation_kappa),
                ));
            }
        }

        if self.orientation.requires_habitat() && self.max_orient_distance_km <= 0.0 {
            return Err(DriftError::option(
                "max_orient_distance_km",
                "must be positive for direct/continuous orientation",
            ));
        }

        if self.orientation.requires_heading() {
            match self.cardinal_heading_deg {
                None => {
                    return Err(DriftError::option(
                        "cardinal_heading_deg",
                        "required for cardinal/continuous-cardinal orientation",
                    ))
                }
                Some(h) if !(-180.0..=180.0).contains(&h) => {
                    return Err(DriftError::option(
                        "cardinal_heading_deg",
                        format!("must be within [-180, 180] degrees East, got {h}"),
                    ))
                }
                Some(_) => {}
            }
        }

        if self.ovm {
            match self.vertical_migration_speed_m_s {
                None => {
                    return Err(DriftError::option(
                        "vertical_migration_speed_m_s",
                        "required when ontogenetic vertical migration is enabled",
                    ))
                }
                Some(v) if v < 0.0 => {
                    return Err(DriftError::option(
                        "vertical_migration_speed_m_s",
                        format!("must be non-negative, got {v}"),
                    ))
                }
                Some(_) => {}
            }
        }

        if let Some(d) = self.maximum_depth_m {
            if d >= 0.0 {
                return Err(DriftError::option(
                    "maximum_depth_m",
                    format!("must be negative (meters below surface), got {d}"),
                ));
            }
        }

        if let Some(b) = &self.domain {
            if let (Some(w), Some(e)) = (b.west, b.east) {
                if w >= e {
                    return Err(DriftError::option(
                        "domain",
                        format!("west bound {w} must be < east bound {e}"),
                    ));
                }
            }
            if let (Some(s), Some(n)) = (b.south, b.north) {
                if s >= n {
                    return Err(DriftError::option(
                        "domain",
                        format!("south bound {s} must be < north bound {n}"),
                    ));
                }
            }
        }

        Ok(())
    }
}
