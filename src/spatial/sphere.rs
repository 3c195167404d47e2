//! Great-circle geometry on a spherical Earth
//!
//! Angles follow the math convention used by the orientation equations:
//! 0 = due east, pi/2 = due north, measured counterclockwise.

/// Mean Earth radius used for habitat distances, kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Initial bearing (radians, math convention) of the great-circle path from
/// point 1 to point 2. Total over all inputs; coincident points yield an
/// arbitrary finite angle rather than an error.
pub fn bearing(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let rlat1 = lat1.to_radians();
    let rlat2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let x = rlat2.cos() * dlon.sin();
    let y = rlat1.cos() * rlat2.sin() - rlat1.sin() * rlat2.cos() * dlon.cos();
    y.atan2(x)
}

/// Great-circle distance between two geographic points, kilometers
/// (haversine central angle times [`EARTH_RADIUS_KM`]).
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    haversine_km_rad(
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    )
}

/// Haversine distance with inputs already in radians. The habitat index
/// stores centroids in radians, so the per-particle query converts the
/// query point once and uses this directly.
pub fn haversine_km_rad(rlon1: f64, rlat1: f64, rlon2: f64, rlat2: f64) -> f64 {
    let d = ((rlat2 - rlat1) / 2.0).sin().powi(2)
        + rlat1.cos() * rlat2.cos() * ((rlon2 - rlon1) / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * d.sqrt().asin()
}
