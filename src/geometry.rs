//! Great-circle geometry primitives shared by the noise model.
//!
//! All distances are in feet to match track altitudes and the certification
//! reference distance; callers convert at the edges if they need meters.

/// Earth radius in feet (6371 km mean radius)
pub const EARTH_RADIUS_FT: f64 = 20_902_230.97;

/// Feet per nautical mile
pub const FEET_PER_NM: f64 = 6_076.12;

/// Calculate the horizontal distance between two points using the Haversine formula
/// Returns distance in feet
pub fn haversine_distance_ft(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_FT * c
}

/// Initial great-circle bearing from point 1 to point 2 in degrees (0-360)
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let delta_lon = (lon2 - lon1).to_radians();
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Minimal angular separation between two bearings in degrees (0-180)
pub fn angular_difference_deg(angle1: f64, angle2: f64) -> f64 {
    let diff = (angle1 - angle2).abs() % 360.0;
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Straight-line acoustic path length from aircraft to a ground observer in feet
pub fn slant_distance_ft(altitude_ft: f64, horizontal_ft: f64) -> f64 {
    (altitude_ft.powi(2) + horizontal_ft.powi(2)).sqrt()
}

/// Angular deviation between the aircraft's heading and the bearing to an
/// observer, clamped into 0-90 degrees. 0 means the observer is directly
/// ahead on the flight path; anything at or beyond abeam, including
/// observers behind the aircraft, is treated as the full 90.
pub fn lateral_angle_deg(
    observer_lat: f64,
    observer_lon: f64,
    aircraft_lat: f64,
    aircraft_lon: f64,
    heading: f64,
) -> f64 {
    let bearing_to_observer = bearing_deg(aircraft_lat, aircraft_lon, observer_lat, observer_lon);
    angular_difference_deg(bearing_to_observer, heading).min(90.0)
}

/// Great-circle destination point given a start, an initial bearing in degrees,
/// and a distance in feet. Returns (latitude, longitude).
pub fn offset_position(lat: f64, lon: f64, bearing: f64, distance_ft: f64) -> (f64, f64) {
    let angular = distance_ft / EARTH_RADIUS_FT;
    let bearing_rad = bearing.to_radians();
    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();

    let dest_lat = (lat_rad.sin() * angular.cos()
        + lat_rad.cos() * angular.sin() * bearing_rad.cos())
    .asin();
    let dest_lon = lon_rad
        + (bearing_rad.sin() * angular.sin() * lat_rad.cos())
            .atan2(angular.cos() - lat_rad.sin() * dest_lat.sin());

    (
        dest_lat.to_degrees(),
        // Normalize to -180..180
        (dest_lon.to_degrees() + 540.0) % 360.0 - 180.0,
    )
}
