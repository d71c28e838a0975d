//! Geometric utility functions for distance calculations on the toroidal plane.

use geo::{Intersects, Rect};
use ndarray::Array1;

/// Returns -1, 0 or 1 depending on the sign of `value` (zero maps to zero).
pub fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else if value > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Shortest separation between two coordinates on a wrapping axis of length `extent`.
pub fn toroidal_delta(a: f64, b: f64, extent: f64) -> f64 {
    let d = (b - a).abs() % extent;
    d.min(extent - d)
}

/// Distance between two points, taking the wrap-around path on each axis when shorter.
pub fn toroidal_distance(a: &Array1<f64>, b: &Array1<f64>, width: f64, height: f64) -> f64 {
    let dx = toroidal_delta(a[0], b[0], width);
    let dy = toroidal_delta(a[1], b[1], height);
    (dx * dx + dy * dy).sqrt()
}

/// Plain Euclidean distance between two points.
pub fn euclidean_distance(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    (a - b).mapv(|x| x.powi(2)).sum().sqrt()
}

/// Wraps a coordinate into `[0, extent)`.
pub fn wrap_coordinate(value: f64, extent: f64) -> f64 {
    if (0.0..extent).contains(&value) {
        return value;
    }
    let wrapped = value.rem_euclid(extent);
    // rem_euclid of a tiny negative value rounds up to `extent`
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// Wraps a position vector around the world boundaries (toroidal topology).
pub fn wrap_around_mut(v: &mut Array1<f64>, width: f64, height: f64) {
    v[0] = wrap_coordinate(v[0], width);
    v[1] = wrap_coordinate(v[1], height);
}

/// Rotates a 2D vector counter-clockwise by `degrees`.
pub fn rotate_degrees(v: &Array1<f64>, degrees: f64) -> Array1<f64> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Array1::from_vec(vec![v[0] * cos - v[1] * sin, v[0] * sin + v[1] * cos])
}

/// Unsigned angle in degrees between two vectors, in `[0, 180]`.
///
/// A zero-length vector has no heading, so the angle is reported as 0.
pub fn angle_between_degrees(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let norms = a.dot(a).sqrt() * b.dot(b).sqrt();
    if norms == 0.0 {
        return 0.0;
    }
    (a.dot(b) / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Axis-aligned square of side `side` centred on `center`.
pub fn collision_rect(center: &Array1<f64>, side: f64) -> Rect<f64> {
    let half = side / 2.0;
    Rect::new(
        (center[0] - half, center[1] - half),
        (center[0] + half, center[1] + half),
    )
}

/// Checks whether two squares centred on the given points overlap.
pub fn squares_collide(a: &Array1<f64>, side_a: f64, b: &Array1<f64>, side_b: f64) -> bool {
    collision_rect(a, side_a).intersects(&collision_rect(b, side_b))
}
