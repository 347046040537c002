//! Conversions between panorama pixels, spherical angles and 3D directions.
//!
//! Two elevation conventions meet here:
//!
//! * Pixel space. [`direction_to_panorama`], [`panorama_to_direction`],
//!   [`row_to_elevation`] and [`elevation_to_row`] use `v = -atan(z / |xy|)`, which is
//!   positive below the horizon, so `row = (v / π + 0.5) · H` grows downwards.
//! * Sub-projection space. [`angles_to_direction`] and [`direction_to_angles`] use
//!   `v = asin(z / |xyz|)`, positive above the horizon, in the axes of a [`PlaneId`].
//!
//! Batched variants take one point per column of a `Matrix3xX` / `Matrix2xX`.

use std::f64::consts::{PI, TAU};

use nalgebra::{Matrix2xX, Matrix3xX, Vector2, Vector3};

use super::{PlaneId, HORIZONTAL_NORM_FLOOR};
use crate::projection::Resolution;

/// Maps a direction to panorama pixel coordinates `(col, row)`.
///
/// Well defined for every non-zero direction. Straight up and straight down land on the
/// top and bottom rows with the azimuth taken from the horizontal components.
///
/// # Examples
///
/// ```rust
/// use apex_panorama::projection::Resolution;
/// use apex_panorama::sphere::direction_to_panorama;
/// use nalgebra::Vector3;
///
/// let pixel = direction_to_panorama(&Vector3::new(0.0, 1.0, 0.0), &Resolution::panorama_default());
/// assert_eq!((pixel.x, pixel.y), (512.0, 256.0));
/// ```
pub fn direction_to_panorama(direction: &Vector3<f64>, resolution: &Resolution) -> Vector2<f64> {
    let u = direction.x.atan2(direction.y);
    let horizontal = (direction.x * direction.x + direction.y * direction.y).sqrt();
    let v = -(direction.z / horizontal).atan();
    Vector2::new(
        (u / TAU + 0.5) * resolution.width as f64,
        (v / PI + 0.5) * resolution.height as f64,
    )
}

/// Batched [`direction_to_panorama`].
pub fn directions_to_panorama(directions: &Matrix3xX<f64>, resolution: &Resolution) -> Matrix2xX<f64> {
    let mut pixels = Matrix2xX::zeros(directions.ncols());
    for (idx, direction) in directions.column_iter().enumerate() {
        pixels.set_column(idx, &direction_to_panorama(&direction.into_owned(), resolution));
    }
    pixels
}

/// Maps a panorama pixel back to a unit direction.
///
/// With `PlaneId::Xy` this is the exact inverse of [`direction_to_panorama`]. Other planes
/// assign the same local components to rotated axes.
pub fn panorama_to_direction(col: f64, row: f64, resolution: &Resolution, plane: PlaneId) -> Vector3<f64> {
    let u = (col / resolution.width as f64 - 0.5) * TAU;
    let v = (row / resolution.height as f64 - 0.5) * PI;
    angles_to_direction(u, -v, plane)
}

/// Builds a unit direction from azimuth `u` and elevation `v` in the axes of `plane`.
pub fn angles_to_direction(u: f64, v: f64, plane: PlaneId) -> Vector3<f64> {
    let (sin_u, cos_u) = u.sin_cos();
    let (sin_v, cos_v) = v.sin_cos();
    plane.unpermute(&Vector3::new(cos_v * sin_u, cos_v * cos_u, sin_v))
}

/// Batched [`angles_to_direction`] with one plane per column.
///
/// `planes` should have one entry per column; missing entries fall back to `PlaneId::Xy`.
pub fn angles_to_directions(angles: &Matrix2xX<f64>, planes: &[PlaneId]) -> Matrix3xX<f64> {
    let mut directions = Matrix3xX::zeros(angles.ncols());
    for (idx, uv) in angles.column_iter().enumerate() {
        let plane = planes.get(idx).copied().unwrap_or(PlaneId::Xy);
        directions.set_column(idx, &angles_to_direction(uv[0], uv[1], plane));
    }
    directions
}

/// Computes `(u, v)` of a direction in the axes of `plane`.
///
/// The horizontal norm is floored at [`HORIZONTAL_NORM_FLOOR`]. When the forward axis
/// component is negative the azimuth is reflected through `±π` so it stays continuous
/// across the back of the sphere. An undefined azimuth (a zero direction, or one with no
/// horizontal extent) becomes `0`.
pub fn direction_to_angles(direction: &Vector3<f64>, plane: PlaneId) -> Vector2<f64> {
    let local = plane.permute(direction);
    let norm_xy = (local[0] * local[0] + local[1] * local[1])
        .sqrt()
        .max(HORIZONTAL_NORM_FLOOR);
    let norm_xyz = local.norm();

    let v = (local[2] / norm_xyz).asin();
    let mut u = (local[0] / norm_xy).asin();
    if local[1] < 0.0 {
        u = if u >= 0.0 { PI - u } else { -PI - u };
    }
    if u.is_nan() {
        u = 0.0;
    }
    Vector2::new(u, v)
}

/// Batched [`direction_to_angles`] with one plane per column.
///
/// `planes` should have one entry per column; missing entries fall back to `PlaneId::Xy`.
pub fn directions_to_angles(directions: &Matrix3xX<f64>, planes: &[PlaneId]) -> Matrix2xX<f64> {
    let mut angles = Matrix2xX::zeros(directions.ncols());
    for (idx, direction) in directions.column_iter().enumerate() {
        let plane = planes.get(idx).copied().unwrap_or(PlaneId::Xy);
        angles.set_column(idx, &direction_to_angles(&direction.into_owned(), plane));
    }
    angles
}

/// Azimuth at the centre of pixel column `x`.
pub fn column_to_azimuth(x: f64, width: f64) -> f64 {
    ((x + 0.5) / width - 0.5) * TAU
}

/// Pixel-space elevation at the centre of pixel row `y` (positive below the horizon).
pub fn row_to_elevation(y: f64, height: f64) -> f64 {
    ((y + 0.5) / height - 0.5) * PI
}

/// Inverse of [`column_to_azimuth`].
pub fn azimuth_to_column(u: f64, width: f64) -> f64 {
    (u / TAU + 0.5) * width - 0.5
}

/// Inverse of [`row_to_elevation`].
pub fn elevation_to_row(v: f64, height: f64) -> f64 {
    (v / PI + 0.5) * height - 0.5
}

/// Converts a layout corner pixel to sub-projection angles `(u, v)`.
///
/// Layout corner files measure against the 1-indexed image middle `(W/2 + 0.5, H/2 + 0.5)`
/// and report elevation positive upwards, ready for [`angles_to_direction`].
pub fn corner_to_angles(col: f64, row: f64, resolution: &Resolution) -> Vector2<f64> {
    let width = resolution.width as f64;
    let height = resolution.height as f64;
    let middle_x = width / 2.0 + 0.5;
    let middle_y = height / 2.0 + 0.5;
    Vector2::new(
        (col - middle_x) / width * TAU,
        -(row - middle_y) / height * PI,
    )
}

/// Traces the straight line between two panorama pixels lying on a horizontal plane.
///
/// `plane_distance` is the signed vertical distance from the camera to the plane,
/// positive downwards (a floor has a positive distance, a ceiling a negative one). Only
/// its sign matters for the traced path. One point is emitted per integer column between
/// the endpoints, going the short way round and wrapping across the seam when needed.
/// Each point is `(col, row)` in pixel-centre coordinates.
pub fn connect_floor_points(
    p1: &Vector2<f64>,
    p2: &Vector2<f64>,
    plane_distance: f64,
    resolution: &Resolution,
) -> Vec<Vector2<f64>> {
    let width = resolution.width as f64;
    let height = resolution.height as f64;

    let to_plane = |pixel: &Vector2<f64>| {
        let u = column_to_azimuth(pixel.x, width);
        let v = row_to_elevation(pixel.y, height);
        let range = plane_distance / v.tan();
        Vector2::new(range * u.cos(), range * u.sin())
    };
    let q1 = to_plane(p1);
    let q2 = to_plane(p2);
    let along = q2 - q1;

    let (start, end) = if (p1.x - p2.x).abs() < width / 2.0 {
        (p1.x.min(p2.x).ceil(), p1.x.max(p2.x).floor())
    } else {
        (p1.x.max(p2.x).ceil(), (p1.x.min(p2.x) + width).floor())
    };
    if start.is_nan() || end.is_nan() || end < start {
        return Vec::new();
    }

    let count = (end - start) as usize + 1;
    let mut points = Vec::with_capacity(count);
    for step in 0..count {
        let col = (start + step as f64).rem_euclid(width);
        let (sin_u, cos_u) = column_to_azimuth(col, width).sin_cos();
        let t = (q1.y * cos_u - q1.x * sin_u) / (along.x * sin_u - along.y * cos_u);
        let range = (q1 + along * t).norm();
        let v = plane_distance.atan2(range);
        points.push(Vector2::new(col, elevation_to_row(v, height)));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pano() -> Resolution {
        Resolution::panorama_default()
    }

    #[test]
    fn test_forward_direction_hits_centre() {
        let pixel = direction_to_panorama(&Vector3::new(0.0, 1.0, 0.0), &pano());
        assert_relative_eq!(pixel.x, 512.0);
        assert_relative_eq!(pixel.y, 256.0);
    }

    #[test]
    fn test_quarter_turn_right() {
        let pixel = direction_to_panorama(&Vector3::new(1.0, 0.0, 0.0), &pano());
        assert_relative_eq!(pixel.x, 768.0, epsilon = 1e-9);
        assert_relative_eq!(pixel.y, 256.0, epsilon = 1e-9);
    }

    #[test]
    fn test_up_is_top_half() {
        let pixel = direction_to_panorama(&Vector3::new(0.0, 1.0, 1.0), &pano());
        assert_relative_eq!(pixel.y, 128.0, epsilon = 1e-9);
        let straight_up = direction_to_panorama(&Vector3::new(0.0, 0.0, 1.0), &pano());
        assert_relative_eq!(straight_up.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_panorama_to_direction_inverse() {
        let d = Vector3::new(0.3, -0.5, 0.2).normalize();
        let pixel = direction_to_panorama(&d, &pano());
        let back = panorama_to_direction(pixel.x, pixel.y, &pano(), PlaneId::Xy);
        assert_relative_eq!(back, d, epsilon = 1e-12);
    }

    #[test]
    fn test_angles_round_trip_each_plane() {
        let d = Vector3::new(-0.4, 0.7, 0.3).normalize();
        for plane in PlaneId::ALL {
            let uv = direction_to_angles(&d, plane);
            let back = angles_to_direction(uv.x, uv.y, plane);
            assert_relative_eq!(back, d, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_back_hemisphere_quadrants() {
        let left_back = direction_to_angles(&Vector3::new(-1.0, -1.0, 0.0), PlaneId::Xy);
        assert_relative_eq!(left_back.x, -3.0 * PI / 4.0, epsilon = 1e-12);
        let right_back = direction_to_angles(&Vector3::new(1.0, -1.0, 0.0), PlaneId::Xy);
        assert_relative_eq!(right_back.x, 3.0 * PI / 4.0, epsilon = 1e-12);
        let behind = direction_to_angles(&Vector3::new(0.0, -1.0, 0.0), PlaneId::Xy);
        assert_relative_eq!(behind.x, PI, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_directions() {
        let zero = direction_to_angles(&Vector3::zeros(), PlaneId::Xy);
        assert_eq!(zero.x, 0.0);

        let pole = direction_to_angles(&Vector3::new(0.0, 0.0, 2.0), PlaneId::Xy);
        assert_eq!(pole.x, 0.0);
        assert_relative_eq!(pole.y, PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_batched_matches_scalar() {
        let directions = Matrix3xX::from_columns(&[
            Vector3::new(0.2, 0.9, -0.1),
            Vector3::new(-0.6, -0.3, 0.5),
            Vector3::new(0.0, 0.1, -0.9),
        ]);
        let planes = [PlaneId::Xy, PlaneId::Yz, PlaneId::Zx];

        let angles = directions_to_angles(&directions, &planes);
        let pixels = directions_to_panorama(&directions, &pano());
        for idx in 0..directions.ncols() {
            let d = directions.column(idx).into_owned();
            assert_relative_eq!(angles.column(idx).into_owned(), direction_to_angles(&d, planes[idx]));
            assert_relative_eq!(pixels.column(idx).into_owned(), direction_to_panorama(&d, &pano()));
        }

        let back = angles_to_directions(&angles, &planes);
        for idx in 0..directions.ncols() {
            let d = directions.column(idx).normalize();
            assert_relative_eq!(back.column(idx).into_owned(), d, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_pixel_centre_helpers() {
        let u = column_to_azimuth(300.0, 1024.0);
        assert_relative_eq!(azimuth_to_column(u, 1024.0), 300.0, epsilon = 1e-9);
        let v = row_to_elevation(100.0, 512.0);
        assert_relative_eq!(elevation_to_row(v, 512.0), 100.0, epsilon = 1e-9);
        assert_relative_eq!(column_to_azimuth(511.5, 1024.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_corner_to_angles_middle() {
        let uv = corner_to_angles(512.5, 256.5, &pano());
        assert_relative_eq!(uv.x, 0.0);
        assert_relative_eq!(uv.y, 0.0);

        let upper = corner_to_angles(512.5, 128.5, &pano());
        assert_relative_eq!(upper.y, PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_connect_floor_points_endpoints() {
        let p1 = Vector2::new(100.0, 400.0);
        let p2 = Vector2::new(200.0, 380.0);
        let points = connect_floor_points(&p1, &p2, 1.6, &pano());

        assert_eq!(points.len(), 101);
        assert_relative_eq!(points[0].x, 100.0);
        assert_relative_eq!(points[0].y, 400.0, epsilon = 1e-6);
        assert_relative_eq!(points[100].x, 200.0);
        assert_relative_eq!(points[100].y, 380.0, epsilon = 1e-6);
        assert!(points.iter().all(|p| p.y > 256.0));
    }

    #[test]
    fn test_connect_floor_points_wraps_seam() {
        let p1 = Vector2::new(1000.0, 400.0);
        let p2 = Vector2::new(30.0, 400.0);
        let points = connect_floor_points(&p1, &p2, 1.6, &pano());

        assert_eq!(points.len(), 55);
        assert_relative_eq!(points[0].x, 1000.0);
        assert_relative_eq!(points[23].x, 1023.0);
        assert_relative_eq!(points[24].x, 0.0);
        assert_relative_eq!(points[54].x, 30.0);
    }
}
