//! Great-circle representation of straight 3D lines seen from the panorama centre.
//!
//! A straight segment between two 3D points, viewed from the origin, traces an arc of the
//! great circle cut by the plane through the origin and both points. The arc is stored as
//! the plane normal plus an azimuth interval in the sub-projection that keeps the arc away
//! from its degenerate axis. [`SegmentRaster`] samples that interval back into panorama
//! pixels.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::iter::FusedIterator;

use nalgebra::{Matrix3xX, Vector3};
use serde::{Deserialize, Serialize};

use super::transform::{angles_to_direction, direction_to_angles};
use super::{PlaneId, PLANE_EPSILON};

/// A great-circle arc between two directions.
///
/// `u_start` and `u_end` are azimuths in the sub-projection of `plane`, offset by `π` and
/// divided by `2π` so they lie in `[0, 1]`. The stored interval always describes the minor
/// arc: when `u_end < u_start` the arc runs from `u_start` up through `1` and wraps to
/// `u_end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreatCircleSegment {
    /// Unit normal of the plane through the origin and both endpoints.
    pub normal: Vector3<f64>,
    /// Sub-projection the azimuth interval is expressed in.
    pub plane: PlaneId,
    /// Start of the azimuth interval as a fraction of a full turn.
    pub u_start: f64,
    /// End of the azimuth interval as a fraction of a full turn.
    pub u_end: f64,
}

impl GreatCircleSegment {
    /// Whether the azimuth sweep crosses the `±π` seam of the sub-projection.
    pub fn wraps(&self) -> bool {
        self.u_end < self.u_start
    }

    /// Length of the swept azimuth interval as a fraction of a full turn.
    pub fn arc_fraction(&self) -> f64 {
        if self.wraps() {
            self.u_end + 1.0 - self.u_start
        } else {
            self.u_end - self.u_start
        }
    }

    /// Elevation of the arc at sub-projection azimuth `u`.
    pub fn elevation_at(&self, u: f64) -> f64 {
        compute_elevation(&self.normal, u, self.plane)
    }
}

/// Builds the great-circle segment joining directions `p1` and `p2`.
///
/// Identical or antipodal endpoints give a near-zero cross product; the `1e-9` guard keeps
/// the normal finite and the resulting arc degenerate rather than failing.
pub fn line_from_two_points(p1: &Vector3<f64>, p2: &Vector3<f64>) -> GreatCircleSegment {
    let cross = p1.cross(p2);
    let normal = cross / (cross.norm() + PLANE_EPSILON);
    let plane = PlaneId::dominant(&normal);

    let u1 = direction_to_angles(p1, plane).x + PI;
    let u2 = direction_to_angles(p2, plane).x + PI;
    let (u_min, u_max) = (u1.min(u2), u1.max(u2));
    let (u_start, u_end) = if u_max - u_min > PI {
        (u_max, u_min)
    } else {
        (u_min, u_max)
    };

    GreatCircleSegment {
        normal,
        plane,
        u_start: u_start / TAU,
        u_end: u_end / TAU,
    }
}

/// Batched [`line_from_two_points`] over paired columns.
///
/// Extra columns in the longer matrix are ignored.
pub fn lines_from_point_pairs(starts: &Matrix3xX<f64>, ends: &Matrix3xX<f64>) -> Vec<GreatCircleSegment> {
    starts
        .column_iter()
        .zip(ends.column_iter())
        .map(|(p1, p2)| line_from_two_points(&p1.into_owned(), &p2.into_owned()))
        .collect()
}

/// Solves the plane equation for the elevation at sub-projection azimuth `u`.
///
/// `normal` is permuted into the axes of `plane` first, so the same normal works for any
/// sub-projection.
pub fn compute_elevation(normal: &Vector3<f64>, u: f64, plane: PlaneId) -> f64 {
    let n = plane.permute(normal);
    let (sin_u, cos_u) = u.sin_cos();
    (-(n[0] * sin_u + n[1] * cos_u) / (n[2] + PLANE_EPSILON)).atan()
}

/// [`compute_elevation`] over a vector of azimuth samples.
pub fn compute_elevations(normal: &Vector3<f64>, us: &[f64], plane: PlaneId) -> Vec<f64> {
    us.iter().map(|&u| compute_elevation(normal, u, plane)).collect()
}

/// Samples a segment into panorama pixels using `max(width, height)` samples.
pub fn rasterize_segment(segment: &GreatCircleSegment, width: u32, height: u32) -> SegmentRaster {
    rasterize_segment_with(segment, width, height, width.max(height) as usize)
}

/// Samples a segment into panorama pixels using an explicit sample count.
pub fn rasterize_segment_with(
    segment: &GreatCircleSegment,
    width: u32,
    height: u32,
    samples: usize,
) -> SegmentRaster {
    let start = segment.u_start * TAU;
    let mut stop = segment.u_end * TAU;
    let wraps = stop < start;
    if wraps {
        stop += TAU;
    }

    SegmentRaster {
        normal: segment.normal,
        plane: segment.plane,
        start,
        stop,
        wraps,
        samples,
        index: 0,
        width: width as f64,
        height: height as f64,
    }
}

/// Lazy sequence of `(row, col)` pixels along a great-circle arc.
///
/// The sequence has exactly the requested number of samples and is consumed once; build a
/// new one with [`rasterize_segment`] to iterate again. Consecutive samples may repeat a
/// pixel. Non-finite samples clamp to the image border.
#[derive(Debug, Clone)]
pub struct SegmentRaster {
    normal: Vector3<f64>,
    plane: PlaneId,
    start: f64,
    stop: f64,
    wraps: bool,
    samples: usize,
    index: usize,
    width: f64,
    height: f64,
}

impl SegmentRaster {
    /// Azimuth sweep value (in `[0, 2π)` after wrapping) for sample `i`.
    fn sweep(&self, i: usize) -> f64 {
        let x = if self.samples == 1 {
            self.start
        } else if i + 1 == self.samples {
            self.stop
        } else {
            let step = (self.stop - self.start) / (self.samples - 1) as f64;
            self.start + step * i as f64
        };
        if self.wraps {
            x.rem_euclid(TAU)
        } else {
            x
        }
    }

    fn pixel(&self, i: usize) -> (usize, usize) {
        let u = self.sweep(i) - PI;
        let v = compute_elevation(&self.normal, u, self.plane);
        let direction = angles_to_direction(u, v, self.plane);
        let uv = direction_to_angles(&direction, PlaneId::Xy);

        let col = (((uv.x + PI) / TAU * self.width).floor() + 1.0).min(self.width) - 1.0;
        let row = (((FRAC_PI_2 - uv.y) / PI * self.height).floor() + 1.0).min(self.height) - 1.0;
        (row.max(0.0) as usize, col.max(0.0) as usize)
    }
}

impl Iterator for SegmentRaster {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.samples {
            return None;
        }
        let pixel = self.pixel(self.index);
        self.index += 1;
        Some(pixel)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.samples.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SegmentRaster {}

impl FusedIterator for SegmentRaster {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Resolution;
    use crate::sphere::direction_to_panorama;
    use approx::assert_relative_eq;

    #[test]
    fn test_equator_segment() {
        let p1 = Vector3::new(0.0, 1.0, 0.0);
        let p2 = Vector3::new(1.0, 0.0, 0.0);
        let segment = line_from_two_points(&p1, &p2);

        assert_eq!(segment.plane, PlaneId::Xy);
        assert_relative_eq!(segment.normal.z, -1.0, epsilon = 1e-8);
        assert_relative_eq!(segment.u_start, 0.5, epsilon = 1e-12);
        assert_relative_eq!(segment.u_end, 0.75, epsilon = 1e-12);
        assert!(!segment.wraps());
    }

    #[test]
    fn test_equator_raster() {
        let segment = line_from_two_points(&Vector3::new(0.0, 1.0, 0.0), &Vector3::x());
        let raster = rasterize_segment(&segment, 1024, 512);
        assert_eq!(raster.len(), 1024);

        let pixels: Vec<(usize, usize)> = raster.collect();
        assert_eq!(pixels[0], (256, 512));
        assert!(pixels.iter().all(|&(row, col)| row == 256 && (512..=768).contains(&col)));
        assert!(pixels[pixels.len() - 1].1 >= 767);
    }

    #[test]
    fn test_seam_crossing_segment() {
        let p1 = Vector3::new(-0.1, -1.0, 0.0);
        let p2 = Vector3::new(0.1, -1.0, 0.0);
        let segment = line_from_two_points(&p1, &p2);

        assert!(segment.wraps());
        assert!(segment.arc_fraction() < 0.05);

        for (_, col) in rasterize_segment(&segment, 1024, 512) {
            assert!(col < 20 || col > 1003, "column {col} is far from the seam");
        }
    }

    #[test]
    fn test_vertical_segment_uses_rotated_plane() {
        // A wall edge straight ahead: the great circle is vertical, so XY would degenerate.
        let p1 = Vector3::new(0.0, 1.0, 0.5);
        let p2 = Vector3::new(0.0, 1.0, -0.5);
        let segment = line_from_two_points(&p1, &p2);
        assert_eq!(segment.plane, PlaneId::Yz);

        let resolution = Resolution::panorama_default();
        let top = direction_to_panorama(&p1, &resolution);
        let bottom = direction_to_panorama(&p2, &resolution);
        for (row, col) in rasterize_segment(&segment, 1024, 512) {
            assert!((511..=512).contains(&col));
            assert!(row as f64 >= top.y.floor() - 1.0 && row as f64 <= bottom.y.ceil() + 1.0);
        }
    }

    #[test]
    fn test_elevation_matches_endpoints() {
        let p1 = Vector3::new(0.4, 0.8, -0.3);
        let p2 = Vector3::new(-0.5, 0.6, -0.3);
        let segment = line_from_two_points(&p1, &p2);
        for p in [p1, p2] {
            let uv = direction_to_angles(&p, segment.plane);
            assert_relative_eq!(segment.elevation_at(uv.x), uv.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_compute_elevations_vector() {
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let vs = compute_elevations(&normal, &[0.0, 1.0, -2.0], PlaneId::Xy);
        assert_eq!(vs.len(), 3);
        assert!(vs.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_single_sample_raster() {
        let segment = line_from_two_points(&Vector3::new(0.0, 1.0, 0.0), &Vector3::x());
        let pixels: Vec<_> = rasterize_segment_with(&segment, 1024, 512, 1).collect();
        assert_eq!(pixels, vec![(256, 512)]);
        assert_eq!(rasterize_segment_with(&segment, 1024, 512, 0).count(), 0);
    }

    #[test]
    fn test_degenerate_identical_points() {
        let p = Vector3::new(0.3, 0.9, 0.1);
        let segment = line_from_two_points(&p, &p);
        assert!(segment.normal.iter().all(|c| c.is_finite()));
        assert_relative_eq!(segment.arc_fraction(), 0.0, epsilon = 1e-12);
        assert_eq!(rasterize_segment(&segment, 64, 32).len(), 64);
    }

    #[test]
    fn test_batched_lines() {
        let starts = Matrix3xX::from_columns(&[Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 1.0, 0.5)]);
        let ends = Matrix3xX::from_columns(&[Vector3::x(), Vector3::new(0.0, 1.0, -0.5)]);
        let lines = lines_from_point_pairs(&starts, &ends);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].plane, PlaneId::Xy);
        assert_eq!(lines[1].plane, PlaneId::Yz);
    }
}
