//! Spherical geometry for equirectangular panoramas.
//!
//! This module converts between panorama pixels, spherical angles and 3D directions,
//! and represents straight 3D lines seen from the panorama centre as great-circle arcs.
//!
//! Angles follow the layout convention: azimuth `u = atan2(x, y)` so that `+y` is the
//! panorama centre column, and elevation grows towards `+z`. Pixel rows grow downwards,
//! so a positive `z` lands in the upper half of the image.
//!
//! Sub-projections are selected with a [`PlaneId`]. The plane decides which coordinate
//! axis plays the role of "up" when a great circle is reduced to a 2D azimuth sweep.
//! Every function taking a [`PlaneId`] uses the same axis permutation from
//! [`PlaneId::axes`].

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::projection::{Projection, Resolution};

pub mod great_circle;
pub mod transform;

pub use great_circle::{
    compute_elevation, compute_elevations, line_from_two_points, lines_from_point_pairs,
    rasterize_segment, rasterize_segment_with, GreatCircleSegment, SegmentRaster,
};
pub use transform::{
    angles_to_direction, angles_to_directions, azimuth_to_column, column_to_azimuth,
    connect_floor_points, corner_to_angles, direction_to_angles, direction_to_panorama,
    directions_to_angles, directions_to_panorama, elevation_to_row, panorama_to_direction,
    row_to_elevation,
};

/// Floor applied to the horizontal norm before dividing by it.
pub const HORIZONTAL_NORM_FLOOR: f64 = 1e-6;
/// Offset added to denominators of plane normals and plane solves.
pub const PLANE_EPSILON: f64 = 1e-9;

/// Selects the sub-projection used for a great circle.
///
/// The discriminant matches the 1-based plane index used in layout tooling.
/// `Xy` keeps the canonical axes, `Yz` and `Zx` rotate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneId {
    Xy = 1,
    Yz = 2,
    Zx = 3,
}

impl PlaneId {
    /// All planes in tie-breaking order.
    pub const ALL: [PlaneId; 3] = [PlaneId::Xy, PlaneId::Yz, PlaneId::Zx];

    /// Builds a plane from its 1-based index.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(PlaneId::Xy),
            2 => Some(PlaneId::Yz),
            3 => Some(PlaneId::Zx),
            _ => None,
        }
    }

    /// The 1-based plane index.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Axis permutation `(ID1, ID2, ID3)`.
    ///
    /// `ID1` carries the sine of the azimuth, `ID2` the cosine and `ID3` the elevation.
    pub fn axes(self) -> [usize; 3] {
        let offset = (self.index() - 1) as usize;
        [offset % 3, (offset + 1) % 3, (offset + 2) % 3]
    }

    /// Reorders `v` into this plane's local axes.
    pub fn permute(self, v: &Vector3<f64>) -> Vector3<f64> {
        let [id1, id2, id3] = self.axes();
        Vector3::new(v[id1], v[id2], v[id3])
    }

    /// Inverse of [`PlaneId::permute`].
    pub fn unpermute(self, local: &Vector3<f64>) -> Vector3<f64> {
        let [id1, id2, id3] = self.axes();
        let mut v = Vector3::zeros();
        v[id1] = local[0];
        v[id2] = local[1];
        v[id3] = local[2];
        v
    }

    /// The axis that is left out of the sub-projection plane.
    fn out_of_plane_axis(self) -> Vector3<f64> {
        match self {
            PlaneId::Xy => Vector3::z(),
            PlaneId::Yz => Vector3::x(),
            PlaneId::Zx => Vector3::y(),
        }
    }

    /// Picks the plane whose out-of-plane axis is most aligned with `normal`.
    ///
    /// Ties go to the earlier plane in XY, YZ, ZX order.
    pub fn dominant(normal: &Vector3<f64>) -> Self {
        let mut best = PlaneId::Xy;
        let mut best_area = f64::NEG_INFINITY;
        for plane in Self::ALL {
            let area = normal.dot(&plane.out_of_plane_axis()).abs();
            if area > best_area {
                best = plane;
                best_area = area;
            }
        }
        best
    }
}

/// The equirectangular panorama as a [`Projection`].
///
/// Points are directions from the panorama centre; pixels are `(col, row)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquirectangularProjection {
    pub resolution: Resolution,
}

impl EquirectangularProjection {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }
}

impl Default for EquirectangularProjection {
    fn default() -> Self {
        Self::new(Resolution::panorama_default())
    }
}

impl Projection for EquirectangularProjection {
    fn project(&self, point_3d: &Vector3<f64>) -> Vector2<f64> {
        direction_to_panorama(point_3d, &self.resolution)
    }

    fn unproject(&self, point_2d: &Vector2<f64>) -> Vector3<f64> {
        panorama_to_direction(point_2d.x, point_2d.y, &self.resolution, PlaneId::Xy)
    }

    fn get_resolution(&self) -> Resolution {
        self.resolution
    }

    fn get_model_name(&self) -> &'static str {
        "equirectangular"
    }
}
