//! Shared projection interface and image size type.
//!
//! Both the equirectangular panorama mapping and the pinhole camera turn 3D points into
//! 2D pixel coordinates. This module holds the trait they share so callers can treat
//! either one uniformly, plus the [`Resolution`] type used by every component.

use nalgebra::{Matrix2xX, Matrix3xX, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Default panorama width in pixels.
pub const DEFAULT_PANORAMA_WIDTH: u32 = 1024;
/// Default panorama height in pixels.
pub const DEFAULT_PANORAMA_HEIGHT: u32 = 512;

/// Represents the resolution of an image.
///
/// This struct holds the width and height of the image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The width of the image in pixels.
    pub width: u32,
    /// The height of the image in pixels.
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The 1024x512 panorama size used by the layout annotations.
    pub fn panorama_default() -> Self {
        Self::new(DEFAULT_PANORAMA_WIDTH, DEFAULT_PANORAMA_HEIGHT)
    }

    /// Number of samples needed to cover the longest image side once.
    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::panorama_default()
    }
}

/// Defines the common interface of the projections in this crate.
///
/// Implementations map a 3D point in their own reference frame to a 2D pixel and back.
/// None of them fail: degenerate inputs produce clamped or non-finite values, which the
/// individual implementations document.
pub trait Projection {
    /// Projects a 3D point to 2D pixel coordinates.
    fn project(&self, point_3d: &Vector3<f64>) -> Vector2<f64>;

    /// Unprojects a 2D pixel to a unit-length 3D ray.
    fn unproject(&self, point_2d: &Vector2<f64>) -> Vector3<f64>;

    /// Returns the image resolution this projection maps into.
    fn get_resolution(&self) -> Resolution;

    /// Returns a short identifier for the projection model.
    fn get_model_name(&self) -> &'static str;

    /// Projects every column of `points_3d`.
    fn project_points(&self, points_3d: &Matrix3xX<f64>) -> Matrix2xX<f64> {
        let mut points_2d = Matrix2xX::zeros(points_3d.ncols());
        for (idx, point) in points_3d.column_iter().enumerate() {
            let projected = self.project(&point.into_owned());
            points_2d.set_column(idx, &projected);
        }
        points_2d
    }
}
