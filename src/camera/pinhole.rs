//! Pinhole camera built from a [`CameraPose`].
//!
//! The rotation rows are the camera axes `U` (right), `V` (down) and `W` (look), and
//! projection flips the vertical axis so image rows grow downwards. Depth is taken as the
//! absolute distance along `W`, so points behind the camera mirror into the image instead
//! of being rejected.

use log::debug;
use nalgebra::{Matrix2xX, Matrix3, Matrix3xX, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use super::oriented_box::OrientedBox;
use super::pose::CameraPose;
use super::{CameraError, Intrinsics};
use crate::projection::{Projection, Resolution};

/// Integer pixel rectangle, 1-indexed and clamped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingRect {
    /// The rectangle covering a whole `width x height` image.
    ///
    /// A zero side is treated as one pixel so that `x1 <= x2` and `y1 <= y2` always hold.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x1: 1,
            y1: 1,
            x2: width.max(1),
            y2: height.max(1),
        }
    }
}

/// A pinhole camera with extrinsic rotation and translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinholeCamera {
    /// Rows `U`, `V`, `W` of the camera frame.
    pub rotation: Matrix3<f64>,
    /// Camera centre in world coordinates.
    pub translation: Vector3<f64>,
    pub intrinsics: Intrinsics,
    pub resolution: Resolution,
}

/// Builds a [`PinholeCamera`] from a pose and the image size.
///
/// The principal point is the image centre and the focal lengths are
/// `cx / tan(xfov)` and `cy / tan(yfov)`.
///
/// # Errors
///
/// Returns `CameraError::InvalidPose` if the look or up vector has zero length. No other
/// validation is done; a look parallel to up yields a degenerate rotation.
pub fn parse_camera_info(
    pose: &CameraPose,
    height: u32,
    width: u32,
) -> Result<PinholeCamera, CameraError> {
    let look = pose
        .look
        .try_normalize(f64::EPSILON)
        .ok_or_else(|| CameraError::InvalidPose("look vector has zero length".to_string()))?;
    let up = pose
        .up
        .try_normalize(f64::EPSILON)
        .ok_or_else(|| CameraError::InvalidPose("up vector has zero length".to_string()))?;

    let w = look;
    let u = w.cross(&up);
    let v = -w.cross(&u);
    let rotation = Matrix3::from_rows(&[u.transpose(), v.transpose(), w.transpose()]);

    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let intrinsics = Intrinsics {
        fx: cx / pose.xfov.tan(),
        fy: cy / pose.yfov.tan(),
        cx,
        cy,
    };
    debug!(
        "Pinhole camera {}x{}: fx={:.3} fy={:.3} cx={:.1} cy={:.1}",
        width, height, intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy
    );

    Ok(PinholeCamera {
        rotation,
        translation: pose.position,
        intrinsics,
        resolution: Resolution::new(width, height),
    })
}

/// Projects camera-centred points (one per column) through rotation `r` and matrix `k`.
///
/// Points on the camera plane (`Z = 0` after rotation) are not special-cased and give
/// infinite or NaN pixels.
pub fn project_points_to_image(
    points: &Matrix3xX<f64>,
    r: &Matrix3<f64>,
    k: &Matrix3<f64>,
) -> Matrix2xX<f64> {
    let rotated = r * points;
    let mut pixels = Matrix2xX::zeros(points.ncols());
    for (idx, p) in rotated.column_iter().enumerate() {
        let x = p[0];
        let y = -p[1];
        let z = p[2].abs();
        pixels[(0, idx)] = x * k[(0, 0)] / z + k[(0, 2)];
        pixels[(1, idx)] = y * k[(1, 1)] / z + k[(1, 2)];
    }
    pixels
}

/// Bounds projected points with an integer rectangle clamped into `[1, width] x [1, height]`.
///
/// NaN coordinates are ignored. Without any usable coordinate the full image is returned.
/// A zero `width` or `height` is treated as one pixel.
pub fn bounding_rect_2d(points: &Matrix2xX<f64>, width: u32, height: u32) -> BoundingRect {
    let width = width.max(1);
    let height = height.max(1);
    let w = width as f64;
    let h = height as f64;

    let bounds = |row: usize| {
        points
            .row(row)
            .iter()
            .filter(|value| !value.is_nan())
            .fold(None, |acc: Option<(f64, f64)>, &value| match acc {
                Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
                None => Some((value, value)),
            })
    };

    match (bounds(0), bounds(1)) {
        (Some((min_x, max_x)), Some((min_y, max_y))) => BoundingRect {
            x1: min_x.max(1.0).min(w) as u32,
            y1: min_y.max(1.0).min(h) as u32,
            x2: max_x.min(w).max(1.0) as u32,
            y2: max_y.min(h).max(1.0) as u32,
        },
        _ => BoundingRect::full(width, height),
    }
}

impl PinholeCamera {
    /// The 3x3 pinhole matrix.
    pub fn k_matrix(&self) -> Matrix3<f64> {
        self.intrinsics.to_matrix()
    }

    /// Projects world points by moving them into the camera-centred frame first.
    pub fn project_world_points(&self, points: &Matrix3xX<f64>) -> Matrix2xX<f64> {
        let mut centred = points.clone();
        for mut column in centred.column_iter_mut() {
            column -= self.translation;
        }
        project_points_to_image(&centred, &self.rotation, &self.k_matrix())
    }

    /// Projects the canonical corners of a camera-centred box and bounds them.
    ///
    /// The clamp uses the image size implied by the principal point, `2cx x 2cy`.
    pub fn box_bounding_rect(&self, oriented_box: &OrientedBox) -> BoundingRect {
        let corners = Matrix3xX::from_columns(&oriented_box.corners(true));
        let pixels = project_points_to_image(&corners, &self.rotation, &self.k_matrix());
        bounding_rect_2d(
            &pixels,
            (2.0 * self.intrinsics.cx) as u32,
            (2.0 * self.intrinsics.cy) as u32,
        )
    }
}

impl Projection for PinholeCamera {
    /// Projects a camera-centred point.
    fn project(&self, point_3d: &Vector3<f64>) -> Vector2<f64> {
        let p = self.rotation * point_3d;
        let z = p.z.abs();
        Vector2::new(
            p.x * self.intrinsics.fx / z + self.intrinsics.cx,
            -p.y * self.intrinsics.fy / z + self.intrinsics.cy,
        )
    }

    /// Unit ray in the camera-centred frame, assuming the point lies in front of the camera.
    fn unproject(&self, point_2d: &Vector2<f64>) -> Vector3<f64> {
        let x = (point_2d.x - self.intrinsics.cx) / self.intrinsics.fx;
        let y = -(point_2d.y - self.intrinsics.cy) / self.intrinsics.fy;
        (self.rotation.transpose() * Vector3::new(x, y, 1.0)).normalize()
    }

    fn get_resolution(&self) -> Resolution {
        self.resolution
    }

    fn get_model_name(&self) -> &'static str {
        "pinhole"
    }
}
