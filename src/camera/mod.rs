//! Perspective camera model used to view panorama scenes through a regular image plane.
//!
//! The module turns an 11-scalar camera pose (position, look, up and field of view) into
//! a pinhole camera, projects 3D points and oriented boxes through it, and bounds the
//! projections with integer pixel rectangles.
//!
//! Submodules:
//! - `pose`: the [`CameraPose`] descriptor and its text/YAML loaders.
//! - `pinhole`: the [`PinholeCamera`] model and point projection.
//! - `oriented_box`: oriented 3D boxes and their canonical corner enumeration.
//!
//! It also contains a `yaml_io` submodule with the YAML helpers shared by the loaders.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

pub mod oriented_box;
pub mod pinhole;
pub mod pose;

pub use oriented_box::{flip_towards_viewer, oriented_box_corners, OrientedBox, BOX_EDGES};
pub use pinhole::{
    bounding_rect_2d, parse_camera_info, project_points_to_image, BoundingRect, PinholeCamera,
};
pub use pose::CameraPose;

/// Represents the intrinsic parameters of a camera.
///
/// These parameters define the internal geometry of the camera,
/// including focal length and principal point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// The focal length along the x-axis, in pixels.
    pub fx: f64,
    /// The focal length along the y-axis, in pixels.
    pub fy: f64,
    /// The x-coordinate of the principal point (optical center), in pixels.
    pub cx: f64,
    /// The y-coordinate of the principal point (optical center), in pixels.
    pub cy: f64,
}

impl Intrinsics {
    /// The 3x3 pinhole matrix `K`.
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }
}

/// Defines the possible errors that can occur during camera operations.
#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    /// The look or up vector of a pose has zero length.
    #[error("Invalid camera pose: {0}")]
    InvalidPose(String),
    /// One or more camera parameters are malformed.
    #[error("Invalid camera parameters: {0}")]
    InvalidParams(String),
    /// Error indicating a failure during YAML (de)serialization.
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
    /// Error indicating a failure during file input/output operations.
    #[error("IO Error: {0}")]
    IOError(String),
}

/// Implements the conversion from `std::io::Error` to `CameraError::IOError`.
impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::IOError(err.to_string())
    }
}

/// Implements the conversion from `yaml_rust::ScanError` to `CameraError::YamlError`.
impl From<yaml_rust::ScanError> for CameraError {
    fn from(err: yaml_rust::ScanError) -> Self {
        CameraError::YamlError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CameraError {
    fn from(err: serde_yaml::Error) -> Self {
        CameraError::YamlError(err.to_string())
    }
}

/// YAML helpers shared by the camera loaders.
pub mod yaml_io {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use yaml_rust::Yaml;

    /// Reads a float array of exactly `len` elements from `node[key]`.
    ///
    /// Integers are accepted and widened, so `[0, 1, 0]` parses like `[0.0, 1.0, 0.0]`.
    ///
    /// # Errors
    ///
    /// Returns `CameraError::InvalidParams` if the key is missing, is not an array, has the
    /// wrong length or holds a non-numeric entry.
    pub fn parse_f64_array(node: &Yaml, key: &str, len: usize) -> Result<Vec<f64>, CameraError> {
        let values = node[key].as_vec().ok_or_else(|| {
            CameraError::InvalidParams(format!("YAML missing '{key}' array"))
        })?;

        if values.len() != len {
            return Err(CameraError::InvalidParams(format!(
                "'{}' array must have {} elements, got {}",
                key,
                len,
                values.len()
            )));
        }

        values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                value
                    .as_f64()
                    .or_else(|| value.as_i64().map(|v| v as f64))
                    .ok_or_else(|| {
                        CameraError::InvalidParams(format!(
                            "Invalid '{key}' value at index {i}: not a number"
                        ))
                    })
            })
            .collect()
    }

    /// Writes a YAML string to `path`, creating the parent directory if needed.
    pub fn write_yaml_string(path: &str, yaml_string: &str) -> Result<(), CameraError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = fs::File::create(path)?;
        file.write_all(yaml_string.as_bytes())?;
        Ok(())
    }
}
