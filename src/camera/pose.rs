//! Camera pose descriptor.
//!
//! A pose is 11 scalars: position (3), look direction (3), up direction (3), then the
//! horizontal and vertical field of view in radians. Perspective renderings ship it as a
//! whitespace-separated `camera_pose.txt`; this crate additionally reads and writes a YAML
//! form:
//!
//! ```yaml
//! camera_pose:
//!   position: [x, y, z]
//!   look: [x, y, z]
//!   up: [x, y, z]
//!   fov: [xfov, yfov]
//! ```

use std::fs;

use log::info;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use yaml_rust::YamlLoader;

use super::{yaml_io, CameraError};

/// Number of scalars in a flat pose.
pub const POSE_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Camera centre in world coordinates.
    pub position: Vector3<f64>,
    /// Viewing direction. Need not be unit length.
    pub look: Vector3<f64>,
    /// Up direction. Need not be unit length.
    pub up: Vector3<f64>,
    /// Horizontal field-of-view parameter in radians.
    pub xfov: f64,
    /// Vertical field-of-view parameter in radians.
    pub yfov: f64,
}

impl CameraPose {
    /// Builds a pose from the flat 11-scalar layout.
    ///
    /// # Errors
    ///
    /// Returns `CameraError::InvalidParams` if `values` does not hold exactly 11 scalars.
    pub fn from_slice(values: &[f64]) -> Result<Self, CameraError> {
        if values.len() != POSE_LEN {
            return Err(CameraError::InvalidParams(format!(
                "Camera pose must have {} values, got {}",
                POSE_LEN,
                values.len()
            )));
        }

        Ok(Self {
            position: Vector3::new(values[0], values[1], values[2]),
            look: Vector3::new(values[3], values[4], values[5]),
            up: Vector3::new(values[6], values[7], values[8]),
            xfov: values[9],
            yfov: values[10],
        })
    }

    /// The flat 11-scalar layout.
    pub fn to_array(&self) -> [f64; POSE_LEN] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.look.x,
            self.look.y,
            self.look.z,
            self.up.x,
            self.up.y,
            self.up.z,
            self.xfov,
            self.yfov,
        ]
    }

    /// Parses whitespace-separated scalars, as found in `camera_pose.txt`.
    pub fn from_text(text: &str) -> Result<Self, CameraError> {
        let values = text
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|e| {
                    CameraError::InvalidParams(format!("Invalid pose value '{token}': {e}"))
                })
            })
            .collect::<Result<Vec<f64>, CameraError>>()?;
        Self::from_slice(&values)
    }

    /// Loads a pose from a whitespace-separated text file.
    pub fn load_from_txt(path: &str) -> Result<Self, CameraError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Loads a pose from the YAML form shown in the module docs.
    ///
    /// # Errors
    ///
    /// Returns `IOError` if the file cannot be read, `YamlError` if it is not valid YAML
    /// and `InvalidParams` if the `camera_pose` node or one of its arrays is missing or
    /// malformed.
    pub fn load_from_yaml(path: &str) -> Result<Self, CameraError> {
        let contents = fs::read_to_string(path)?;
        let docs = YamlLoader::load_from_str(&contents)?;

        if docs.is_empty() {
            return Err(CameraError::InvalidParams("Empty YAML document".to_string()));
        }

        let node = &docs[0]["camera_pose"];
        if node.is_badvalue() {
            return Err(CameraError::InvalidParams(
                "Missing 'camera_pose' node in YAML".to_string(),
            ));
        }

        let position = yaml_io::parse_f64_array(node, "position", 3)?;
        let look = yaml_io::parse_f64_array(node, "look", 3)?;
        let up = yaml_io::parse_f64_array(node, "up", 3)?;
        let fov = yaml_io::parse_f64_array(node, "fov", 2)?;

        let mut values = Vec::with_capacity(POSE_LEN);
        values.extend(position);
        values.extend(look);
        values.extend(up);
        values.extend(fov);
        Self::from_slice(&values)
    }

    /// Saves the pose in the YAML form shown in the module docs.
    pub fn save_to_yaml(&self, path: &str) -> Result<(), CameraError> {
        let vector = |v: &Vector3<f64>| serde_yaml::to_value(vec![v.x, v.y, v.z]);

        let yaml = serde_yaml::Value::Mapping(serde_yaml::Mapping::from_iter([(
            serde_yaml::Value::String("camera_pose".to_string()),
            serde_yaml::Value::Mapping(serde_yaml::Mapping::from_iter([
                (
                    serde_yaml::Value::String("position".to_string()),
                    vector(&self.position)?,
                ),
                (
                    serde_yaml::Value::String("look".to_string()),
                    vector(&self.look)?,
                ),
                (serde_yaml::Value::String("up".to_string()), vector(&self.up)?),
                (
                    serde_yaml::Value::String("fov".to_string()),
                    serde_yaml::to_value(vec![self.xfov, self.yfov])?,
                ),
            ])),
        )]));

        let yaml_string = serde_yaml::to_string(&yaml)?;
        yaml_io::write_yaml_string(path, &yaml_string)?;
        info!("Saved camera pose to {path}");
        Ok(())
    }
}
