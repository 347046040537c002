//! Apex Panorama Library
//!
//! Geometry for equirectangular panoramas of indoor scenes:
//! - Conversions between panorama pixels, spherical angles and 3D directions
//! - Great-circle rasterization of straight room-layout edges onto a panorama
//! - A pinhole camera for projecting points and oriented boxes into perspective views
//! - Bicubic resampling of flat wall, floor and ceiling textures out of a panorama
//!
//! The equirectangular mapping and the pinhole camera share the [`Projection`] trait.

pub mod camera;
pub mod config;
pub mod overlay;
pub mod projection;
pub mod sphere;
pub mod texture;

// Re-export commonly used types
pub use camera::{
    bounding_rect_2d, oriented_box_corners, parse_camera_info, project_points_to_image,
    BoundingRect, CameraError, CameraPose, Intrinsics, OrientedBox, PinholeCamera,
};
pub use config::{ConfigError, PanoramaConfig};
pub use overlay::{draw_boundary, draw_boundary_from_corners, draw_boundary_with, RasterConfig};
pub use projection::{Projection, Resolution};
pub use sphere::{
    direction_to_panorama, line_from_two_points, panorama_to_direction, rasterize_segment,
    EquirectangularProjection, GreatCircleSegment, PlaneId, SegmentRaster,
};
pub use texture::{resample_patch, room_textures, RoomTextures};
