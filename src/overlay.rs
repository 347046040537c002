//! Layout boundary overlay on equirectangular panoramas.
//!
//! A room layout is a list of corners, interleaved ceiling/floor per wall edge. Every
//! straight layout edge becomes a great-circle arc on the panorama, which is rasterized and
//! stamped with a small cross stencil.

use image::{ImageBuffer, Pixel};
use log::{debug, warn};
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::projection::Resolution;
use crate::sphere::{
    angles_to_direction, corner_to_angles, line_from_two_points, rasterize_segment_with, PlaneId,
};

/// Parameters of the boundary rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Samples per segment; `None` uses `max(width, height)`.
    pub samples_per_segment: Option<usize>,
    /// Half-length of the cross stencil. `1` paints the 5-point cross.
    pub stencil_radius: u32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            samples_per_segment: None,
            stencil_radius: 1,
        }
    }
}

impl RasterConfig {
    /// Effective sample count for an image of the given size.
    pub fn samples_for(&self, width: u32, height: u32) -> usize {
        self.samples_per_segment
            .unwrap_or_else(|| Resolution::new(width, height).max_side() as usize)
    }
}

/// Enumerates the layout edges for `n` interleaved corners.
///
/// Vertical wall edges `(2k, 2k + 1)` come first, followed by the ceiling and floor edges
/// `(i, (i + 2) mod n)`.
pub fn boundary_edges(n: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(n / 2 + n);
    edges.extend((0..n / 2).map(|k| (2 * k, 2 * k + 1)));
    edges.extend((0..n).map(|i| (i, (i + 2) % n)));
    edges
}

/// Draws the layout boundary with the default [`RasterConfig`].
///
/// The image is taken by value and returned with the boundary painted in `color`.
pub fn draw_boundary<P: Pixel>(
    corners: &[Vector3<f64>],
    image: ImageBuffer<P, Vec<P::Subpixel>>,
    color: P,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    draw_boundary_with(corners, image, color, &RasterConfig::default())
}

/// Draws the layout boundary of `corners` (3D directions from the panorama centre).
pub fn draw_boundary_with<P: Pixel>(
    corners: &[Vector3<f64>],
    mut image: ImageBuffer<P, Vec<P::Subpixel>>,
    color: P,
    config: &RasterConfig,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        debug!("Skipping boundary overlay on an empty image");
        return image;
    }
    if corners.len() % 2 == 1 {
        warn!(
            "Odd number of layout corners ({}); the last corner has no vertical edge",
            corners.len()
        );
    }

    let samples = config.samples_for(width, height);
    let edges = boundary_edges(corners.len());
    debug!(
        "Drawing {} boundary edges with {} samples each",
        edges.len(),
        samples
    );

    for (i, j) in edges {
        let segment = line_from_two_points(&corners[i], &corners[j]);
        for (row, col) in rasterize_segment_with(&segment, width, height, samples) {
            stamp_cross(&mut image, row, col, config.stencil_radius, color);
        }
    }
    image
}

/// Draws a layout given as panorama corner pixels `(col, row)`.
///
/// Corners are measured against the image's own size.
pub fn draw_boundary_from_corners<P: Pixel>(
    corners: &[Vector2<f64>],
    image: ImageBuffer<P, Vec<P::Subpixel>>,
    color: P,
    config: &RasterConfig,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (width, height) = image.dimensions();
    let resolution = Resolution::new(width, height);
    let directions: Vec<Vector3<f64>> = corners
        .iter()
        .map(|corner| {
            let uv = corner_to_angles(corner.x, corner.y, &resolution);
            angles_to_direction(uv.x, uv.y, PlaneId::Xy)
        })
        .collect();
    draw_boundary_with(&directions, image, color, config)
}

/// Paints a cross of half-length `radius` centred on `(row, col)`, clamped to the image.
fn stamp_cross<P: Pixel>(
    image: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    row: usize,
    col: usize,
    radius: u32,
    color: P,
) {
    let (width, height) = image.dimensions();
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;
    let (x, y) = (col as i64, row as i64);
    let r = radius as i64;

    for d in -r..=r {
        let px = (x + d).clamp(0, max_x) as u32;
        let py = y.clamp(0, max_y) as u32;
        image.put_pixel(px, py, color);

        let px = x.clamp(0, max_x) as u32;
        let py = (y + d).clamp(0, max_y) as u32;
        image.put_pixel(px, py, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    fn painted(image: &RgbImage) -> Vec<(u32, u32)> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == BLUE)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_boundary_edges_four_corners() {
        assert_eq!(
            boundary_edges(4),
            vec![(0, 1), (2, 3), (0, 2), (1, 3), (2, 0), (3, 1)]
        );
        assert!(boundary_edges(0).is_empty());
    }

    #[test]
    fn test_boundary_edges_odd_count() {
        let edges = boundary_edges(5);
        assert_eq!(&edges[..2], &[(0, 1), (2, 3)]);
        assert_eq!(edges.len(), 7);
    }

    #[test]
    fn test_raster_config_samples() {
        assert_eq!(RasterConfig::default().samples_for(1024, 512), 1024);
        let config = RasterConfig {
            samples_per_segment: Some(50),
            stencil_radius: 0,
        };
        assert_eq!(config.samples_for(1024, 512), 50);
    }

    #[test]
    fn test_vertical_edge_is_painted() {
        let corners = [Vector3::new(0.0, 1.0, 0.5), Vector3::new(0.0, 1.0, -0.5)];
        let image = draw_boundary(&corners, RgbImage::new(1024, 512), BLUE);
        let pixels = painted(&image);
        assert!(!pixels.is_empty());
        assert!(pixels.iter().all(|&(x, _)| (510..=513).contains(&x)));
        assert!(image.get_pixel(512, 256) == &BLUE || image.get_pixel(511, 256) == &BLUE);
    }

    #[test]
    fn test_stencil_clamps_at_border() {
        let mut image = RgbImage::new(8, 4);
        stamp_cross(&mut image, 0, 0, 1, BLUE);
        let pixels = painted(&image);
        assert_eq!(pixels.len(), 3);
        assert!(pixels.contains(&(0, 0)));
        assert!(pixels.contains(&(1, 0)));
        assert!(pixels.contains(&(0, 1)));

        let mut image = RgbImage::new(8, 4);
        stamp_cross(&mut image, 3, 7, 1, BLUE);
        let pixels = painted(&image);
        assert_eq!(pixels.len(), 3);
        assert!(pixels.contains(&(7, 3)));
        assert!(pixels.contains(&(6, 3)));
        assert!(pixels.contains(&(7, 2)));
    }

    #[test]
    fn test_stencil_radius_zero_paints_single_pixel() {
        let mut image = RgbImage::new(8, 8);
        stamp_cross(&mut image, 4, 4, 0, BLUE);
        assert_eq!(painted(&image), vec![(4, 4)]);
    }

    #[test]
    fn test_empty_image_is_returned_unchanged() {
        let corners = [Vector3::new(0.0, 1.0, 0.5), Vector3::new(0.0, 1.0, -0.5)];
        let image = draw_boundary(&corners, RgbImage::new(0, 0), BLUE);
        assert_eq!(image.dimensions(), (0, 0));
    }

    #[test]
    fn test_odd_corners_still_draw_horizontal_edges() {
        let corners = [
            Vector3::new(0.0, 1.0, 0.5),
            Vector3::new(0.0, 1.0, -0.5),
            Vector3::new(1.0, 0.0, 0.5),
        ];
        let image = draw_boundary(&corners, RgbImage::new(256, 128), BLUE);
        assert!(!painted(&image).is_empty());
    }

    #[test]
    fn test_draw_from_corner_pixels() {
        // A cuboid room, corners listed ceiling/floor per wall edge.
        let corners = [
            Vector2::new(128.0, 150.0),
            Vector2::new(128.0, 360.0),
            Vector2::new(384.0, 150.0),
            Vector2::new(384.0, 360.0),
            Vector2::new(640.0, 150.0),
            Vector2::new(640.0, 360.0),
            Vector2::new(896.0, 150.0),
            Vector2::new(896.0, 360.0),
        ];
        let image = draw_boundary_from_corners(
            &corners,
            RgbImage::new(1024, 512),
            BLUE,
            &RasterConfig::default(),
        );
        let pixels = painted(&image);
        assert!(pixels.iter().any(|&(x, y)| (126..=130).contains(&x) && (148..=152).contains(&y)));
        assert!(pixels.iter().any(|&(x, y)| (638..=642).contains(&x) && (358..=362).contains(&y)));
        // Nothing lands near the horizon away from the vertical edges.
        assert!(pixels.iter().all(|&(x, y)| y != 256 || [128, 384, 640, 896]
            .iter()
            .any(|&c| (x as i64 - c as i64).abs() <= 3)));
    }
}
