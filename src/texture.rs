//! Flat texture patches resampled out of an equirectangular panorama.
//!
//! A patch is a rectangle in 3D (a wall between two floor corners, or an axis-aligned
//! floor/ceiling rectangle). Each output pixel maps to a point on that rectangle, the point
//! is projected into the panorama and the panorama is sampled with a bicubic kernel.

use image::{ImageBuffer, Pixel, Primitive};
use log::{debug, warn};
use nalgebra::Vector3;
use num_traits::{Bounded, NumCast, ToPrimitive};
use rayon::prelude::*;

use crate::projection::Resolution;
use crate::sphere::direction_to_panorama;

/// Keys cubic convolution parameter, matching OpenCV's `INTER_CUBIC`.
pub const BICUBIC_A: f64 = -0.75;

/// Default edge length of a texture patch in pixels.
pub const DEFAULT_TEXTURE_RESOLUTION: u32 = 512;

type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Textures of a whole room.
#[derive(Clone)]
pub struct RoomTextures<P: Pixel> {
    /// One texture per wall, wall `i` spanning floor corners `i` and `i + 1` (wrapping).
    pub walls: Vec<Image<P>>,
    pub floor: Image<P>,
    pub ceiling: Image<P>,
}

/// Resamples a `resolution x resolution` patch between two corners.
///
/// With `is_wall` the patch is vertical: columns run from `corner_i` to `corner_j` and rows
/// run from the floor (`z = 0`) up to `plane_height`. Otherwise the patch is horizontal at
/// `plane_height`: columns follow the x range and rows the y range of the two corners.
/// All coordinates are world coordinates; `camera` is the panorama centre.
///
/// Horizontal sampling wraps around the panorama seam and vertical sampling clamps to the
/// top and bottom rows. Integer channels are rounded and saturated.
pub fn resample_patch<P>(
    image: &Image<P>,
    corner_i: &Vector3<f64>,
    corner_j: &Vector3<f64>,
    plane_height: f64,
    camera: &Vector3<f64>,
    resolution: u32,
    is_wall: bool,
) -> Image<P>
where
    P: Pixel + Send + Sync,
    P::Subpixel: Send + Sync,
{
    let mut output: Image<P> = ImageBuffer::new(resolution, resolution);
    if resolution == 0 {
        return output;
    }

    let (src_width, src_height) = image.dimensions();
    if src_width == 0 || src_height == 0 {
        warn!("Empty panorama; returning a blank {resolution}x{resolution} texture");
        return output;
    }

    let panorama = Resolution::new(src_width, src_height);
    let ci = corner_i - camera;
    let cj = corner_j - camera;
    let n = resolution as usize;
    let channels = P::CHANNEL_COUNT as usize;
    let source: &[P::Subpixel] = image.as_raw();

    debug!(
        "Resampling {} patch {}x{} from {}x{} panorama",
        if is_wall { "wall" } else { "floor" },
        resolution,
        resolution,
        src_width,
        src_height
    );

    let samples: &mut [P::Subpixel] = &mut output;
    samples
        .par_chunks_mut(n * channels)
        .enumerate()
        .for_each(|(r, row)| {
            let mut accum = vec![0.0; channels];
            for c in 0..n {
                let point = if is_wall {
                    Vector3::new(
                        lerp(ci.x, cj.x, c, n),
                        lerp(ci.y, cj.y, c, n),
                        lerp(-camera.z, plane_height - camera.z, r, n),
                    )
                } else {
                    Vector3::new(
                        lerp(ci.x, cj.x, c, n),
                        lerp(ci.y, cj.y, r, n),
                        plane_height - camera.z,
                    )
                };

                let pixel = direction_to_panorama(&point, &panorama);
                if !sample_bicubic(source, src_width, src_height, channels, pixel.x, pixel.y, &mut accum) {
                    continue;
                }
                for (k, value) in accum.iter().enumerate() {
                    row[c * channels + k] = cast_subpixel(*value);
                }
            }
        });

    output
}

/// Resamples every wall plus the floor and ceiling of a room.
///
/// `floor_polygon` lists the floor corners in order; walls join consecutive corners and
/// wrap back to the first. Floor and ceiling cover the polygon's XY bounding box.
pub fn room_textures<P>(
    image: &Image<P>,
    floor_polygon: &[Vector3<f64>],
    ceiling_height: f64,
    camera: &Vector3<f64>,
    resolution: u32,
) -> RoomTextures<P>
where
    P: Pixel + Send + Sync,
    P::Subpixel: Send + Sync,
{
    let count = floor_polygon.len();
    let walls = (0..count)
        .map(|i| {
            let corner_i = &floor_polygon[i];
            let corner_j = &floor_polygon[(i + 1) % count];
            resample_patch(image, corner_i, corner_j, ceiling_height, camera, resolution, true)
        })
        .collect();

    if count == 0 {
        warn!("Empty floor polygon; floor and ceiling textures collapse to a point");
    }
    let (corner_min, corner_max) = floor_polygon.iter().fold(
        (
            floor_polygon.first().copied().unwrap_or_else(Vector3::zeros),
            floor_polygon.first().copied().unwrap_or_else(Vector3::zeros),
        ),
        |(lo, hi), p| (lo.inf(p), hi.sup(p)),
    );

    RoomTextures {
        walls,
        floor: resample_patch(image, &corner_min, &corner_max, 0.0, camera, resolution, false),
        ceiling: resample_patch(
            image,
            &corner_min,
            &corner_max,
            ceiling_height,
            camera,
            resolution,
            false,
        ),
    }
}

/// Sample `k` of `n` evenly spaced values from `a` to `b` inclusive.
fn lerp(a: f64, b: f64, k: usize, n: usize) -> f64 {
    if n <= 1 {
        a
    } else {
        a + (b - a) * k as f64 / (n - 1) as f64
    }
}

/// Keys cubic convolution weight.
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((BICUBIC_A + 2.0) * t - (BICUBIC_A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((BICUBIC_A * t - 5.0 * BICUBIC_A) * t + 8.0 * BICUBIC_A) * t - 4.0 * BICUBIC_A
    } else {
        0.0
    }
}

/// Samples the 4x4 neighbourhood around `(x, y)` into `out`, one value per channel.
///
/// Columns wrap and rows clamp. Returns `false` for non-finite coordinates.
fn sample_bicubic<S: ToPrimitive>(
    source: &[S],
    width: u32,
    height: u32,
    channels: usize,
    x: f64,
    y: f64,
    out: &mut [f64],
) -> bool {
    if !x.is_finite() || !y.is_finite() {
        return false;
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let wx = [cubic_weight(fx + 1.0), cubic_weight(fx), cubic_weight(1.0 - fx), cubic_weight(2.0 - fx)];
    let wy = [cubic_weight(fy + 1.0), cubic_weight(fy), cubic_weight(1.0 - fy), cubic_weight(2.0 - fy)];

    let w = width as i64;
    let h = height as i64;
    let (x0, y0) = (x0 as i64, y0 as i64);

    out.iter_mut().for_each(|v| *v = 0.0);
    for (j, weight_y) in wy.iter().enumerate() {
        let sy = (y0 - 1 + j as i64).clamp(0, h - 1) as usize;
        for (i, weight_x) in wx.iter().enumerate() {
            let sx = (x0 - 1 + i as i64).rem_euclid(w) as usize;
            let base = (sy * width as usize + sx) * channels;
            let weight = weight_x * weight_y;
            for (k, value) in out.iter_mut().enumerate() {
                *value += weight * source[base + k].to_f64().unwrap_or(0.0);
            }
        }
    }
    true
}

/// Converts a filtered value back to the subpixel type, rounding and saturating integers.
fn cast_subpixel<S: Primitive>(value: f64) -> S {
    let is_integer = S::DEFAULT_MAX_VALUE.to_f64().unwrap_or(1.0) > 1.0;
    let value = if is_integer { value.round() } else { value };
    let lo = <S as Bounded>::min_value().to_f64().unwrap_or(f64::MIN);
    let hi = <S as Bounded>::max_value().to_f64().unwrap_or(f64::MAX);
    NumCast::from(value.clamp(lo, hi)).unwrap_or(S::DEFAULT_MIN_VALUE)
}
