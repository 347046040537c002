//! Oriented 3D bounding boxes.
//!
//! A box is a row-major basis (one axis per row), the half extents along each axis and a
//! centroid. Corners are enumerated as sign combinations of the scaled axes:
//!
//! | idx   | 0   | 1   | 2   | 3   | 4   | 5   | 6   | 7   |
//! |-------|-----|-----|-----|-----|-----|-----|-----|-----|
//! | signs | -++ | +++ | +-+ | --+ | -+- | ++- | +-- | --- |
//!
//! Corners `0..4` form the face on the positive third axis and `4..8` the opposite face,
//! with corner `i` facing corner `i + 4`.

use std::cmp::Ordering;

use nalgebra::{Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Corner index pairs of the 12 box edges: both face loops, then the connecting edges.
pub const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

const CORNER_SIGNS: [[f64; 3]; 8] = [
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, -1.0],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    /// Box axes, one per row.
    pub basis: Matrix3<f64>,
    /// Half extent along each axis. Signs are ignored.
    pub coeffs: Vector3<f64>,
    pub centroid: Vector3<f64>,
}

impl OrientedBox {
    pub fn new(basis: Matrix3<f64>, coeffs: Vector3<f64>, centroid: Vector3<f64>) -> Self {
        Self {
            basis,
            coeffs,
            centroid,
        }
    }

    /// Reorders and flips the axes into canonical form.
    ///
    /// Axes are ordered by descending `|x|` component: a stable ascending sort, reversed,
    /// after which slots 1 and 2 are swapped unless slot 2 already holds the original third
    /// axis. The first two axes are then passed through [`flip_towards_viewer`].
    pub fn canonicalize(&self) -> Self {
        let mut index = [0usize, 1, 2];
        index.sort_by(|&a, &b| {
            self.basis[(a, 0)]
                .abs()
                .partial_cmp(&self.basis[(b, 0)].abs())
                .unwrap_or(Ordering::Equal)
        });
        index.reverse();
        if index[2] != 2 {
            index.swap(1, 2);
        }

        let mut basis = Matrix3::zeros();
        let mut coeffs = Vector3::zeros();
        for (slot, &axis) in index.iter().enumerate() {
            basis.set_row(slot, &self.basis.row(axis));
            coeffs[slot] = self.coeffs[axis];
        }

        Self {
            basis: flip_towards_viewer(&basis, &self.centroid),
            coeffs,
            centroid: self.centroid,
        }
    }

    /// The eight corners in the fixed enumeration order.
    pub fn corners(&self, canonicalize: bool) -> [Vector3<f64>; 8] {
        oriented_box_corners(&self.basis, &self.coeffs, &self.centroid, canonicalize)
    }

    /// XY polygon of the positive-third-axis face, corners `0, 1, 2, 3`.
    pub fn footprint(&self) -> [Vector2<f64>; 4] {
        let corners = self.corners(false);
        [0, 1, 2, 3].map(|i| corners[i].xy())
    }
}

/// Negates each of the first two basis rows whose dot product with the normalized centroid
/// direction is positive. The third row is never flipped.
///
/// A zero centroid normalizes to NaN and flips nothing.
pub fn flip_towards_viewer(basis: &Matrix3<f64>, centroid: &Vector3<f64>) -> Matrix3<f64> {
    let direction = centroid / centroid.norm();
    let mut flipped = *basis;
    for row in 0..2 {
        let axis = basis.row(row).transpose();
        if direction.dot(&axis) > 0.0 {
            flipped.set_row(row, &(-basis.row(row)));
        }
    }
    flipped
}

/// Computes the eight box corners, optionally canonicalizing the box first.
///
/// Coefficients always enter as absolute values.
pub fn oriented_box_corners(
    basis: &Matrix3<f64>,
    coeffs: &Vector3<f64>,
    centroid: &Vector3<f64>,
    canonicalize: bool,
) -> [Vector3<f64>; 8] {
    let oriented_box = OrientedBox::new(*basis, *coeffs, *centroid);
    let oriented_box = if canonicalize {
        oriented_box.canonicalize()
    } else {
        oriented_box
    };

    let axes: [Vector3<f64>; 3] = [0, 1, 2].map(|i| {
        oriented_box.basis.row(i).transpose() * oriented_box.coeffs[i].abs()
    });

    CORNER_SIGNS.map(|signs| {
        axes[0] * signs[0] + axes[1] * signs[1] + axes[2] * signs[2] + oriented_box.centroid
    })
}
