// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance-based canonicalization of heights, coordinates and directions.
//!
//! The [`ToleranceContext`] maps raw values onto canonical representatives so
//! that values which are "almost equal" compare exactly equal downstream. The
//! first value seen in a neighbourhood becomes its representative; later
//! values within epsilon of it are snapped onto it. A value within epsilon of
//! two different representatives cannot be resolved without corrupting
//! connectivity, so it is reported as [`Error::NonTransitive`].
//!
//! The relation is deliberately not transitive: `a ~ b` and `b ~ c` does not
//! merge `a` and `c` if `c` arrived first as its own representative.

use nalgebra::{Point2, Vector3};
use serde::{Deserialize, Serialize};
use space_boundaries_geometry::PlaneFrame;

use crate::error::{Error, Result};

/// Canonical direction identity. Two entities share an orientation iff their
/// orientations compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Orientation(u32);

impl Orientation {
    /// Position of this orientation in creation order.
    pub fn index(&self) -> u32 {
        self.0
    }

    pub(crate) fn from_index(index: u32) -> Self {
        Self(index)
    }
}

/// Sorted, pairwise more-than-epsilon-apart representatives of one quantity.
#[derive(Debug, Clone, Default)]
struct ScalarClusters {
    representatives: Vec<f64>,
}

impl ScalarClusters {
    fn request(&mut self, value: f64, epsilon: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(Error::NonFiniteValue(value));
        }

        let idx = self.representatives.partition_point(|r| *r < value);
        let below = idx
            .checked_sub(1)
            .map(|i| self.representatives[i])
            .filter(|r| value - r <= epsilon);
        let above = self
            .representatives
            .get(idx)
            .copied()
            .filter(|r| r - value <= epsilon);

        match (below, above) {
            (Some(lower), Some(upper)) if lower != upper => Err(Error::NonTransitive {
                value,
                lower,
                upper,
            }),
            (Some(r), _) | (_, Some(r)) => Ok(r),
            (None, None) => {
                self.representatives.insert(idx, value);
                Ok(value)
            }
        }
    }

    fn len(&self) -> usize {
        self.representatives.len()
    }
}

/// Per-orientation state: the representative direction, its frame, and the
/// clusters for heights and in-plane coordinates.
#[derive(Debug, Clone)]
struct OrientationSlot {
    direction: Vector3<f64>,
    frame: PlaneFrame,
    heights: ScalarClusters,
    u: ScalarClusters,
    v: ScalarClusters,
}

/// Canonicalization state for one computation.
#[derive(Debug, Clone)]
pub struct ToleranceContext {
    epsilon: f64,
    values: ScalarClusters,
    orientations: Vec<OrientationSlot>,
}

impl ToleranceContext {
    /// Creates a context with the given epsilon.
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            values: ScalarClusters::default(),
            orientations: Vec::new(),
        }
    }

    /// The epsilon this context merges within.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Canonicalizes a free-standing scalar.
    pub fn request(&mut self, value: f64) -> Result<f64> {
        self.values.request(value, self.epsilon)
    }

    /// Canonicalizes a direction.
    ///
    /// Returns the matching orientation and `true` if `direction` points the
    /// same way as the orientation's representative, `false` if it points the
    /// opposite way. A direction that matches no orientation founds a new one
    /// (with itself as representative, so the sense is `true`).
    pub fn request_orientation(&mut self, direction: &Vector3<f64>) -> Result<(Orientation, bool)> {
        if !direction.iter().all(|c| c.is_finite()) {
            return Err(Error::DegenerateDirection);
        }
        let unit = direction
            .try_normalize(1e-12)
            .ok_or(Error::DegenerateDirection)?;

        let mut found: Option<(usize, bool)> = None;
        for (i, slot) in self.orientations.iter().enumerate() {
            let sense = if (unit - slot.direction).norm() <= self.epsilon {
                true
            } else if (unit + slot.direction).norm() <= self.epsilon {
                false
            } else {
                continue;
            };
            if let Some((first, _)) = found {
                return Err(Error::NonTransitiveOrientation {
                    direction: [unit.x, unit.y, unit.z],
                    first: first as u32,
                    second: i as u32,
                });
            }
            found = Some((i, sense));
        }

        if let Some((i, sense)) = found {
            return Ok((Orientation(i as u32), sense));
        }

        let frame = PlaneFrame::new(&unit)?;
        self.orientations.push(OrientationSlot {
            direction: unit,
            frame,
            heights: ScalarClusters::default(),
            u: ScalarClusters::default(),
            v: ScalarClusters::default(),
        });
        Ok((Orientation((self.orientations.len() - 1) as u32), true))
    }

    /// Canonicalizes a height measured along `orientation`.
    pub fn request_height(&mut self, orientation: Orientation, height: f64) -> Result<f64> {
        let epsilon = self.epsilon;
        self.slot_mut(orientation)?.heights.request(height, epsilon)
    }

    /// Canonicalizes both coordinates of a point in `orientation`'s frame.
    pub fn request_point(&mut self, orientation: Orientation, point: &Point2<f64>) -> Result<Point2<f64>> {
        let epsilon = self.epsilon;
        let slot = self.slot_mut(orientation)?;
        let x = slot.u.request(point.x, epsilon)?;
        let y = slot.v.request(point.y, epsilon)?;
        Ok(Point2::new(x, y))
    }

    /// Representative unit direction of `orientation`, or `None` if the
    /// handle was not issued by this context.
    pub fn direction(&self, orientation: Orientation) -> Option<Vector3<f64>> {
        self.slot(orientation).map(|slot| slot.direction)
    }

    /// The 2D frame footprints of `orientation` are expressed in.
    pub fn frame(&self, orientation: Orientation) -> Option<&PlaneFrame> {
        self.slot(orientation).map(|slot| &slot.frame)
    }

    /// Number of distinct orientations seen so far.
    pub fn orientation_count(&self) -> usize {
        self.orientations.len()
    }

    /// Number of distinct heights registered for `orientation`.
    pub fn height_count(&self, orientation: Orientation) -> Option<usize> {
        self.slot(orientation).map(|slot| slot.heights.len())
    }

    fn slot(&self, orientation: Orientation) -> Option<&OrientationSlot> {
        self.orientations.get(orientation.index() as usize)
    }

    fn slot_mut(&mut self, orientation: Orientation) -> Result<&mut OrientationSlot> {
        self.orientations
            .get_mut(orientation.index() as usize)
            .ok_or(Error::UnknownOrientation(orientation.0))
    }
}
