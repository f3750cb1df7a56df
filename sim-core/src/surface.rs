//! Collision and adhesion surfaces that growing tips can cling to.
//!
//! The simulator only talks to geometry through [`Surface`], so any host
//! representation (brute-force triangles, a BVH, analytic shapes) can be
//! plugged in.

use crate::types::Point3;
use glam::DVec3;
use std::fmt;

/// Result of a successful [`Surface::ray_cast`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: Point3,
    /// Unit normal at `point`, facing the ray origin's side.
    pub normal: DVec3,
    /// Distance from the ray origin to `point`.
    pub distance: f64,
}

/// Geometry queried during tip advancement.
pub trait Surface: fmt::Debug {
    /// Closest surface point within `max_distance` of `point`.
    fn nearest_point(&self, point: Point3, max_distance: f64) -> Option<Point3>;

    /// First hit along `origin + t * direction` for `t` in `[0, max_distance]`.
    ///
    /// `direction` is unit length.
    fn ray_cast(&self, origin: Point3, direction: DVec3, max_distance: f64) -> Option<RayHit>;
}

/// Empty space: nothing to adhere to or collide with.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSurface;

impl Surface for NoSurface {
    fn nearest_point(&self, _point: Point3, _max_distance: f64) -> Option<Point3> {
        None
    }

    fn ray_cast(&self, _origin: Point3, _direction: DVec3, _max_distance: f64) -> Option<RayHit> {
        None
    }
}

/// An infinite horizontal plane at `z = height`, solid on both sides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundPlane {
    pub height: f64,
}

impl GroundPlane {
    pub fn new(height: f64) -> Self {
        Self { height }
    }
}

impl Surface for GroundPlane {
    fn nearest_point(&self, point: Point3, max_distance: f64) -> Option<Point3> {
        ((point.z - self.height).abs() <= max_distance)
            .then(|| DVec3::new(point.x, point.y, self.height))
    }

    fn ray_cast(&self, origin: Point3, direction: DVec3, max_distance: f64) -> Option<RayHit> {
        let normal = if origin.z >= self.height {
            DVec3::Z
        } else {
            DVec3::NEG_Z
        };
        // Rays leaving the plane, or running parallel to it, never hit.
        if direction.dot(normal) > -f64::EPSILON {
            return None;
        }
        let t = (self.height - origin.z) / direction.z;
        if t > max_distance {
            return None;
        }
        Some(RayHit {
            point: origin + direction * t,
            normal,
            distance: t,
        })
    }
}
