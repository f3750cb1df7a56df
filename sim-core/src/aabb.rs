use crate::types::Point3;

/// Axis-aligned bounding box in growth space.
///
/// `min[i] <= max[i]` holds on every axis as long as the box is only ever
/// built with [`Aabb::from_point`] and grown with [`Aabb::extend`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    /// A degenerate box containing exactly `p`.
    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Grows the box so that it contains `p`. Bounds never shrink.
    #[inline]
    pub fn extend(&mut self, p: Point3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn contains(&self, p: Point3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Squared distance from `p` to the closest point of the box.
    ///
    /// Zero when `p` is inside or on the boundary. This is a lower bound on
    /// the distance from `p` to anything the box contains.
    #[inline]
    pub fn distance_squared(&self, p: Point3) -> f64 {
        let closest = p.clamp(self.min, self.max);
        (p - closest).length_squared()
    }
}
