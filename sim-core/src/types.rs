use glam::DVec3;

/// Identifier for a branch node in a [`crate::tree::Tree`].
///
/// This is an index into `Tree::nodes`, and is only meaningful within
/// the lifetime of a given `Tree` instance.
pub type NodeId = usize;

/// Identifier for a root (one growing branch) in a [`crate::tree::Tree`].
pub type RootId = usize;

/// Identifier for an entry in a [`crate::kdtree::KdTree`].
pub type IndexId = usize;

/// A position in growth space.
pub type Point3 = DVec3;

/// Magnitude below which a vector is treated as having no direction.
pub const DIRECTION_EPSILON: f64 = 1e-3;

/// Normalizes `v`, or returns `None` when it is too short to carry a direction.
#[inline]
pub fn direction_of(v: DVec3) -> Option<DVec3> {
    let len = v.length();
    if len.is_finite() && len > DIRECTION_EPSILON {
        Some(v / len)
    } else {
        None
    }
}
