use crate::types::{NodeId, direction_of};
use glam::DVec3;

/// A temporary buffer that accumulates attractor pull per branch node.
///
/// For each `NodeId`, this buffer stores:
///
/// - The sum of all offsets from the node to its influencing attractors.
/// - The number of attractors that contributed.
///
/// Only tips ever receive contributions, but the buffer is indexed by
/// `NodeId` so lookups are direct.
#[derive(Debug, Default)]
pub struct InfluenceBuffer {
    /// Accumulated offsets for each node.
    offset: Vec<DVec3>,
    /// Number of contributions for each node.
    count: Vec<u32>,
}

impl InfluenceBuffer {
    /// Creates a new [`InfluenceBuffer`] with the given length.
    ///
    /// ### Parameters
    /// - `len` - Number of nodes this buffer can store influences for.
    pub fn with_len(len: usize) -> Self {
        Self {
            offset: vec![DVec3::ZERO; len],
            count: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.count.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_empty()
    }

    /// Resizes the buffer to `len` entries and clears every entry.
    ///
    /// ### Parameters
    /// - `len` - Desired length of the internal buffers.
    pub fn ensure_len(&mut self, len: usize) {
        if self.offset.len() != len {
            self.offset.resize(len, DVec3::ZERO);
            self.count.resize(len, 0);
        }
        self.clear();
    }

    /// Clears all accumulated influences, keeping the length.
    pub fn clear(&mut self) {
        self.offset.fill(DVec3::ZERO);
        self.count.fill(0);
    }

    /// Adds one attractor's offset (`attractor - node`) for the given node.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds for the internal arrays.
    #[inline]
    pub fn add(&mut self, id: NodeId, offset: DVec3) {
        self.offset[id] += offset;
        self.count[id] += 1;
    }

    /// Number of attractors recorded for `id` (0 when out of range).
    #[inline]
    pub fn count(&self, id: NodeId) -> u32 {
        self.count.get(id).copied().unwrap_or(0)
    }

    /// Returns `true` if the given node has received any influences.
    #[inline]
    pub fn is_influenced(&self, id: NodeId) -> bool {
        self.count(id) > 0
    }

    /// Returns the unit pull direction for a node.
    ///
    /// This is the normalized average offset from the node toward its
    /// attractors. Nodes that were never influenced, were added after the
    /// buffer was sized, or whose pulls cancel out yield `None`.
    ///
    /// ### Parameters
    /// - `id` - Node ID whose pull should be queried.
    ///
    /// ### Returns
    /// `Some(unit_direction)` or `None` when there is no usable pull.
    pub fn pull(&self, id: NodeId) -> Option<DVec3> {
        let c = self.count(id);
        if c == 0 {
            return None;
        }
        direction_of(self.offset[id] / f64::from(c))
    }

    /// Returns an iterator over all node indices that have been influenced.
    pub fn influenced_indices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.count
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| if c > 0 { Some(i) } else { None })
    }
}
