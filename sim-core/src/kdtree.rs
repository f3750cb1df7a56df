//! Append-only 3-D k-d tree with logical deletion.
//!
//! Every entry keeps the bounding box of its subtree. Entries are never
//! removed; [`KdTree::disable`] drops the payload instead, so the entry stops
//! being a nearest-neighbor candidate while its geometry still bounds the
//! subtree for pruning. Boxes only ever grow, which keeps them valid lower
//! bounds no matter how inserts and disables interleave.

use crate::{aabb::Aabb, types::IndexId, types::Point3};

/// One entry of a [`KdTree`].
#[derive(Clone, Debug)]
pub struct IndexNode<T> {
    pub position: Point3,
    /// `None` once the entry has been disabled.
    pub payload: Option<T>,
    pub left: Option<IndexId>,
    pub right: Option<IndexId>,
    pub split_axis: usize,
    /// Bounds of `position` and every descendant's position.
    pub bounds: Aabb,
    pub depth: u32,
}

impl<T> IndexNode<T> {
    fn new(position: Point3, payload: T, split_axis: usize, depth: u32) -> Self {
        Self {
            position,
            payload: Some(payload),
            left: None,
            right: None,
            split_axis,
            bounds: Aabb::from_point(position),
            depth,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.payload.is_some()
    }
}

/// A 3-D point index answering nearest-neighbor queries.
///
/// Split axes rotate `x -> y -> z` with depth and there is no rebalancing, so
/// the shape depends only on insertion order. Entries live in an arena and
/// are addressed by [`IndexId`].
#[derive(Clone, Debug)]
pub struct KdTree<T> {
    nodes: Vec<IndexNode<T>>,
    height: u32,
    disabled: usize,
}

impl<T> Default for KdTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> KdTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            height: 0,
            disabled: 0,
        }
    }

    /// Total number of entries, disabled ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of entries that still carry a payload.
    pub fn active_len(&self) -> usize {
        self.nodes.len() - self.disabled
    }

    /// Number of levels in the tree (0 when empty).
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, id: IndexId) -> Option<&IndexNode<T>> {
        self.nodes.get(id)
    }

    /// Payload of an active entry.
    pub fn payload(&self, id: IndexId) -> Option<&T> {
        self.nodes.get(id).and_then(|n| n.payload.as_ref())
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (IndexId, &IndexNode<T>)> {
        self.nodes.iter().enumerate()
    }

    /// Inserts `position` and returns the id of the new entry.
    ///
    /// Descends from the root comparing on each entry's split axis: strictly
    /// less goes left, ties go right. Every entry on the path has its bounds
    /// extended to include `position` before the walk continues.
    pub fn insert(&mut self, position: Point3, payload: T) -> IndexId {
        let id = self.nodes.len();
        if self.nodes.is_empty() {
            self.nodes.push(IndexNode::new(position, payload, 0, 0));
            self.height = 1;
            return id;
        }

        let mut current = 0;
        loop {
            let node = &mut self.nodes[current];
            node.bounds.extend(position);

            let axis = node.split_axis;
            let go_left = position[axis] < node.position[axis];
            let slot = if go_left { node.left } else { node.right };

            match slot {
                Some(child) => current = child,
                None => {
                    let depth = node.depth + 1;
                    if go_left {
                        node.left = Some(id);
                    } else {
                        node.right = Some(id);
                    }
                    self.nodes
                        .push(IndexNode::new(position, payload, (axis + 1) % 3, depth));
                    self.height = self.height.max(depth + 1);
                    return id;
                }
            }
        }
    }

    /// Logically deletes an entry and returns its payload.
    ///
    /// Returns `None` for an unknown id or an entry that was already disabled.
    /// Tree shape and bounds are left untouched.
    pub fn disable(&mut self, id: IndexId) -> Option<T> {
        let payload = self.nodes.get_mut(id)?.payload.take();
        if payload.is_some() {
            self.disabled += 1;
        }
        payload
    }

    /// Finds the entry closest to `query`.
    ///
    /// With `skip_disabled`, disabled entries are not candidates, although
    /// their subtrees are still searched. Returns the entry id and its squared
    /// distance, or `None` when there is no candidate (an empty tree, or every
    /// entry disabled while skipping). On exact distance ties the entry found
    /// first wins.
    pub fn nearest(&self, query: Point3, skip_disabled: bool) -> Option<(IndexId, f64)> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best: Option<(IndexId, f64)> = None;
        // (entry, lower bound on its subtree distance or None for a near child)
        let mut stack: Vec<(IndexId, Option<f64>)> = Vec::with_capacity(self.height as usize * 2);
        stack.push((0, None));

        while let Some((id, bound)) = stack.pop() {
            let best_d2 = best.map_or(f64::INFINITY, |(_, d2)| d2);
            if let Some(bound) = bound
                && bound >= best_d2
            {
                continue;
            }

            let node = &self.nodes[id];
            if !skip_disabled || node.is_active() {
                let d2 = (node.position - query).length_squared();
                if d2 < best_d2 {
                    best = Some((id, d2));
                }
            }

            let axis = node.split_axis;
            let (near, far) = if query[axis] < node.position[axis] {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };

            // Far is pushed first so the near side is searched before it.
            if let Some(far) = far {
                let far_bound = self.nodes[far].bounds.distance_squared(query);
                stack.push((far, Some(far_bound)));
            }
            if let Some(near) = near {
                stack.push((near, None));
            }
        }

        best
    }
}
