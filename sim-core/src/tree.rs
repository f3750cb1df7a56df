use crate::types::{IndexId, NodeId, Point3, RootId};
use glam::DVec3;

/// Length given to a fresh root's first node, so length ratios never divide
/// by zero.
pub const INITIAL_LENGTH: f64 = 1e-4;

/// Direction a fresh root starts growing in.
pub const DEFAULT_DIRECTION: DVec3 = DVec3::Z;

#[derive(Clone, Debug)]
pub struct BranchNode {
    pub position: Point3,
    /// Smoothed growth direction, unit length.
    pub primary_direction: DVec3,
    /// Distance back to the start of the owning root.
    pub cumulative_length: f64,
    /// Distance travelled since the last surface contact.
    pub floating_length: f64,
    /// Whether this node was placed on or near a surface.
    pub climbing: bool,
    pub parent: Option<NodeId>,
    /// Continuation of the same root.
    pub apex: Option<NodeId>,
    /// First node of a lateral root spawned here.
    pub shoot: Option<NodeId>,
    pub root: RootId,
    /// Tip-index entry while this node is an attraction target.
    pub(crate) index_entry: Option<IndexId>,
}

impl BranchNode {
    pub fn new_root(position: Point3, floating_length: f64, root: RootId) -> Self {
        Self {
            position,
            primary_direction: DEFAULT_DIRECTION,
            cumulative_length: INITIAL_LENGTH,
            floating_length,
            climbing: false,
            parent: None,
            apex: None,
            shoot: None,
            root,
            index_entry: None,
        }
    }
}

/// One independently growing branch.
#[derive(Clone, Debug)]
pub struct Root {
    /// Nodes in growth order; the last one is the tip.
    pub nodes: Vec<NodeId>,
    pub alive: bool,
    /// Number of branching events between this root and the seed root.
    pub generation: u32,
}

/// Arena of every branch node and the roots that own them.
///
/// Parent links point backwards only, so the graph is always a forest.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    pub nodes: Vec<BranchNode>,
    pub roots: Vec<Root>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new root at `position` and returns its id and first node.
    ///
    /// With `branch_of`, the new root is a lateral shoot of that node.
    pub fn add_root(
        &mut self,
        position: Point3,
        floating_length: f64,
        generation: u32,
        branch_of: Option<NodeId>,
    ) -> (RootId, NodeId) {
        let root_id = self.roots.len();
        let id = self.nodes.len();

        let mut node = BranchNode::new_root(position, floating_length, root_id);
        node.parent = branch_of;
        self.nodes.push(node);
        if let Some(p) = branch_of {
            self.nodes[p].shoot = Some(id);
        }

        self.roots.push(Root {
            nodes: vec![id],
            alive: true,
            generation,
        });
        (root_id, id)
    }

    /// Appends `node` to the end of `root`, linking it as the old tip's apex.
    pub fn push_apex(&mut self, root: RootId, mut node: BranchNode) -> NodeId {
        let id = self.nodes.len();
        let tip = self.tip(root);
        node.parent = Some(tip);
        node.root = root;
        self.nodes[tip].apex = Some(id);
        self.nodes.push(node);
        self.roots[root].nodes.push(id);
        id
    }

    pub fn tip(&self, root: RootId) -> NodeId {
        // Roots are created with one node and only ever grow.
        self.roots[root].nodes[self.roots[root].nodes.len() - 1]
    }

    pub fn alive_roots(&self) -> impl Iterator<Item = RootId> + '_ {
        self.roots
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.alive.then_some(i))
    }

    /// Positions from the seed point down to the tip of `root`.
    ///
    /// Follows parent links, so a lateral root's polyline starts at the
    /// seed of the root it branched from.
    pub fn polyline(&self, root: RootId) -> Vec<Point3> {
        let mut points = Vec::new();
        let mut current = Some(self.tip(root));
        while let Some(id) = current {
            points.push(self.nodes[id].position);
            current = self.nodes[id].parent;
        }
        points.reverse();
        points
    }
}
