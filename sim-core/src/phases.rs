//! Simulation phases for one growth step.
//!
//! A step runs the phases in this order, each on a consistent snapshot:
//! 1. [`advance_phase`] — plan one new node per live tip from the previous
//!    step's state (primary, random, adhesion and attractor pull, plus
//!    gravity and surface collision).
//! 2. [`apply_tip_updates`] — append the planned nodes, retire old tips from
//!    the tip index and kill exhausted roots.
//! 3. [`branching_phase`] — maybe spawn one lateral root per eligible root.
//! 4. [`attraction_phase`] — query every attractor against the updated tip
//!    index, recording kills and pulls for the next step.

use crate::{
    attractor::AttractorSet,
    config::GrowthParams,
    influence_buffer::InfluenceBuffer,
    kdtree::KdTree,
    rng::GrowthRng,
    surface::Surface,
    tree::{BranchNode, Tree},
    types::{NodeId, Point3, RootId, direction_of},
};
use glam::DVec3;
use std::f64::consts::TAU;
use tracing::trace;

/// Added to the random direction's z before normalizing.
pub const RANDOM_UPWARD_BIAS: f64 = 0.2;

/// Exponent of the gravity ease-in over the floating ratio.
pub const GRAVITY_EASE: f64 = 0.7;

/// Height above a surface at which a colliding tip comes to rest.
pub const SURFACE_OFFSET: f64 = 1e-3;

/// Moves shorter than this add no node; the root stays alive.
pub const MIN_TRAVEL: f64 = 1e-9;

/// Tip index payload: the branch node the entry stands for.
pub type TipIndex = KdTree<NodeId>;

/// A planned change to one root, computed from the pre-step state.
#[derive(Clone, Debug)]
pub enum TipUpdate {
    Grow { root: RootId, node: BranchNode },
    Die { root: RootId },
}

/// Where a tip ended up after colliding with a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    pub position: Point3,
    pub climbing: bool,
}

/// A unit vector uniformly drawn from the sphere, tilted upward.
pub fn random_direction(rng: &mut GrowthRng) -> DVec3 {
    let v = rng.unit_vector() + DVec3::new(0.0, 0.0, RANDOM_UPWARD_BIAS);
    direction_of(v).unwrap_or(DVec3::Z)
}

/// Unit direction toward the closest surface point in range, or zero.
pub fn adhesion_direction(surface: &dyn Surface, position: Point3, max_distance: f64) -> DVec3 {
    surface
        .nearest_point(position, max_distance)
        .and_then(|p| direction_of(p - position))
        .unwrap_or(DVec3::ZERO)
}

/// Moves `from` by `displacement`, stopping at and sliding along a surface.
///
/// On a hit the tip rests [`SURFACE_OFFSET`] above the hit point and the
/// unused part of the move is projected onto the tangent plane. A tip that
/// hit something, or that ends within `adhesion_distance` of the surface,
/// is climbing.
pub fn resolve_collision(
    surface: &dyn Surface,
    from: Point3,
    displacement: DVec3,
    adhesion_distance: f64,
) -> Collision {
    let length = displacement.length();
    let hit = displacement
        .try_normalize()
        .and_then(|dir| surface.ray_cast(from, dir, length));

    match hit {
        Some(hit) => {
            let rest = displacement * (1.0 - hit.distance / length);
            let slide = rest - hit.normal * rest.dot(hit.normal);
            Collision {
                position: hit.point + hit.normal * SURFACE_OFFSET + slide,
                climbing: true,
            }
        }
        None => {
            let position = from + displacement;
            Collision {
                position,
                climbing: surface
                    .nearest_point(position, adhesion_distance)
                    .is_some(),
            }
        }
    }
}

/// Plans the next node for every live root.
///
/// Reads only the current tree and the pulls from the previous attraction
/// pass; nothing is mutated except the random stream. Roots are visited in
/// id order so the random draws are reproducible.
///
/// ### Parameters
/// - `tree` - Current branch graph.
/// - `pulls` - Attractor pull per tip from the last [`attraction_phase`].
/// - `params` - Validated growth parameters.
/// - `surface` - Adhesion/collision geometry.
/// - `rng` - The simulation's random source.
///
/// ### Returns
/// At most one [`TipUpdate`] per live root, in root id order. A root whose
/// move resolves to (numerically) nothing gets no update this step.
pub fn advance_phase(
    tree: &Tree,
    pulls: &InfluenceBuffer,
    params: &GrowthParams,
    surface: &dyn Surface,
    rng: &mut GrowthRng,
) -> Vec<TipUpdate> {
    let mut updates = Vec::with_capacity(tree.roots.len());

    for root in tree.alive_roots() {
        let tip_id = tree.tip(root);
        let tip = &tree.nodes[tip_id];

        if tip.floating_length > params.max_floating_length {
            updates.push(TipUpdate::Die { root });
            continue;
        }

        let random = random_direction(rng);
        let adhesion = adhesion_direction(surface, tip.position, params.max_adhesion_distance);
        let pull = pulls.pull(tip_id).unwrap_or(DVec3::ZERO);

        let blended = tip.primary_direction * params.primary_weight
            + random * params.random_weight
            + adhesion * params.adhesion_weight
            + pull * params.tropism;
        let heading = direction_of(blended).unwrap_or(tip.primary_direction);

        let float_ratio = if params.max_floating_length > 0.0 {
            (tip.floating_length / params.max_floating_length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let gravity = DVec3::NEG_Z
            * params.gravity_weight
            * params.step_size
            * float_ratio.powf(GRAVITY_EASE);

        let displacement = heading * params.step_size + gravity;
        let collision = resolve_collision(
            surface,
            tip.position,
            displacement,
            params.max_adhesion_distance,
        );

        let moved = collision.position - tip.position;
        let travelled = moved.length();
        if travelled.is_nan() || travelled <= MIN_TRAVEL {
            // Stalled against a surface; the root keeps growing next step.
            continue;
        }
        let moved_dir = moved / travelled;
        let primary_direction =
            direction_of(tip.primary_direction.lerp(moved_dir, 0.5)).unwrap_or(moved_dir);

        let floating_length = if collision.climbing {
            0.0
        } else {
            tip.floating_length + travelled
        };

        updates.push(TipUpdate::Grow {
            root,
            node: BranchNode {
                position: collision.position,
                primary_direction,
                cumulative_length: (tip.cumulative_length + travelled)
                    .min(params.max_branch_length),
                floating_length,
                climbing: collision.climbing,
                parent: Some(tip_id),
                apex: None,
                shoot: None,
                root,
                index_entry: None,
            },
        });
    }

    updates
}

/// Removes `node` from the set of attraction targets, if it is one.
pub fn retire_tip(tree: &mut Tree, index: &mut TipIndex, node: NodeId) {
    if let Some(entry) = tree.nodes[node].index_entry.take() {
        index.disable(entry);
    }
}

/// Makes `node` an attraction target.
pub fn register_tip(tree: &mut Tree, index: &mut TipIndex, node: NodeId) {
    let entry = index.insert(tree.nodes[node].position, node);
    tree.nodes[node].index_entry = Some(entry);
}

/// Counts produced by [`apply_tip_updates`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ApplyOutcome {
    pub grown: usize,
    pub died: usize,
    /// Longest `cumulative_length` among the new nodes.
    pub max_length: f64,
}

/// Applies planned updates in order.
///
/// Grown roots get their new tip appended and indexed while the old tip is
/// disabled in the index. Dying roots are frozen and their tip disabled.
pub fn apply_tip_updates(
    tree: &mut Tree,
    index: &mut TipIndex,
    updates: Vec<TipUpdate>,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for update in updates {
        match update {
            TipUpdate::Grow { root, node } => {
                let old_tip = tree.tip(root);
                retire_tip(tree, index, old_tip);
                outcome.max_length = outcome.max_length.max(node.cumulative_length);
                let id = tree.push_apex(root, node);
                register_tip(tree, index, id);
                outcome.grown += 1;
            }
            TipUpdate::Die { root } => {
                let tip = tree.tip(root);
                retire_tip(tree, index, tip);
                tree.roots[root].alive = false;
                outcome.died += 1;
                trace!(
                    root,
                    length = tree.nodes[tip].cumulative_length,
                    "root stopped growing"
                );
            }
        }
    }

    outcome
}

/// Emission weight of a node at `length_ratio` along its root.
///
/// Zero at both ends of the root and one halfway along.
#[inline]
pub fn branching_weight(length_ratio: f64) -> f64 {
    1.0 - ((TAU * length_ratio).cos() * 0.5 + 0.5)
}

/// Spawns at most one lateral root per live root below the generation cap.
///
/// Scans each root's nodes from its start. Every node without a shoot draws
/// one uniform value and branches when `value * weight` exceeds the continue
/// probability; the scan of that root then stops. Roots spawned here are not
/// scanned until the next step.
///
/// ### Parameters
/// - `tree` - Branch graph; lateral roots are appended.
/// - `index` - Tip index; new root starts are inserted.
/// - `params` - Validated growth parameters.
/// - `rng` - The simulation's random source.
///
/// ### Returns
/// Ids of the roots spawned, in spawn order.
pub fn branching_phase(
    tree: &mut Tree,
    index: &mut TipIndex,
    params: &GrowthParams,
    rng: &mut GrowthRng,
) -> Vec<RootId> {
    let candidates: Vec<RootId> = tree
        .alive_roots()
        .filter(|&r| tree.roots[r].generation < params.max_generation)
        .collect();
    let mut spawned = Vec::new();

    for root in candidates {
        let tip_length = tree.nodes[tree.tip(root)].cumulative_length;

        let mut trigger = None;
        for &id in &tree.roots[root].nodes {
            let node = &tree.nodes[id];
            if node.shoot.is_some() {
                continue;
            }
            let weight = branching_weight(node.cumulative_length / tip_length);
            if rng.uniform() * weight > params.branching_continue {
                trigger = Some(id);
                break;
            }
        }

        if let Some(id) = trigger {
            let position = tree.nodes[id].position;
            let floating = tree.nodes[id].floating_length;
            let generation = tree.roots[root].generation + 1;
            let (new_root, start) = tree.add_root(position, floating, generation, Some(id));
            register_tip(tree, index, start);
            spawned.push(new_root);
        }
    }

    spawned
}

/// Attractors reached this pass plus the tips they pull on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttractionOutcome {
    /// Indices into the attractor set, ascending.
    pub killed: Vec<usize>,
    /// `(attractor index, tip)` for every attractor that influences a tip.
    pub influencing: Vec<(usize, NodeId)>,
}

/// Matches every attractor with its nearest live tip.
///
/// For each attractor:
///
/// 1. Looks up the nearest active entry in the tip index.
/// 2. Within the kill radius, the attractor is marked as reached.
/// 3. Otherwise, within the influence radius, the offset from the tip to
///    the attractor is added to `acc` for that tip.
///
/// Kill takes precedence, so no attractor is both killed and influencing.
/// The attractor set itself is not modified; callers remove the killed
/// indices in one batch afterwards.
///
/// ### Parameters
/// - `tree` - Current branch graph; only read access is required.
/// - `index` - Tip index, already updated for this step.
/// - `attractors` - Active attractors.
/// - `params` - Validated growth parameters (squared radii).
/// - `acc` - Scratch buffer, resized to the node count and cleared first.
pub fn attraction_phase(
    tree: &Tree,
    index: &TipIndex,
    attractors: &AttractorSet,
    params: &GrowthParams,
    acc: &mut InfluenceBuffer,
) -> AttractionOutcome {
    acc.ensure_len(tree.nodes.len());
    let mut outcome = AttractionOutcome::default();

    for (i, &a) in attractors.points.iter().enumerate() {
        let Some((entry, d2)) = index.nearest(a, true) else {
            continue;
        };
        let Some(&tip) = index.payload(entry) else {
            continue;
        };

        if d2 < params.kill_distance_sq {
            outcome.killed.push(i);
        } else if d2 < params.influence_distance_sq {
            acc.add(tip, a - tree.nodes[tip].position);
            outcome.influencing.push((i, tip));
        }
    }

    outcome
}
