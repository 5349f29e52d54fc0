//! Havran-style kd-tree traversal: an explicit `[64]`-entry stack walks the
//! flattened node array near-child-first, ordering children by the sign of
//! the ray direction on the node's split axis. Grounded on `bvh.rs`'s
//! `LinearBVHNode` stack-based walk, adapted to a split-plane test instead
//! of a bounding-box slab test per child.

use arrayvec::ArrayVec;

use crate::interaction::SurfaceInteraction;
use crate::geometry::Ray;
use crate::primitive::Primitive;
use crate::spectrum::Spectrum;
use crate::Vec3f;

use super::{KdNode, KdTree, StackFrame, TransparentShadow, MAX_TRAVERSAL_DEPTH};

fn leaf_indices<'t, P>(tree: &'t KdTree<P>, node: &KdNode) -> &'t [u32] {
    if node.n_prims == 0 {
        &[]
    } else if node.n_prims == 1 {
        std::slice::from_ref(&node.right_child_or_prim)
    } else {
        let start = node.right_child_or_prim as usize;
        &tree.leaf_prims[start..start + node.n_prims as usize]
    }
}

type Stack = ArrayVec<[StackFrame; MAX_TRAVERSAL_DEPTH]>;

pub(super) fn intersect<P: AsRef<dyn Primitive>>(tree: &KdTree<P>, ray: &mut Ray) -> Option<SurfaceInteraction> {
    if tree.nodes.is_empty() {
        return None;
    }
    let (root_t_min, root_t_max) = tree.bounds.intersect_test(ray)?;
    let mut t_min = root_t_min;
    let mut t_max = root_t_max.min(ray.t_max);
    if t_min > t_max {
        return None;
    }

    let inv_dir = Vec3f::new(1.0 / ray.dir.x, 1.0 / ray.dir.y, 1.0 / ray.dir.z);
    let mut stack: Stack = ArrayVec::new();
    let mut node_idx = 0u32;
    let mut hit: Option<SurfaceInteraction> = None;

    loop {
        if ray.t_max < t_min {
            break;
        }
        let node = tree.nodes[node_idx as usize];
        if !node.is_leaf() {
            let axis = node.split_axis();
            let t_plane = (node.split_pos - ray.origin[axis]) * inv_dir[axis];
            let below_first = ray.origin[axis] < node.split_pos
                || (ray.origin[axis] == node.split_pos && ray.dir[axis] <= 0.0);
            let (first, second) = if below_first {
                (node_idx + 1, node.right_child_or_prim)
            } else {
                (node.right_child_or_prim, node_idx + 1)
            };

            if t_plane > t_max || t_plane <= 0.0 {
                node_idx = first;
            } else if t_plane < t_min {
                node_idx = second;
            } else {
                stack.push(StackFrame { t_min: t_plane, t_max, node: second });
                node_idx = first;
                t_max = t_plane;
            }
            continue;
        }

        for &pi in leaf_indices(tree, &node) {
            if let Some(si) = tree.prims[pi as usize].as_ref().intersect(ray) {
                hit = Some(si);
            }
        }

        match stack.pop() {
            Some(frame) => {
                node_idx = frame.node;
                t_min = frame.t_min;
                t_max = frame.t_max;
            }
            None => break,
        }
    }

    hit
}

pub(super) fn intersect_test<P: AsRef<dyn Primitive>>(tree: &KdTree<P>, ray: &Ray) -> bool {
    if tree.nodes.is_empty() {
        return false;
    }
    let bound_hit = match tree.bounds.intersect_test(ray) {
        Some(v) => v,
        None => return false,
    };
    let mut t_min = bound_hit.0;
    let mut t_max = bound_hit.1.min(ray.t_max);
    if t_min > t_max {
        return false;
    }

    let inv_dir = Vec3f::new(1.0 / ray.dir.x, 1.0 / ray.dir.y, 1.0 / ray.dir.z);
    let mut stack: Stack = ArrayVec::new();
    let mut node_idx = 0u32;

    loop {
        let node = tree.nodes[node_idx as usize];
        if !node.is_leaf() {
            let axis = node.split_axis();
            let t_plane = (node.split_pos - ray.origin[axis]) * inv_dir[axis];
            let below_first = ray.origin[axis] < node.split_pos
                || (ray.origin[axis] == node.split_pos && ray.dir[axis] <= 0.0);
            let (first, second) = if below_first {
                (node_idx + 1, node.right_child_or_prim)
            } else {
                (node.right_child_or_prim, node_idx + 1)
            };

            if t_plane > t_max || t_plane <= 0.0 {
                node_idx = first;
            } else if t_plane < t_min {
                node_idx = second;
            } else {
                stack.push(StackFrame { t_min: t_plane, t_max, node: second });
                node_idx = first;
                t_max = t_plane;
            }
            continue;
        }

        for &pi in leaf_indices(tree, &node) {
            if tree.prims[pi as usize].as_ref().intersect_test(ray) {
                return true;
            }
        }

        match stack.pop() {
            Some(frame) => {
                node_idx = frame.node;
                t_min = frame.t_min;
                t_max = frame.t_max;
            }
            None => return false,
        }
    }
}

/// Nearest hit strictly within `[lo, hi]` of `ray`'s parametric range,
/// leaving `ray` untouched (the shadow filter pass needs to keep re-querying
/// the same ray with a narrowing lower bound).
fn nearest_hit_in_range<P: AsRef<dyn Primitive>>(
    tree: &KdTree<P>,
    ray: &Ray,
    lo: f32,
    hi: f32,
) -> Option<(f32, SurfaceInteraction)> {
    let mut scratch = *ray;
    scratch.t_min = lo;
    scratch.t_max = hi;
    let si = intersect(tree, &mut scratch)?;
    Some((scratch.t_max, si))
}

/// Accumulates an alpha-transparency filter along `ray` by repeatedly
/// re-querying the nearest hit with a narrowing lower bound. Each query
/// walks the whole tree fresh, so a primitive duplicated into adjacent
/// leaves by clipping is still only ever reported once per iteration (the
/// traversal returns a single nearest hit regardless of how many leaves
/// reference it) - no separate dedup set is needed for correctness, only
/// `max_depth` to bound how many transparent surfaces get stacked.
pub(super) fn intersect_transparent_shadow<P: AsRef<dyn Primitive>>(
    tree: &KdTree<P>,
    ray: &Ray,
    max_depth: u32,
) -> TransparentShadow {
    let mut filter = Spectrum::uniform(1.0);
    let mut lo = ray.t_min;
    let hi = ray.t_max;
    let mut depth = 0u32;

    loop {
        let Some((t_hit, si)) = nearest_hit_in_range(tree, ray, lo, hi) else {
            return TransparentShadow { filter, occluded: false };
        };

        let Some(prim) = si.primitive else {
            return TransparentShadow { filter, occluded: true };
        };
        let alpha = prim.material().map_or(1.0, |m| m.alpha(&si));

        if alpha >= 1.0 {
            return TransparentShadow { filter, occluded: true };
        }

        filter = filter * (1.0 - alpha);
        depth += 1;
        if depth > max_depth {
            return TransparentShadow { filter, occluded: true };
        }

        lo = t_hit + crate::math::SHADOW_EPSILON;
        if lo >= hi {
            return TransparentShadow { filter, occluded: false };
        }
    }
}
