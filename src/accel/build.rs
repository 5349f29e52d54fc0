//! SAH kd-tree construction: exact per-event cost sweep, optional primitive
//! bound clipping, and work-stealing parallel recursion via `rayon::join`.
//! Grounded on `bvh.rs`'s arena-allocated `BVHBuildNode<'a>` build-then-
//! flatten shape, reworked for an N-ary (not binary-partition) split where
//! a primitive straddling the plane is duplicated into both children. The
//! intermediate tree is boxed rather than arena-allocated: `bumpalo::Bump`
//! isn't `Sync`, so it can't be shared across the `rayon::join` halves that
//! build the left and right subtrees concurrently.

use crate::geometry::bounds::Bounds3f;
use crate::primitive::Primitive;
use crate::Float;

use super::{BuildStats, KdNode, KdTree};

#[derive(Clone, Copy, Debug)]
pub struct KdTreeParams {
    /// `None` picks `floor(7 + 1.66 log2 n)`, clamped to 64.
    pub max_depth: Option<usize>,
    /// `None` picks `max(1, floor(log2 n - 16))`.
    pub max_leaf_size: Option<usize>,
    /// `C_I` in the SAH cost model; traversal cost `C_T` is fixed at 1.0.
    pub cost_ratio: Float,
    /// `beta`: discount applied to splits that produce an empty child.
    pub empty_bonus: Float,
    /// `K`: primitive clipping is attempted only for leaves with at most
    /// this many candidate primitives.
    pub clip_threshold: usize,
    pub enable_clipping: bool,
    /// Node subtrees with at least this many primitives spawn their right
    /// recursion on a rayon task instead of continuing inline.
    pub spawn_threshold: usize,
}

impl Default for KdTreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_leaf_size: None,
            cost_ratio: 1.0,
            empty_bonus: 0.5,
            clip_threshold: 32,
            enable_clipping: true,
            spawn_threshold: 50_000,
        }
    }
}

const TRAVERSAL_COST: Float = 1.0;

struct PrimRef {
    idx: u32,
    bound: Bounds3f,
}

enum BuildNode {
    Leaf {
        prims: Vec<u32>,
    },
    Interior {
        axis: u8,
        split: Float,
        left: Box<BuildNode>,
        right: Box<BuildNode>,
    },
}

pub(super) fn build<P: AsRef<dyn Primitive>>(prims: Vec<P>, params: KdTreeParams) -> KdTree<P> {
    if prims.is_empty() {
        return KdTree {
            prims,
            bounds: Bounds3f::empty(),
            nodes: Vec::new(),
            leaf_prims: Vec::new(),
            stats: BuildStats::default(),
        };
    }

    let n = prims.len();
    let root_bound_raw = prims
        .iter()
        .fold(Bounds3f::empty(), |acc, p| acc.join(&p.as_ref().world_bound()));
    // §4.1 step 1: inflate the root bound by 0.1% on each axis to guarantee
    // strict containment of coplanar primitive bounds after roundoff.
    let diag = root_bound_raw.diagonal();
    let max_extent = diag.x.max(diag.y).max(diag.z).max(1e-6);
    let root_bound = root_bound_raw.expand(max_extent * 0.001);

    let log2_n = (n as Float).log2();
    let max_depth = params
        .max_depth
        .unwrap_or_else(|| ((7.0 + 1.66 * log2_n).floor() as usize).min(64))
        .max(1);
    let max_leaf_size = params
        .max_leaf_size
        .unwrap_or_else(|| (1.max((log2_n - 16.0).floor().max(0.0) as usize)).max(1));
    let mut cost_ratio = params.cost_ratio;
    if log2_n > 16.0 {
        cost_ratio += 0.25 * (log2_n - 16.0);
    }

    let prim_refs: Vec<PrimRef> = prims
        .iter()
        .enumerate()
        .map(|(i, p)| PrimRef {
            idx: i as u32,
            bound: p.as_ref().world_bound(),
        })
        .collect();

    let mut stats = BuildStats {
        n_primitives: n,
        ..Default::default()
    };

    let builder = Builder {
        params: &params,
        max_depth,
        max_leaf_size,
        cost_ratio,
    };

    let root = builder.build_node(prim_refs, root_bound, 0, 0, &mut stats);

    let mut nodes = Vec::with_capacity(stats.n_nodes.max(1));
    let mut leaf_prims = Vec::new();
    flatten(&root, &mut nodes, &mut leaf_prims);
    stats.n_nodes = nodes.len();

    KdTree {
        prims,
        bounds: root_bound,
        nodes,
        leaf_prims,
        stats,
    }
}

struct Builder<'p> {
    params: &'p KdTreeParams,
    max_depth: usize,
    max_leaf_size: usize,
    cost_ratio: Float,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
    Both,
}

/// Classifies a primitive bound against a candidate split, applying the
/// spec's right-before-left tie-break for primitives exactly planar at the
/// split position.
fn classify(bound: &Bounds3f, axis: usize, split: Float) -> Side {
    let lo = bound.min[axis];
    let hi = bound.max[axis];
    if hi < split {
        Side::Left
    } else if lo > split {
        Side::Right
    } else if lo == split && hi == split {
        Side::Right
    } else if hi == split {
        Side::Left
    } else if lo == split {
        Side::Right
    } else {
        Side::Both
    }
}

fn surface_area(b: &Bounds3f) -> Float {
    b.surface_area()
}

fn with_axis(p: cgmath::Point3<Float>, axis: usize, v: Float) -> cgmath::Point3<Float> {
    match axis {
        0 => cgmath::Point3::new(v, p.y, p.z),
        1 => cgmath::Point3::new(p.x, v, p.z),
        _ => cgmath::Point3::new(p.x, p.y, v),
    }
}

fn split_bounds(bound: &Bounds3f, axis: usize, split: Float) -> (Bounds3f, Bounds3f) {
    let left = Bounds3f::with_bounds(bound.min, with_axis(bound.max, axis, split));
    let right = Bounds3f::with_bounds(with_axis(bound.min, axis, split), bound.max);
    (left, right)
}

impl<'p> Builder<'p> {
    fn build_node(
        &self,
        refs: Vec<PrimRef>,
        bound: Bounds3f,
        depth: usize,
        bad_refines: usize,
        stats: &mut BuildStats,
    ) -> Box<BuildNode> {
        stats.max_depth = stats.max_depth.max(depth);

        if refs.len() <= self.max_leaf_size || depth >= self.max_depth || bad_refines >= 2 {
            return self.make_leaf(refs, stats);
        }

        let leaf_cost = self.cost_ratio * refs.len() as Float;
        let found = self.find_best_split(&refs, &bound, leaf_cost);

        let Some((axis, split_pos, _cost)) = found else {
            return self.build_node(refs, bound, depth, bad_refines + 1, stats);
        };

        let (left_bound, right_bound) = split_bounds(&bound, axis, split_pos);

        let mut left_refs = Vec::new();
        let mut right_refs = Vec::new();
        let mut bad_clips = 0usize;
        let attempt_clip = self.params.enable_clipping && refs.len() <= self.params.clip_threshold;

        for r in &refs {
            match classify(&r.bound, axis, split_pos) {
                Side::Left => left_refs.push(self.clipped(r, &left_bound, attempt_clip, &mut bad_clips)),
                Side::Right => right_refs.push(self.clipped(r, &right_bound, attempt_clip, &mut bad_clips)),
                Side::Both => {
                    left_refs.push(self.clipped(r, &left_bound, attempt_clip, &mut bad_clips));
                    right_refs.push(self.clipped(r, &right_bound, attempt_clip, &mut bad_clips));
                }
            }
        }
        stats.n_bad_clips += bad_clips;

        let (left, right) = if refs.len() >= self.params.spawn_threshold {
            let (l, (r, right_stats)) = rayon::join(
                || self.build_node(left_refs, left_bound, depth + 1, bad_refines, stats),
                || {
                    let mut rs = BuildStats::default();
                    let r = self.build_node(right_refs, right_bound, depth + 1, bad_refines, &mut rs);
                    (r, rs)
                },
            );
            // Only stats are summed across the parallel split - the tree
            // shape itself doesn't depend on how many threads built it.
            stats.max_depth = stats.max_depth.max(right_stats.max_depth);
            stats.n_leaves += right_stats.n_leaves;
            stats.n_bad_clips += right_stats.n_bad_clips;
            stats.n_bad_refines += right_stats.n_bad_refines;
            (l, r)
        } else {
            let l = self.build_node(left_refs, left_bound, depth + 1, bad_refines, stats);
            let r = self.build_node(right_refs, right_bound, depth + 1, bad_refines, stats);
            (l, r)
        };

        Box::new(BuildNode::Interior {
            axis: axis as u8,
            split: split_pos,
            left,
            right,
        })
    }

    /// Approximates the "exact overlap" primitive clip from §4.1.e: since
    /// the `Primitive` contract here exposes only `world_bound`, the clip
    /// tightens the reference's bound to its intersection with the child
    /// box rather than the primitive's true geometric footprint. A clip
    /// that collapses the bound to near-zero volume is counted as bad (the
    /// spec treats that as a metric only; the split still proceeds).
    fn clipped(&self, r: &PrimRef, child_bound: &Bounds3f, attempt: bool, bad_clips: &mut usize) -> PrimRef {
        if !attempt {
            return PrimRef { idx: r.idx, bound: r.bound };
        }
        let clipped = r.bound.intersection(child_bound);
        if clipped.surface_area() < 1e-9 {
            *bad_clips += 1;
        }
        PrimRef { idx: r.idx, bound: clipped }
    }

    fn make_leaf(&self, refs: Vec<PrimRef>, stats: &mut BuildStats) -> Box<BuildNode> {
        stats.n_leaves += 1;
        let prims = refs.iter().map(|r| r.idx).collect();
        Box::new(BuildNode::Leaf { prims })
    }

    /// Tries the longest axis, then the other two in descending extent
    /// order, returning the first axis/position pair with `cost < leaf_cost`
    /// and the lowest such cost across axes tried.
    fn find_best_split(&self, refs: &[PrimRef], bound: &Bounds3f, leaf_cost: Float) -> Option<(usize, Float, Float)> {
        let diag = bound.diagonal();
        let mut axes = [0usize, 1, 2];
        axes.sort_by(|&a, &b| diag[b].partial_cmp(&diag[a]).unwrap());

        for &axis in &axes {
            if diag[axis] <= 0.0 {
                continue;
            }
            if let Some((split, cost)) = self.best_split_on_axis(refs, bound, axis, leaf_cost) {
                return Some((axis, split, cost));
            }
        }
        None
    }

    fn best_split_on_axis(&self, refs: &[PrimRef], bound: &Bounds3f, axis: usize, leaf_cost: Float) -> Option<(Float, Float)> {
        let inv_total_area = 1.0 / surface_area(bound).max(1e-12);

        let mut candidates: Vec<Float> = Vec::with_capacity(refs.len() * 2);
        for r in refs {
            candidates.push(r.bound.min[axis]);
            candidates.push(r.bound.max[axis]);
        }
        candidates.sort_by(|a, b| a.partial_cmp(b).unwrap());
        candidates.dedup();

        let mut best: Option<(Float, Float)> = None;
        for &s in &candidates {
            if s <= bound.min[axis] || s >= bound.max[axis] {
                continue;
            }
            let (lb, rb) = split_bounds(bound, axis, s);
            let (mut n_l, mut n_r) = (0usize, 0usize);
            for r in refs {
                match classify(&r.bound, axis, s) {
                    Side::Left => n_l += 1,
                    Side::Right => n_r += 1,
                    Side::Both => {
                        n_l += 1;
                        n_r += 1;
                    }
                }
            }
            let empty_side = n_l == 0 || n_r == 0;
            let bonus = if empty_side { 1.0 - self.params.empty_bonus } else { 1.0 };
            let area_term = (surface_area(&lb) * n_l as Float + surface_area(&rb) * n_r as Float) * inv_total_area;
            let cost = TRAVERSAL_COST + self.cost_ratio * bonus * area_term;
            if cost < leaf_cost && best.map_or(true, |(_, bc)| cost < bc) {
                best = Some((s, cost));
            }
        }
        best
    }
}

fn flatten(node: &BuildNode, nodes: &mut Vec<KdNode>, leaf_prims: &mut Vec<u32>) -> usize {
    match node {
        BuildNode::Leaf { prims } => {
            let (right_child_or_prim, n_prims) = if prims.len() == 1 {
                (prims[0], 1u16)
            } else {
                let start = leaf_prims.len() as u32;
                leaf_prims.extend_from_slice(prims);
                (start, prims.len() as u16)
            };
            nodes.push(KdNode {
                split_pos: 0.0,
                right_child_or_prim,
                flags: KdNode::LEAF_FLAG,
                n_prims,
            });
            1
        }
        BuildNode::Interior { axis, split, left, right } => {
            let my_idx = nodes.len();
            nodes.push(KdNode {
                split_pos: *split,
                right_child_or_prim: 0,
                flags: *axis,
                n_prims: 0,
            });
            let left_len = flatten(left, nodes, leaf_prims);
            let right_idx = my_idx + left_len + 1;
            nodes[my_idx].right_child_or_prim = right_idx as u32;
            let right_len = flatten(right, nodes, leaf_prims);
            1 + left_len + right_len
        }
    }
}
