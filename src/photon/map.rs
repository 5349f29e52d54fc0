//! The photon store built by [`super::shoot`]: a balanced, array-based
//! kd-tree over photon positions (spec.md §4.3's `PhotonMap`), supporting a
//! radius-bounded k-nearest gather and a little-endian binary persisted
//! format (spec.md §6's `YPM1` container).
//!
//! Grounded on `bvh.rs`'s `partition_at_index_by`-based median split for the
//! build (the same `partition` crate dependency, generalized from a binary
//! split on primitive centroids to a photon's raw position) and on
//! `accel/traverse.rs`'s explicit-stack idiom for the gather walk.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::{Error, Result};
use crate::spectrum::Spectrum;
use crate::{Float, Point3f, Vec3f};

const MAGIC: &[u8; 4] = b"YPM1";
const VERSION: u16 = 1;

/// One stored photon: the position it landed at, the direction it arrived
/// from, and the power it carried at that point (spec.md §3).
#[derive(Clone, Copy, Debug)]
pub struct Photon {
    pub pos: Point3f,
    pub dir_in: Vec3f,
    pub power: Spectrum,
    pub time: Float,
}

/// A photon found by [`PhotonMap::gather`], paired with its squared
/// distance from the query point (needed by the caller to re-weight by the
/// final search radius once gathering narrows it).
#[derive(Clone, Copy)]
pub struct FoundPhoton {
    pub photon_idx: u32,
    pub dist2: Float,
}

/// Balanced kd-tree over photon positions, built once after photon shooting
/// finishes. `n_paths` is the number of photon *paths* shot to build this
/// map (not the number of photons stored - a path that terminates by
/// Russian roulette or escape contributes to `n_paths` without landing a
/// photon), used to normalise gathered flux into radiance.
pub struct PhotonMap {
    nodes: Vec<KdPhotonNode>,
    bounds_min: Point3f,
    bounds_max: Point3f,
    pub n_paths: u64,
}

/// Array layout: node `i`'s children are implicitly `2i+1` (left) and
/// `2i+2` (right) once `build` permutes photons into median-balanced order,
/// matching the classic photon-map kd-tree layout (no explicit child
/// pointers needed).
struct KdPhotonNode {
    photon: Photon,
    split_axis: u8,
}

impl PhotonMap {
    /// Builds a left-balanced kd-tree over `photons` in place. Each level
    /// splits on the longest axis of the remaining photons' bounds, using
    /// `partition_at_index_by` (the `partition` crate, already the
    /// teacher's median-split tool in `bvh.rs`) to select the median without
    /// a full sort.
    pub fn build(mut photons: Vec<Photon>, n_paths: u64) -> Self {
        if photons.is_empty() {
            return Self { nodes: Vec::new(), bounds_min: Point3f::new(0.0, 0.0, 0.0), bounds_max: Point3f::new(0.0, 0.0, 0.0), n_paths };
        }

        let (bounds_min, bounds_max) = bounds_of(&photons);

        let n = photons.len();
        let mut nodes: Vec<Option<KdPhotonNode>> = (0..n).map(|_| None).collect();
        build_balanced(&mut photons, &mut nodes, 0);
        let nodes = nodes.into_iter().map(|n| n.expect("every slot filled by build_balanced")).collect();

        Self { nodes, bounds_min, bounds_max, n_paths }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn photon(&self, idx: u32) -> &Photon {
        &self.nodes[idx as usize].photon
    }

    /// Gathers up to `max_photons` within squared radius `max_dist2` of `p`,
    /// truncating with a max-heap on distance the way spec.md §4.3's
    /// `gather` does, and narrows `max_dist2` down to the farthest kept
    /// photon's distance so the caller can normalise by the actual search
    /// radius used.
    pub fn gather(&self, p: Point3f, max_photons: usize, mut max_dist2: Float) -> (Vec<FoundPhoton>, Float) {
        if self.nodes.is_empty() || max_photons == 0 {
            return (Vec::new(), max_dist2);
        }

        let mut heap: std::collections::BinaryHeap<HeapEntry> = std::collections::BinaryHeap::with_capacity(max_photons + 1);
        self.gather_recursive(0, p, max_photons, &mut max_dist2, &mut heap);

        let mut found: Vec<FoundPhoton> = heap
            .into_iter()
            .map(|e| FoundPhoton { photon_idx: e.idx, dist2: e.dist2 })
            .collect();
        found.sort_by(|a, b| a.dist2.partial_cmp(&b.dist2).unwrap());

        let radius2 = found.last().map_or(max_dist2, |f| f.dist2);
        (found, radius2)
    }

    fn gather_recursive(
        &self,
        node_idx: usize,
        p: Point3f,
        max_photons: usize,
        max_dist2: &mut Float,
        heap: &mut std::collections::BinaryHeap<HeapEntry>,
    ) {
        if node_idx >= self.nodes.len() {
            return;
        }
        let node = &self.nodes[node_idx];
        let axis = node.split_axis as usize;
        let delta = p[axis] - node.photon.pos[axis];

        let (near, far) = if delta < 0.0 {
            (2 * node_idx + 1, 2 * node_idx + 2)
        } else {
            (2 * node_idx + 2, 2 * node_idx + 1)
        };
        self.gather_recursive(near, p, max_photons, max_dist2, heap);
        if delta * delta < *max_dist2 {
            self.gather_recursive(far, p, max_photons, max_dist2, heap);
        }

        let dist2 = squared_distance(p, node.photon.pos);
        if dist2 < *max_dist2 {
            heap.push(HeapEntry { dist2, idx: node_idx as u32 });
            if heap.len() > max_photons {
                heap.pop();
                // Re-tighten the search radius to the new farthest photon
                // once the heap is at capacity, pruning further subtrees.
                if let Some(farthest) = heap.peek() {
                    *max_dist2 = farthest.dist2;
                }
            }
        }
    }

    /// Serialises the header and every photon record, little-endian, per
    /// spec.md §6's `YPM1` container.
    pub fn save<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(MAGIC)?;
        w.write_u16::<LittleEndian>(VERSION)?;
        w.write_u32::<LittleEndian>(self.nodes.len() as u32)?;
        w.write_u32::<LittleEndian>(self.n_paths as u32)?;
        for node in &self.nodes {
            let p = node.photon;
            for v in [p.pos.x, p.pos.y, p.pos.z] {
                w.write_f32::<LittleEndian>(v)?;
            }
            for v in [p.dir_in.x, p.dir_in.y, p.dir_in.z] {
                w.write_f32::<LittleEndian>(v)?;
            }
            for v in p.power.to_rgb() {
                w.write_f32::<LittleEndian>(v)?;
            }
            w.write_f32::<LittleEndian>(p.time)?;
        }
        Ok(())
    }

    /// Loads a persisted map. Rejects (via `Error::IOError`, spec.md §7)
    /// any file whose magic or version marker mismatches; the caller
    /// degrades to regenerating the map from scratch per spec.md §4.3's
    /// failure semantics.
    pub fn load<R: Read>(mut r: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, "bad photon map magic")));
        }
        let version = r.read_u16::<LittleEndian>()?;
        if version != VERSION {
            return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, "unsupported photon map version")));
        }
        let n_photons = r.read_u32::<LittleEndian>()? as usize;
        let n_paths = r.read_u32::<LittleEndian>()? as u64;

        let mut photons = Vec::with_capacity(n_photons);
        for _ in 0..n_photons {
            let pos = Point3f::new(
                r.read_f32::<LittleEndian>()?,
                r.read_f32::<LittleEndian>()?,
                r.read_f32::<LittleEndian>()?,
            );
            let dir_in = Vec3f::new(
                r.read_f32::<LittleEndian>()?,
                r.read_f32::<LittleEndian>()?,
                r.read_f32::<LittleEndian>()?,
            );
            let power = Spectrum::from([
                r.read_f32::<LittleEndian>()?,
                r.read_f32::<LittleEndian>()?,
                r.read_f32::<LittleEndian>()?,
            ]);
            let time = r.read_f32::<LittleEndian>()?;
            photons.push(Photon { pos, dir_in, power, time });
        }
        Ok(Self::build(photons, n_paths))
    }
}

#[derive(Clone, Copy)]
struct HeapEntry {
    dist2: Float,
    idx: u32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist2 == other.dist2
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // A max-heap on distance: `BinaryHeap::pop` evicts the farthest
        // photon first once the heap is over capacity.
        self.dist2.partial_cmp(&other.dist2).unwrap_or(std::cmp::Ordering::Equal)
    }
}

fn squared_distance(a: Point3f, b: Point3f) -> Float {
    let d = a - b;
    d.x * d.x + d.y * d.y + d.z * d.z
}

fn bounds_of(photons: &[Photon]) -> (Point3f, Point3f) {
    let mut min = photons[0].pos;
    let mut max = photons[0].pos;
    for p in &photons[1..] {
        min.x = min.x.min(p.pos.x);
        min.y = min.y.min(p.pos.y);
        min.z = min.z.min(p.pos.z);
        max.x = max.x.max(p.pos.x);
        max.y = max.y.max(p.pos.y);
        max.z = max.z.max(p.pos.z);
    }
    (min, max)
}

fn longest_axis(photons: &[Photon]) -> usize {
    let (min, max) = bounds_of(photons);
    let d = max - min;
    if d.x > d.y && d.x > d.z { 0 } else if d.y > d.z { 1 } else { 2 }
}

/// Recursively median-splits `photons[..]` into the implicit array-heap
/// layout `nodes` expects (node `i`'s children at `2i+1`/`2i+2`), the same
/// in-place-partition build `bvh.rs` uses for its BVH, generalized from a
/// fixed binary split to a full balanced tree over every photon.
fn build_balanced(photons: &mut [Photon], nodes: &mut [Option<KdPhotonNode>], node_idx: usize) {
    let n = photons.len();
    if n == 0 {
        return;
    }
    if n == 1 {
        nodes[node_idx] = Some(KdPhotonNode { photon: photons[0], split_axis: 0 });
        return;
    }

    let axis = longest_axis(photons);
    let mid = n / 2;
    photons.partition_at_index_by(mid, |a, b| {
        a.pos[axis].partial_cmp(&b.pos[axis]).unwrap()
    });

    let median = photons[mid];
    let (left, right_with_median) = photons.split_at_mut(mid);
    let right = &mut right_with_median[1..];

    nodes[node_idx] = Some(KdPhotonNode { photon: median, split_axis: axis as u8 });
    build_balanced(left, nodes, 2 * node_idx + 1);
    build_balanced(right, nodes, 2 * node_idx + 2);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photon_at(x: Float, y: Float, z: Float) -> Photon {
        Photon {
            pos: Point3f::new(x, y, z),
            dir_in: Vec3f::new(0.0, 0.0, 1.0),
            power: Spectrum::new(1.0),
            time: 0.0,
        }
    }

    #[test]
    fn gather_finds_nearest_within_radius() {
        let photons = vec![
            photon_at(0.0, 0.0, 0.0),
            photon_at(0.1, 0.0, 0.0),
            photon_at(5.0, 0.0, 0.0),
        ];
        let map = PhotonMap::build(photons, 3);
        let (found, r2) = map.gather(Point3f::new(0.0, 0.0, 0.0), 10, 1.0);
        assert_eq!(found.len(), 2);
        assert!(r2 <= 1.0);
    }

    #[test]
    fn gather_truncates_to_k_nearest() {
        let photons: Vec<Photon> = (0..20).map(|i| photon_at(i as Float * 0.1, 0.0, 0.0)).collect();
        let map = PhotonMap::build(photons, 20);
        let (found, _) = map.gather(Point3f::new(0.0, 0.0, 0.0), 5, 100.0);
        assert_eq!(found.len(), 5);
        for f in &found {
            assert!(map.photon(f.photon_idx).pos.x <= 0.5);
        }
    }

    #[test]
    fn round_trip_save_load_is_bit_exact() {
        let photons = vec![photon_at(1.0, 2.0, 3.0), photon_at(-1.0, 0.5, 2.0)];
        let map = PhotonMap::build(photons, 7);
        let mut buf = Vec::new();
        map.save(&mut buf).unwrap();
        let loaded = PhotonMap::load(std::io::Cursor::new(buf)).unwrap();
        assert_eq!(loaded.n_paths, map.n_paths);
        assert_eq!(loaded.len(), map.len());

        let mut a: Vec<_> = (0..map.len()).map(|i| map.photon(i as u32).pos).collect();
        let mut b: Vec<_> = (0..loaded.len()).map(|i| loaded.photon(i as u32).pos).collect();
        a.sort_by(|p, q| p.x.partial_cmp(&q.x).unwrap());
        b.sort_by(|p, q| p.x.partial_cmp(&q.x).unwrap());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.x, y.x);
            assert_eq!(x.y, y.y);
            assert_eq!(x.z, y.z);
        }
    }

    #[test]
    fn load_rejects_bad_magic() {
        let bytes = b"NOPE\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00".to_vec();
        assert!(PhotonMap::load(std::io::Cursor::new(bytes)).is_err());
    }
}
