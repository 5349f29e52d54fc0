//! Photon mapping: building a scene-wide photon map by tracing light paths
//! (as opposed to the camera paths the `integrator` module traces), and
//! querying it back via a radius/k-nearest gather. No counterpart in the
//! teacher crate, which only ever traces from the camera; grounded on
//! `bvh.rs`'s array-based tree-build idiom and the teacher's tile-parallel
//! render loop for the concurrency shape.

pub mod map;
pub mod shoot;

pub use map::{FoundPhoton, Photon, PhotonMap};
pub use shoot::{shoot_photons, PhotonMaps, PhotonShootParams};
