//! Photon emission and the bounce walk that fills a [`PhotonMap`] pair.
//!
//! Grounded on the teacher's tile-parallel render loop (`integrator/mod.rs`'s
//! `render_tile`/`merge_film_tile` pattern, generalized from film tiles to
//! photon batches) for the parallel-shoot-then-merge shape, and on
//! `Light::sample_photon`/`Material::scatter_photon` (already present on
//! every light and material) for the per-bounce physics. The deposit rule
//! (what lands in the caustic map vs the diffuse map) follows the classic
//! direct/caustic/indirect photon classification every photon-mapping
//! renderer uses (Jensen; this crate's `original_source` counterpart is
//! `photonintegr.cc`'s `direct`/`caustic_photon` flags).

use bumpalo::Bump;
use cgmath::InnerSpace;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;

use crate::photon::map::{Photon, PhotonMap};
use crate::reflection::BxDFType;
use crate::sampling::Distribution1D;
use crate::scene::Scene;
use crate::spectrum::dispersive_tint;
use crate::{Float, Point2f};

/// How many photons to accumulate in each map, and how deep to trace a
/// single photon path before giving up.
#[derive(Clone, Copy, Debug)]
pub struct PhotonShootParams {
    pub n_diffuse_photons: u64,
    pub n_caustic_photons: u64,
    pub max_bounces: u32,
    /// Hard cap on the number of paths shot, in case a scene has no
    /// surfaces capable of depositing a photon (e.g. an all-specular or
    /// all-emissive scene) and the targets can never be reached.
    pub max_paths: u64,
}

impl Default for PhotonShootParams {
    fn default() -> Self {
        Self {
            n_diffuse_photons: 200_000,
            n_caustic_photons: 200_000,
            max_bounces: 10,
            max_paths: 50_000_000,
        }
    }
}

pub struct PhotonMaps {
    pub diffuse: PhotonMap,
    pub caustic: PhotonMap,
}

const BATCH_SIZE: u64 = 65_536;
const RR_START_BOUNCE: u32 = 4;

/// Shoots photon paths until both maps reach their target counts (or
/// `max_paths` is exhausted), then builds the balanced kd-trees.
pub fn shoot_photons(scene: &Scene, params: &PhotonShootParams) -> PhotonMaps {
    let light_power: Vec<Float> = scene.lights.iter().map(|l| l.power().luminance().max(0.0)).collect();
    if light_power.iter().all(|&p| p == 0.0) {
        tracing::warn!("no emissive lights with nonzero power; photon maps will be empty");
        return PhotonMaps { diffuse: PhotonMap::build(Vec::new(), 0), caustic: PhotonMap::build(Vec::new(), 0) };
    }
    let light_dist = Distribution1D::new(&light_power);

    let accum: Mutex<(Vec<Photon>, Vec<Photon>)> = Mutex::new((Vec::new(), Vec::new()));
    let mut n_paths: u64 = 0;

    while n_paths < params.max_paths {
        let targets_met = {
            let acc = accum.lock();
            acc.0.len() as u64 >= params.n_diffuse_photons && acc.1.len() as u64 >= params.n_caustic_photons
        };
        if targets_met {
            break;
        }

        let batch = BATCH_SIZE.min(params.max_paths - n_paths);
        let n_chunks = rayon::current_num_threads().max(1) as u64;
        let chunk_size = (batch / n_chunks).max(1);

        (0..n_chunks).into_par_iter().for_each(|chunk_idx| {
            let seed = n_paths.wrapping_add(chunk_idx).wrapping_mul(0x9E3779B97F4A7C15);
            let mut rng = Xoshiro256Plus::seed_from_u64(seed);
            let arena = Bump::new();
            let mut local_diffuse = Vec::new();
            let mut local_caustic = Vec::new();

            for _ in 0..chunk_size {
                shoot_one_path(scene, &light_dist, params.max_bounces, &mut rng, &arena, &mut local_diffuse, &mut local_caustic);
                arena.reset();
            }

            let mut acc = accum.lock();
            acc.0.extend(local_diffuse);
            acc.1.extend(local_caustic);
        });

        n_paths += chunk_size * n_chunks;
    }

    if n_paths >= params.max_paths {
        let acc = accum.lock();
        if (acc.0.len() as u64) < params.n_diffuse_photons || (acc.1.len() as u64) < params.n_caustic_photons {
            tracing::warn!(
                diffuse = acc.0.len(),
                caustic = acc.1.len(),
                "photon shooting hit max_paths before reaching target photon counts"
            );
        }
    }

    let (diffuse, caustic) = accum.into_inner();
    PhotonMaps {
        diffuse: PhotonMap::build(diffuse, n_paths),
        caustic: PhotonMap::build(caustic, n_paths),
    }
}

fn shoot_one_path(
    scene: &Scene,
    light_dist: &Distribution1D,
    max_bounces: u32,
    rng: &mut Xoshiro256Plus,
    arena: &Bump,
    diffuse_out: &mut Vec<Photon>,
    caustic_out: &mut Vec<Photon>,
) {
    let (light_idx, light_pdf) = light_dist.sample_discrete(rng.gen::<Float>());
    if light_pdf <= 0.0 {
        return;
    }
    let light = scene.lights[light_idx].as_ref();

    let emission = light.sample_photon(
        Point2f::new(rng.gen(), rng.gen()),
        Point2f::new(rng.gen(), rng.gen()),
    );
    if emission.power.is_black() {
        return;
    }

    // `PhotonEmission::power` is already the light's per-photon flux with
    // the position/direction pdfs and emission cosine folded in (see each
    // light's `sample_photon`); what remains is the light-selection pdf and
    // the `num_lights` term spec.md's `throughput = light_pdf*num_lights/
    // light_num_pdf` factors separately (so a uniform light-power
    // distribution still normalises to the right per-light share).
    let mut power = emission.power * scene.lights.len() as Float / light_pdf;

    let mut ray = emission.ray;
    let mut direct_photon = true;
    let mut caustic_photon = false;

    for bounce in 0..max_bounces {
        let mut r = ray;
        let si = match scene.intersect(&mut r) {
            Some(si) => si,
            None => break,
        };
        let material = match si.primitive.and_then(|p| p.material()) {
            Some(m) => m,
            None => break,
        };

        let wo = -ray.dir.normalize();

        // Deposit classification is keyed off the hit material's static BSDF
        // capability, read before scattering - not off whichever lobe this
        // particular bounce happens to sample - matching
        // `original_source/src/integrator/surface/integrator_sppm.cc`'s
        // `mat_bsdfs` read.
        let mat_bsdfs = material.bsdf_flags(&si, arena);
        let direct_before = direct_photon;
        let caustic_before = caustic_photon;

        if mat_bsdfs.intersects(BxDFType::DIFFUSE | BxDFType::GLOSSY) {
            if caustic_before {
                caustic_out.push(Photon { pos: si.hit.p, dir_in: wo, power, time: si.hit.time });
            } else if !direct_before {
                diffuse_out.push(Photon { pos: si.hit.p, dir_in: wo, power, time: si.hit.time });
            }
            // else: first (direct) bounce, handled by direct lighting in the eye pass.
            direct_photon = false;
        }

        let u = Point2f::new(rng.gen(), rng.gen());
        let scatter = match material.scatter_photon(&si, arena, wo, u) {
            Some(s) => s,
            None => break,
        };
        if scatter.pdf <= 0.0 || scatter.f.is_black() {
            break;
        }

        // A bounce continues (or starts) a caustic path only if it sampled a
        // glossy/specular lobe off a surface that was itself direct or
        // already on a caustic path. The original's two-term OR differs only
        // by a `FILTER` flag this crate's `BxDFType` doesn't model, so both
        // terms collapse to one shared predicate here.
        caustic_photon = scatter.sampled_type.intersects(BxDFType::GLOSSY | BxDFType::SPECULAR)
            && (direct_before || caustic_before);

        let mut throughput = scatter.f * (scatter.wi.dot(si.shading_n.0).abs() / scatter.pdf);

        if material.dispersion() > 0.0 && scatter.sampled_type.contains(BxDFType::SPECULAR | BxDFType::TRANSMISSION) {
            throughput = dispersive_tint(rng.gen()) * throughput;
        }

        power *= throughput;

        if bounce >= RR_START_BOUNCE {
            let rr = power.max_component_value().min(1.0);
            if rr <= 0.0 {
                break;
            }
            if rng.gen::<Float>() > rr {
                break;
            }
            power = power / rr;
        }

        ray = si.spawn_ray(scatter.wi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_power_lights_yield_empty_maps() {
        // exercised indirectly via shoot_photons in integration tests; a
        // unit-level placeholder that the default params are non-degenerate.
        let params = PhotonShootParams::default();
        assert!(params.n_diffuse_photons > 0);
        assert!(params.max_paths > 0);
    }
}
