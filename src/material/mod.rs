//! Surface shading models. Each `Material` holds constant reflectance/
//! transmittance parameters (texture evaluation is out of scope for this
//! crate - callers that need spatially-varying parameters resolve them
//! before constructing the material for a given shading point) and builds
//! a [`Bsdf`] out of the shared [`crate::reflection`] BxDF kernel.

pub mod matte;
pub mod mirror;
pub mod glass;
pub mod plastic;
pub mod metal;

use crate::interaction::SurfaceInteraction;
use crate::reflection::bsdf::Bsdf;
use crate::reflection::{BxDFType, ScatterSample};
use crate::spectrum::Spectrum;
use crate::volume::VolumeHandler;
use crate::{Float, HitPoint, Point2f, Vec3f};
use bumpalo::Bump;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransportMode {
    Radiance,
    Importance,
}

pub trait Material: Sync + Send {
    /// Builds the local BSDF at a shading point. `allow_multiple_lobes`
    /// controls whether a material with both a specular and a glossy/diffuse
    /// lobe (e.g. coated plastic) exposes both at once or forces the caller
    /// to treat them as mutually exclusive (path tracers that sample
    /// specular bounces separately pass `false`).
    fn init_bsdf<'a>(
        &self,
        si: &SurfaceInteraction,
        arena: &'a Bump,
        mode: TransportMode,
        allow_multiple_lobes: bool,
    ) -> Bsdf<'a>;

    fn eval(&self, si: &SurfaceInteraction, arena: &Bump, wo: Vec3f, wi: Vec3f, mode: TransportMode) -> Spectrum {
        self.eval_flags(si, arena, wo, wi, mode, BxDFType::all())
    }

    /// Like [`Material::eval`] but restricted to lobes matching `flags`
    /// (e.g. the diffuse-map photon gather wants `DIFFUSE | REFLECTION`
    /// only, leaving glossy/specular response to the caustic map).
    fn eval_flags(&self, si: &SurfaceInteraction, arena: &Bump, wo: Vec3f, wi: Vec3f, mode: TransportMode, flags: BxDFType) -> Spectrum {
        self.init_bsdf(si, arena, mode, true).f(wo, wi, flags)
    }

    fn sample(&self, si: &SurfaceInteraction, arena: &Bump, wo: Vec3f, u: Point2f, mode: TransportMode) -> Option<ScatterSample> {
        self.init_bsdf(si, arena, mode, true).sample_f(wo, u, BxDFType::all())
    }

    fn pdf(&self, si: &SurfaceInteraction, arena: &Bump, wo: Vec3f, wi: Vec3f, mode: TransportMode) -> Float {
        self.init_bsdf(si, arena, mode, true).pdf(wo, wi, BxDFType::all())
    }

    /// The material's pure-specular lobes (mirror reflection / refraction),
    /// each as an outgoing direction and the already-divided-by-pdf
    /// throughput multiplier `f * |cos theta_i| / pdf`. Used by the
    /// recursive trace instead of MIS, since a delta lobe can't be sampled
    /// by light sampling.
    fn specular(&self, si: &SurfaceInteraction, arena: &Bump, wo: Vec3f, mode: TransportMode) -> arrayvec::ArrayVec<[(Vec3f, Spectrum); 2]> {
        use cgmath::InnerSpace;
        let bsdf = self.init_bsdf(si, arena, mode, true);
        let mut out = arrayvec::ArrayVec::new();
        for flags in [BxDFType::SPECULAR | BxDFType::REFLECTION, BxDFType::SPECULAR | BxDFType::TRANSMISSION] {
            if let Some(s) = bsdf.sample_f(wo, Point2f::new(0.5, 0.5), flags) {
                if s.pdf > 0.0 && !s.f.is_black() {
                    let weight = s.f * (s.wi.dot(si.shading_n.0).abs() / s.pdf);
                    out.push((s.wi, weight));
                }
            }
        }
        out
    }

    /// Emitted radiance in direction `w`, for materials acting as an
    /// emitter without a dedicated `AreaLight` (e.g. glow materials).
    /// Geometry attached to an `AreaLight` primitive is handled separately
    /// by the integrator.
    fn emit(&self, _hit: &HitPoint, _w: Vec3f) -> Spectrum {
        Spectrum::new(0.0)
    }

    /// Opacity in `[0, 1]`, used for alpha-masked cutout geometry (leaves,
    /// foliage). `1.0` means fully opaque.
    fn alpha(&self, _si: &SurfaceInteraction) -> Float {
        1.0
    }

    /// The participating medium on the side of the surface `wi` points
    /// into, if any (used by dielectric materials like glass to attenuate
    /// transmitted rays).
    fn volume_handler(&self, _wi: Vec3f) -> Option<&dyn VolumeHandler> {
        None
    }

    /// Index-of-refraction spread between the red and blue ends of the
    /// visible spectrum, `0` for achromatic dielectrics. Nonzero only for
    /// `GlassMaterial`; drives the direct-light integrator's dispersive
    /// transmission split.
    fn dispersion(&self) -> Float {
        0.0
    }

    /// Scatters an incoming photon of direction `wo` (pointing back along
    /// the photon's path) at a bounce during photon shooting (spec.md
    /// §4.3's `scatterPhoton`, sampled over every lobe - specular, glossy,
    /// and diffuse alike, since the photon walk itself decides via the
    /// deposit rule whether a bounce matters for the caustic or diffuse
    /// map). Distinct from `sample` only in name: photon transport and
    /// camera-path transport pull from the same BSDF, just in opposite
    /// light-transport directions (`TransportMode::Importance`).
    fn scatter_photon(&self, si: &SurfaceInteraction, arena: &Bump, wo: Vec3f, u: Point2f) -> Option<ScatterSample> {
        self.sample(si, arena, wo, u, TransportMode::Importance)
    }

    /// The material's static lobe capability at this shading point - diffuse,
    /// glossy and/or specular - independent of whatever lobe a particular
    /// `scatter_photon`/`sample` call happens to pick. The photon walk's
    /// direct/caustic/diffuse classification (spec.md §4.3) is keyed off this,
    /// not off `ScatterSample::sampled_type`, matching
    /// `original_source/src/integrator/surface/integrator_sppm.cc`'s
    /// `mat_bsdfs = hit_curr->mat_data_->bsdf_flags_` read before scattering.
    fn bsdf_flags(&self, si: &SurfaceInteraction, arena: &Bump) -> BxDFType {
        let bsdf = self.init_bsdf(si, arena, TransportMode::Importance, true);
        let mut flags = BxDFType::empty();
        if bsdf.num_components(BxDFType::DIFFUSE | BxDFType::REFLECTION | BxDFType::TRANSMISSION) > 0 {
            flags |= BxDFType::DIFFUSE;
        }
        if bsdf.num_components(BxDFType::GLOSSY | BxDFType::REFLECTION | BxDFType::TRANSMISSION) > 0 {
            flags |= BxDFType::GLOSSY;
        }
        if bsdf.num_components(BxDFType::SPECULAR | BxDFType::REFLECTION | BxDFType::TRANSMISSION) > 0 {
            flags |= BxDFType::SPECULAR;
        }
        flags
    }
}
