use crate::spectrum::Spectrum;
use crate::{Float, SurfaceInteraction};
use crate::material::{Material, TransportMode};
use bumpalo::Bump;
use crate::reflection::bsdf::Bsdf;
use crate::reflection::{SpecularReflection, SpecularTransmission, MicrofacetReflection, MicrofacetTransmission};
use crate::fresnel::FresnelDielectric;
use crate::reflection::microfacet::TrowbridgeReitzDistribution;

/// A dielectric (glass) material. Zero roughness gives perfect mirror
/// reflection and refraction; a nonzero roughness switches to a rough
/// Torrance-Sparrow microfacet model for both lobes.
pub struct GlassMaterial {
    reflectance: Spectrum,
    transmittance: Spectrum,
    u_roughness: Float,
    v_roughness: Float,
    eta: Float,
    remap_roughness: bool,
    /// Index-of-refraction spread between the spectrum's red and blue ends;
    /// `0` for an achromatic dielectric, nonzero for dispersive glass (e.g.
    /// a prism), driving the direct-light integrator's wavelength split.
    dispersion: Float,
}

impl GlassMaterial {
    pub fn new(
        kr: Spectrum,
        kt: Spectrum,
        u_roughness: Float,
        v_roughness: Float,
        eta: Float,
        remap_roughness: bool,
    ) -> Self {
        Self {
            reflectance: kr,
            transmittance: kt,
            u_roughness,
            v_roughness,
            eta,
            remap_roughness,
            dispersion: 0.0,
        }
    }

    pub fn constant(kr: Spectrum, kt: Spectrum, eta: Float) -> Self {
        Self {
            reflectance: kr,
            transmittance: kt,
            u_roughness: 0.0,
            v_roughness: 0.0,
            eta,
            remap_roughness: false,
            dispersion: 0.0,
        }
    }

    pub fn dispersive(kr: Spectrum, kt: Spectrum, eta: Float, dispersion: Float) -> Self {
        Self {
            reflectance: kr,
            transmittance: kt,
            u_roughness: 0.0,
            v_roughness: 0.0,
            eta,
            remap_roughness: false,
            dispersion,
        }
    }
}

impl Material for GlassMaterial {
    fn init_bsdf<'a>(&self, si: &SurfaceInteraction, arena: &'a Bump, mode: TransportMode, _allow_multiple_lobes: bool) -> Bsdf<'a> {
        let eta = self.eta;
        let r = self.reflectance.clamp_positive();
        let t = self.transmittance.clamp_positive();
        let mut u_rough = self.u_roughness;
        let mut v_rough = self.v_roughness;
        if self.remap_roughness {
            u_rough = TrowbridgeReitzDistribution::roughness_to_alpha(u_rough);
            v_rough = TrowbridgeReitzDistribution::roughness_to_alpha(v_rough);
        }
        let mut bsdf = Bsdf::new(si, eta);

        let is_specular = u_rough == 0.0 && v_rough == 0.0;

        if !r.is_black() {
            let fresnel = FresnelDielectric::new(1.0, eta);
            if is_specular {
                let reflection = arena.alloc(SpecularReflection::new(r, fresnel));
                bsdf.add(reflection);
            } else {
                let distribution = TrowbridgeReitzDistribution::new(u_rough, v_rough);
                let reflection = arena.alloc(MicrofacetReflection::new(r, distribution, fresnel));
                bsdf.add(reflection);
            }
        }

        if !t.is_black() {
            if is_specular {
                let transmission = arena.alloc(SpecularTransmission::new(t, 1.0, eta, mode));
                bsdf.add(transmission);
            } else {
                let distribution = TrowbridgeReitzDistribution::new(u_rough, v_rough);
                let transmission = arena.alloc(MicrofacetTransmission::new(t, distribution, 1.0, eta, mode));
                bsdf.add(transmission);
            }
        }
        bsdf
    }

    fn dispersion(&self) -> Float {
        self.dispersion
    }
}
