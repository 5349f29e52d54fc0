use crate::spectrum::Spectrum;
use crate::material::{Material, TransportMode};
use crate::interaction::SurfaceInteraction;
use bumpalo::Bump;
use crate::reflection::bsdf::Bsdf;
use crate::reflection::{LambertianReflection, OrenNayar};
use crate::Float;

/// A purely diffuse surface. `sigma == 0` gives Lambertian reflection;
/// a nonzero microfacet roughness `sigma` (in degrees) switches to the
/// Oren-Nayar model for rough diffuse surfaces.
pub struct MatteMaterial {
    diffuse: Spectrum,
    sigma: Float,
}

impl MatteMaterial {
    pub fn new(diffuse: Spectrum, sigma: Float) -> Self {
        Self { diffuse, sigma }
    }
}

impl Material for MatteMaterial {
    fn init_bsdf<'a>(&self, si: &SurfaceInteraction, arena: &'a Bump, _mode: TransportMode, _allow_multiple_lobes: bool) -> Bsdf<'a> {
        let mut bsdf = Bsdf::new(si, 1.0);

        let r = self.diffuse.clamp_positive();
        if !r.is_black() {
            if self.sigma == 0.0 {
                bsdf.add(arena.alloc(LambertianReflection { r }));
            } else {
                bsdf.add(arena.alloc(OrenNayar::new(r, cgmath::Deg(self.sigma))));
            }
        }
        bsdf
    }
}
