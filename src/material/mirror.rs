use crate::spectrum::Spectrum;
use crate::material::{Material, TransportMode};
use crate::SurfaceInteraction;
use bumpalo::Bump;
use crate::reflection::bsdf::Bsdf;
use crate::reflection::SpecularReflection;
use crate::fresnel::FresnelNoOp;

pub struct MirrorMaterial {
    reflectance: Spectrum,
}

impl MirrorMaterial {
    pub fn new(reflectance: Spectrum) -> Self {
        Self { reflectance }
    }
}

impl Material for MirrorMaterial {
    fn init_bsdf<'a>(&self, si: &SurfaceInteraction, arena: &'a Bump, _mode: TransportMode, _allow_multiple_lobes: bool) -> Bsdf<'a> {
        let mut bsdf = Bsdf::new(si, 1.0);
        let r = self.reflectance.clamp_positive();
        if !r.is_black() {
            let reflection = arena.alloc(SpecularReflection::new(r, FresnelNoOp));
            bsdf.add(reflection);
        }
        bsdf
    }
}
