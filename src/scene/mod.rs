//! The immutable scene snapshot integrators render against: the primitive
//! accelerator (materials and area lights travel with their primitives),
//! the light list, and an optional background term evaluated on escape
//! rays. Built once by [`Scene::new`], which runs each light's
//! `preprocess` against the finished accelerator before freezing the
//! snapshot.

use crate::accel::KdTree;
use crate::light::background::Background;
use crate::light::Light;
use crate::primitive::Primitive;
use crate::{Bounds3f, Ray, SurfaceInteraction};

pub struct Scene {
    primitives: KdTree<Box<dyn Primitive>>,
    pub lights: Vec<Box<dyn Light>>,
    pub background: Option<Box<dyn Background>>,
}

impl Scene {
    pub fn new(
        primitives: KdTree<Box<dyn Primitive>>,
        mut lights: Vec<Box<dyn Light>>,
        background: Option<Box<dyn Background>>,
    ) -> Self {
        for light in &mut lights {
            light.preprocess(&primitives);
        }

        Self { primitives, lights, background }
    }

    pub fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        self.primitives.intersect(ray)
    }

    pub fn intersect_test(&self, ray: &Ray) -> bool {
        self.primitives.intersect_test(ray)
    }

    /// Accumulates an alpha-transparency filter along `ray`, stopping at the
    /// first opaque occluder or after `max_depth` transparent surfaces.
    pub fn intersect_transparent_shadow(&self, ray: &Ray, max_depth: u32) -> crate::accel::TransparentShadow {
        self.primitives.intersect_transparent_shadow(ray, max_depth)
    }

    pub fn world_bound(&self) -> Bounds3f {
        self.primitives.bounds()
    }

    /// The radiance along a ray that escaped every primitive in the scene.
    pub fn environment_radiance(&self, ray: &Ray) -> crate::spectrum::Spectrum {
        self.background.as_ref().map_or(crate::spectrum::Spectrum::new(0.0), |b| b.eval(ray))
    }
}
