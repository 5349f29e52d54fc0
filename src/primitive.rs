//! Scene-graph leaves: a `Primitive` binds a `Shape` to an optional
//! `Material` and an optional `AreaLight`, and is what the accelerator
//! stores and intersects against.

use crate::geometry::bounds::Bounds3f;
use crate::geometry::Ray;
use crate::interaction::SurfaceInteraction;
use crate::light::AreaLight;
use crate::material::Material;
use crate::shapes::Shape;
use crate::{Transform, Transformable};
use std::sync::Arc;

pub trait Primitive: Sync + Send {
    fn world_bound(&self) -> Bounds3f;

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction>;

    fn intersect_test(&self, ray: &Ray) -> bool;

    fn material(&self) -> Option<&dyn Material>;

    fn area_light(&self) -> Option<&dyn AreaLight>;
}

/// The ordinary case: one shape, at most one material, at most one area
/// light (the shape acting as an emitter).
pub struct GeometricPrimitive<S: Shape> {
    pub shape: S,
    pub material: Option<Arc<dyn Material>>,
    pub light: Option<Arc<dyn AreaLight>>,
}

impl<S: Shape> GeometricPrimitive<S> {
    pub fn new(shape: S, material: Option<Arc<dyn Material>>, light: Option<Arc<dyn AreaLight>>) -> Self {
        Self { shape, material, light }
    }
}

impl<S: Shape> Primitive for GeometricPrimitive<S> {
    fn world_bound(&self) -> Bounds3f {
        self.shape.world_bound()
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        let (t_hit, mut isect) = self.shape.intersect(ray)?;
        ray.t_max = t_hit;
        isect.primitive = Some(self as &dyn Primitive);
        Some(isect)
    }

    fn intersect_test(&self, ray: &Ray) -> bool {
        self.shape.intersect_test(ray)
    }

    fn material(&self) -> Option<&dyn Material> {
        self.material.as_deref()
    }

    fn area_light(&self) -> Option<&dyn AreaLight> {
        self.light.as_deref()
    }
}

/// A reusable shared primitive placed in the world via an extra transform,
/// so a single sub-tree can be instanced many times without duplicating its
/// geometry.
pub struct InstancePrimitive {
    instanced: Arc<dyn Primitive>,
    instance_to_world: Transform,
    world_to_instance: Transform,
}

impl InstancePrimitive {
    pub fn new(instanced: Arc<dyn Primitive>, instance_to_world: Transform) -> Self {
        Self {
            instanced,
            instance_to_world,
            world_to_instance: instance_to_world.inverse(),
        }
    }
}

impl Primitive for InstancePrimitive {
    fn world_bound(&self) -> Bounds3f {
        self.instance_to_world.transform(self.instanced.world_bound())
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        let mut local_ray = ray.transform(self.world_to_instance);
        local_ray.t_max = ray.t_max;
        let isect = self.instanced.intersect(&mut local_ray)?;
        ray.t_max = local_ray.t_max;
        Some(isect.transform(self.instance_to_world))
    }

    fn intersect_test(&self, ray: &Ray) -> bool {
        let mut local_ray = ray.transform(self.world_to_instance);
        local_ray.t_max = ray.t_max;
        self.instanced.intersect_test(&local_ray)
    }

    fn material(&self) -> Option<&dyn Material> {
        self.instanced.material()
    }

    fn area_light(&self) -> Option<&dyn AreaLight> {
        self.instanced.area_light()
    }
}

impl<T: Primitive + ?Sized> Primitive for Arc<T> {
    fn world_bound(&self) -> Bounds3f {
        (**self).world_bound()
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        (**self).intersect(ray)
    }

    fn intersect_test(&self, ray: &Ray) -> bool {
        (**self).intersect_test(ray)
    }

    fn material(&self) -> Option<&dyn Material> {
        (**self).material()
    }

    fn area_light(&self) -> Option<&dyn AreaLight> {
        (**self).area_light()
    }
}
