use crate::geometry::bounds::Bounds3f;
use crate::geometry::{Ray, Transform, Transformable};
use crate::interaction::{HitPoint, SurfaceInteraction};
use crate::{Float, Point2f};

pub mod sphere;
pub mod triangle;

/// A single piece of renderable geometry. Shapes are expressed in their own
/// object space; `object_to_world`/`world_to_object` locate them in the
/// scene.
pub trait Shape: Sync + Send {
    fn object_bound(&self) -> Bounds3f;

    fn world_bound(&self) -> Bounds3f {
        self.object_to_world().transform(self.object_bound())
    }

    fn object_to_world(&self) -> &Transform;

    fn world_to_object(&self) -> &Transform;

    fn reverse_orientation(&self) -> bool;

    fn flip_normals(&self) -> bool {
        self.reverse_orientation() != self.object_to_world().swaps_handedness()
    }

    fn area(&self) -> Float;

    fn intersect(&self, ray: &Ray) -> Option<(Float, SurfaceInteraction)>;

    fn intersect_test(&self, ray: &Ray) -> bool {
        self.intersect(ray).is_some()
    }

    /// Uniformly samples a point on the shape's surface with respect to area;
    /// `pdf` with respect to area is `1 / area()`.
    fn sample(&self, u: Point2f) -> HitPoint;

    /// Samples a point on the shape visible from `reference`, returning the
    /// hit point and the pdf with respect to solid angle at `reference`. The
    /// default falls back to area sampling, which is correct but has high
    /// variance for small, distant lights; shapes may override this with an
    /// importance-sampled solid-angle method (e.g. a sphere sampling its
    /// visible cone).
    fn sample_from_ref(&self, reference: &HitPoint, u: Point2f) -> (HitPoint, Float) {
        use cgmath::{InnerSpace, EuclideanSpace};
        let hit = self.sample(u);
        let mut wi = hit.p - reference.p;
        if wi.magnitude2() == 0.0 {
            return (hit, 0.0);
        }
        wi = wi.normalize();
        let denom = crate::abs_dot(hit.n.0, -wi) * self.area();
        let pdf = if denom == 0.0 {
            0.0
        } else {
            (hit.p - reference.p).magnitude2() / denom
        };
        (hit, pdf)
    }

    fn pdf_from_ref(&self, reference: &HitPoint, wi: crate::Vec3f) -> Float {
        use cgmath::InnerSpace;
        let ray = reference.spawn_ray(wi);
        match self.intersect(&ray) {
            None => 0.0,
            Some((_, isect)) => {
                let denom = crate::abs_dot(isect.hit.n.0, -wi) * self.area();
                if denom == 0.0 {
                    0.0
                } else {
                    (isect.hit.p - reference.p).magnitude2() / denom
                }
            }
        }
    }
}
