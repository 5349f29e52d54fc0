//! An area light whose emission comes from a `Shape`'s surface, following
//! Lambertian (or two-sided Lambertian) emission. Grounded on `point.rs`'s
//! `Light` impl shape, generalized from a delta-position point to an
//! area-sampled shape per `Shape::sample_from_ref`/`sample_photon`.

use std::sync::Arc;

use cgmath::{EuclideanSpace, InnerSpace};

use crate::geometry::coordinate_system;
use crate::interaction::HitPoint;
use crate::light::{AreaLight, AreaLightBuilder, Light, LightFlags, LiSample, PhotonEmission, VisibilityTester};
use crate::sampling::cosine_sample_hemisphere;
use crate::shapes::Shape;
use crate::spectrum::Spectrum;
use crate::{offset_ray_origin, Float, Point2f, Transform, Vec3f};

pub struct DiffuseAreaLight<S: Shape> {
    emit: Spectrum,
    shape: Arc<S>,
    area: Float,
    two_sided: bool,
}

impl<S: Shape> DiffuseAreaLight<S> {
    pub fn new(emit: Spectrum, shape: Arc<S>, two_sided: bool) -> Self {
        let area = shape.area();
        Self { emit, shape, area, two_sided }
    }
}

/// Builds a [`DiffuseAreaLight`] once the shape it's attached to is known,
/// matching [`AreaLightBuilder`]'s two-step construction (scene parsing
/// builds the light's parameters before the shape it'll wrap exists).
pub struct DiffuseAreaLightBuilder {
    pub emit: Spectrum,
    pub two_sided: bool,
}

impl<S: Shape> AreaLightBuilder<S> for DiffuseAreaLightBuilder {
    type Target = DiffuseAreaLight<S>;

    fn create(self, shape: Arc<S>) -> Self::Target {
        DiffuseAreaLight::new(self.emit, shape, self.two_sided)
    }
}

impl<S: Shape> Light for DiffuseAreaLight<S> {
    fn flags(&self) -> LightFlags {
        LightFlags::Area
    }

    fn light_to_world(&self) -> &Transform {
        self.shape.object_to_world()
    }

    fn world_to_light(&self) -> &Transform {
        self.shape.world_to_object()
    }

    fn sample_incident_radiance(&self, reference: &HitPoint, u: Point2f) -> LiSample {
        let (hit, pdf) = self.shape.sample_from_ref(reference, u);
        let vis = VisibilityTester { p0: *reference, p1: hit };
        if pdf == 0.0 || (hit.p - reference.p).magnitude2() == 0.0 {
            return LiSample { radiance: Spectrum::new(0.0), wi: Vec3f::new(0.0, 0.0, 1.0), pdf: 0.0, vis };
        }
        let wi = (hit.p - reference.p).normalize();
        let radiance = self.emitted_radiance(&hit, -wi);
        LiSample { radiance, wi, pdf, vis }
    }

    fn pdf_incident_radiance(&self, reference: &HitPoint, wi: Vec3f) -> Float {
        self.shape.pdf_from_ref(reference, wi)
    }

    fn power(&self) -> Spectrum {
        let sides = if self.two_sided { 2.0 } else { 1.0 };
        self.emit * (crate::consts::PI * self.area * sides)
    }

    fn sample_photon(&self, u1: Point2f, u2: Point2f) -> PhotonEmission {
        let hit = self.shape.sample(u1);
        let mut n = hit.n;
        // Two-sided emitters pick the emitting hemisphere with the first
        // coordinate of u2 and resample the remaining mass from the second.
        let local = if self.two_sided {
            let (side, u2a) = if u2.x < 0.5 { (1.0, u2.x * 2.0) } else { (-1.0, (u2.x - 0.5) * 2.0) };
            n = n.faceforward(n.0 * side);
            cosine_sample_hemisphere(Point2f::new(u2a, u2.y))
        } else {
            cosine_sample_hemisphere(u2)
        };
        let (s, t) = coordinate_system(n.0);
        let dir = s * local.x + t * local.y + n.0 * local.z;

        let origin = offset_ray_origin(&hit.p, &hit.p_err, &hit.n, &dir);
        let ray = crate::Ray { origin, dir, t_min: 0.0, t_max: crate::math::INFINITY, time: hit.time };

        PhotonEmission {
            ray,
            normal: n,
            power: self.emit * (crate::consts::PI * self.area),
            pdf_pos: 1.0 / self.area,
            pdf_dir: local.z * crate::consts::FRAC_1_PI,
        }
    }
}

impl<S: Shape> AreaLight for DiffuseAreaLight<S> {
    fn emitted_radiance(&self, hit: &HitPoint, w: Vec3f) -> Spectrum {
        if self.two_sided || hit.n.dot(w) > 0.0 {
            self.emit
        } else {
            Spectrum::new(0.0)
        }
    }

    fn as_light(&self) -> &dyn Light {
        self
    }
}
