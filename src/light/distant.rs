use cgmath::InnerSpace;
use cgmath::Zero;

use crate::{Float, Normal3, Point2f, Point3f, Transform, Vec3f};
use crate::accel::KdTree;
use crate::interaction::HitPoint;
use crate::light::{Light, LightFlags, LiSample, VisibilityTester, PhotonEmission};
use crate::sampling::{concentric_sample_disk, UNIFORM_SPHERE_PDF};
use crate::spectrum::Spectrum;

pub struct DistantLight {
    radiance: Spectrum,
    dir_to_light: Vec3f,
    world_center: Point3f,
    world_radius: Float,
}

impl DistantLight {
    pub fn from_to(from: Point3f, to: Point3f, radiance: Spectrum) -> Self {
        Self::new(radiance, from - to)
    }
    pub fn new(radiance: Spectrum, dir_to_light: Vec3f) -> Self {
        let dir_to_light = dir_to_light.normalize();
        Self {
            radiance,
            dir_to_light,
            world_center: Point3f::new(0.0, 0.0, 0.0),
            world_radius: 0.0,
        }
    }
}

impl Light for DistantLight {
    fn flags(&self) -> LightFlags {
        LightFlags::DeltaDirection
    }

    fn light_to_world(&self) -> &Transform {
        &Transform::IDENTITY
    }

    fn world_to_light(&self) -> &Transform {
        &Transform::IDENTITY
    }

    fn preprocess(&mut self, scene_prims: &KdTree) {
        let (world_center, world_radius) = scene_prims.bounds().bounding_sphere();
        self.world_center = world_center;
        self.world_radius = world_radius;
    }

    fn sample_incident_radiance(&self, reference: &HitPoint, _u: Point2f) -> LiSample {
        let p_outside = reference.p + self.dir_to_light * (2.0 * self.world_radius);

        let p1 = HitPoint {
            p: p_outside,
            p_err: Vec3f::zero(),
            time: reference.time,
            n: Normal3(Vec3f::zero()),
        };

        let vis = VisibilityTester {
            p0: *reference,
            p1,
        };

        LiSample {
            radiance: self.radiance,
            wi: self.dir_to_light,
            pdf: 1.0,
            vis,
        }
    }

    fn pdf_incident_radiance(&self, _reference: &HitPoint, _wi: Vec3f) -> Float {
        0.0
    }

    fn power(&self) -> Spectrum {
        self.radiance * crate::consts::PI * self.world_radius * self.world_radius
    }

    fn sample_photon(&self, u1: Point2f, _u2: Point2f) -> PhotonEmission {
        // Disk of radius world_radius perpendicular to -dir_to_light, at the
        // scene's bounding sphere, shooting parallel rays inward.
        let (v1, v2) = crate::geometry::coordinate_system(self.dir_to_light);
        let d = concentric_sample_disk(u1) * self.world_radius;
        let p_start = self.world_center + self.world_radius * self.dir_to_light + d.x * v1 + d.y * v2;
        let ray = crate::Ray::new(p_start, -self.dir_to_light);
        PhotonEmission {
            ray,
            normal: Normal3(-self.dir_to_light),
            power: self.radiance,
            pdf_pos: 1.0 / (crate::consts::PI * self.world_radius * self.world_radius),
            pdf_dir: 1.0,
        }
    }
}
