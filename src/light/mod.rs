use crate::{Transform, Point2f, Vec3f, Float, RayDifferential};
use crate::interaction::HitPoint;
use crate::spectrum::Spectrum;
use crate::scene::Scene;
use crate::accel::KdTree;
use std::sync::Arc;
use crate::shapes::Shape;

pub mod point;
pub mod distant;
pub mod diffuse;
pub mod background;

/// Total radiant power emitted by a light, used to importance-sample which
/// light in the scene a photon is shot from.
pub trait Light: Sync + Send {
    fn flags(&self) -> LightFlags;

    fn light_to_world(&self) -> &Transform;

    fn world_to_light(&self) -> &Transform;

    fn n_samples(&self) -> usize { 1 }

    fn preprocess(&mut self, scene_prims: &KdTree) {}

    fn sample_incident_radiance(&self, reference: &HitPoint, u: Point2f) -> LiSample;

    /// The probability density with respect to solid angle for the light's
    /// `sample_incident_radiance` method to sample the direction `wi` from the reference
    /// point `reference`.
    fn pdf_incident_radiance(&self, reference: &HitPoint, wi: Vec3f) -> Float;

    fn environment_emitted_radiance(&self, ray: &RayDifferential) -> Spectrum { Spectrum::new(0.0) }

    /// Total emitted power, integrated over area and direction. Used to
    /// build the discrete distribution photons are shot from.
    fn power(&self) -> Spectrum;

    /// Samples an outgoing photon ray and the radiant power it carries.
    /// `u1`/`u2` sample the emission point (for area lights) and `u3`/`u4`
    /// sample the emission direction.
    fn sample_photon(&self, u1: Point2f, u2: Point2f) -> PhotonEmission;
}

pub trait AreaLight: Light {
    /// Given a point on the area light's surface represented by `hit`, evaluate the area light's
    /// emitted radiance `L` in the given outgoing direction `w`.
    fn emitted_radiance(&self, hit: &HitPoint, w: Vec3f) -> Spectrum;

    fn as_light(&self) -> &dyn Light;
}

pub trait AreaLightBuilder<S: Shape> {
    type Target: AreaLight;

    fn create(self, shape: Arc<S>) -> Self::Target;
}

/// An emitted photon ray, its carried power, and the direction pdf it was
/// sampled with (used to weight the stored photon's power contribution).
pub struct PhotonEmission {
    pub ray: crate::Ray,
    pub normal: crate::Normal3,
    pub power: Spectrum,
    pub pdf_pos: Float,
    pub pdf_dir: Float,
}

pub struct LiSample {
    pub radiance: Spectrum,

    /// The direction *towards* the illumination
    pub wi: Vec3f,

    pub pdf: Float,

    pub vis: VisibilityTester,
}

pub enum LightFlags {
    DeltaPosition, DeltaDirection, Area, Infinite
}

impl LightFlags {
    pub fn is_delta_light(&self) -> bool {
        match self {
            LightFlags::DeltaDirection | LightFlags::DeltaPosition => true,
            _ => false
        }
    }
}

pub struct VisibilityTester {
    pub p0: HitPoint,
    pub p1: HitPoint,
}

impl VisibilityTester {
    pub fn unoccluded(&self, scene: &Scene) -> bool {
        !scene.intersect_test(&self.p0.spawn_ray_to_hit(&self.p1))
    }
}