//! Core rendering library: kd-tree acceleration structure, Monte-Carlo surface
//! integrators (direct lighting with MIS, recursive specular/glossy/dispersive
//! trace) and photon mapping / stochastic progressive photon mapping.
//!
//! Scene parsing, image codec I/O, GUI and colour management live outside this
//! crate; this crate only defines the traits those layers call into.

#[macro_use]
pub mod macros;
pub mod math;
pub mod err_float;
pub mod geometry;
pub mod interaction;
pub mod primitive;
pub mod shapes;
pub mod accel;
pub mod volume;
pub mod reflection;
pub mod fresnel;
pub mod material;
pub mod light;
pub mod sampling;
pub mod sampler;
pub mod spectrum;
pub mod filter;
pub mod camera;
pub mod scene;
pub mod params;
pub mod errors;
pub mod photon;
pub mod integrator;
pub mod film;
pub mod render;

pub use crate::geometry::{Ray, RayDifferential, Differential, Normal3, Transform};
pub use crate::geometry::transform::Transformable;
pub use crate::geometry::bounds::{Bounds2, Bounds2f, Bounds2i, Bounds3, Bounds3f};
pub use crate::interaction::{HitPoint, SurfaceInteraction, DiffGeom};
pub use crate::err_float::EFloat;
pub use crate::errors::Error;

use cgmath::{Point2, Point3, Vector2, Vector3, BaseFloat, BaseNum};
use num_traits::{Bounded, NumCast};

/// The scalar type used throughout the renderer. A single alias keeps the
/// door open to an `f64` build without touching call sites.
pub type Float = f32;

pub type Vec3f = Vector3<Float>;
pub type Vec2f = Vector2<Float>;
pub type Point3f = Point3<Float>;
pub type Point2f = Point2<Float>;
pub type Point2i = Point2<i32>;
pub type Vec2i = Vector2<i32>;

/// Bound shared by the coordinate types so `Bounds2<S>`/`Bounds3<S>` can be
/// generic over both the floating point and integer (raster) cases.
pub trait Scalar: BaseNum + Bounded + PartialOrd + Copy {
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
}

impl Scalar for f32 {
    fn min(self, other: Self) -> Self { f32::min(self, other) }
    fn max(self, other: Self) -> Self { f32::max(self, other) }
}

impl Scalar for i32 {
    fn min(self, other: Self) -> Self { i32::min(self, other) }
    fn max(self, other: Self) -> Self { i32::max(self, other) }
}

/// Per-component min/max/clamp used by bounds and film tile code instead of
/// pulling in a dedicated numeric crate.
pub trait ComponentWiseExt {
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
}

impl ComponentWiseExt for Point2i {
    fn min(self, other: Self) -> Self {
        Point2i::new(self.x.min(other.x), self.y.min(other.y))
    }
    fn max(self, other: Self) -> Self {
        Point2i::new(self.x.max(other.x), self.y.max(other.y))
    }
}

pub mod consts {
    use crate::Float;
    pub const PI: Float = std::f32::consts::PI;
    pub const FRAC_1_PI: Float = std::f32::consts::FRAC_1_PI;
    pub const FRAC_PI_2: Float = std::f32::consts::FRAC_PI_2;
    pub const FRAC_PI_4: Float = std::f32::consts::FRAC_PI_4;
}

pub use crate::math::{lerp, quadratic};
pub use crate::geometry::coordinate_system;

/// Index of the largest-magnitude component, used by the triangle
/// intersection routine to pick which axis to project the ray along.
pub fn max_dimension(v: Vec3f) -> usize {
    if v.x > v.y {
        if v.x > v.z { 0 } else { 2 }
    } else {
        if v.y > v.z { 1 } else { 2 }
    }
}

pub fn permute_vec(v: Vec3f, x: usize, y: usize, z: usize) -> Vec3f {
    Vec3f::new(v[x], v[y], v[z])
}

pub fn permute_point(p: Point3f, x: usize, y: usize, z: usize) -> Point3f {
    Point3f::new(p[x], p[y], p[z])
}

/// Absolute value of the dot product between two (possibly unnormalized)
/// vectors.
pub fn abs_dot(a: Vec3f, b: Vec3f) -> Float {
    use cgmath::InnerSpace;
    a.dot(b).abs()
}

/// Flips `n` so it lies in the same hemisphere as `v`, matching the PBRT
/// `Faceforward` convention used throughout the reflection models.
pub fn faceforward(n: Vec3f, v: Vec3f) -> Vec3f {
    use cgmath::InnerSpace;
    if n.dot(v) < 0.0 { -n } else { n }
}

pub fn spherical_direction(sin_theta: Float, cos_theta: Float, phi: Float) -> Vec3f {
    Vec3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

pub fn spherical_theta(v: Vec3f) -> Float {
    v.z.clamp(-1.0, 1.0).acos()
}

pub fn spherical_phi(v: Vec3f) -> Float {
    let p = v.y.atan2(v.x);
    if p < 0.0 { p + 2.0 * consts::PI } else { p }
}

/// Solves the 2x2 linear system `A x = b`, used to recover texture-space
/// partial derivatives from ray differentials. Returns `None` if `A` is
/// (near) singular.
pub fn solve_linear_system_2x2(a: cgmath::Matrix2<Float>, b: Vec2f) -> Option<Vec2f> {
    let det = a.x.x * a.y.y - a.x.y * a.y.x;
    if det.abs() < 1e-10 {
        return None;
    }
    let inv_det = 1.0 / det;
    let x0 = (a.y.y * b.x - a.x.y * b.y) * inv_det;
    let x1 = (a.x.x * b.y - a.y.x * b.x) * inv_det;
    if x0.is_finite() && x1.is_finite() {
        Some(Vec2f::new(x0, x1))
    } else {
        None
    }
}

/// Offsets a ray origin away from a surface along its geometric normal to
/// avoid immediate self-intersection, using the error-bounded hit point the
/// same way the accelerator's dynamic ray bias does.
pub fn offset_ray_origin(p: &Point3f, p_err: &Vec3f, n: &Normal3, w: &Vec3f) -> Point3f {
    use cgmath::InnerSpace;
    let d = n.0.map(Float::abs).dot(*p_err);
    let mut offset = d * n.0;
    if w.dot(n.0) < 0.0 {
        offset = -offset;
    }
    let mut po = *p + offset;
    for i in 0..3 {
        if offset[i] > 0.0 {
            po[i] = crate::err_float::next_float_up(po[i]);
        } else if offset[i] < 0.0 {
            po[i] = crate::err_float::next_float_down(po[i]);
        }
    }
    po
}

pub fn cast_point2<T, U>(p: Point2<T>) -> Point2<U>
where
    T: NumCast + Copy,
    U: NumCast,
{
    Point2::new(NumCast::from(p.x).unwrap(), NumCast::from(p.y).unwrap())
}
