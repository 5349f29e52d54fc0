use crate::{Float, Point3f, Vec3f};
use cgmath::InnerSpace;

pub mod bounds;
pub mod transform;

pub use transform::{Transform, Transformable};

/// A surface normal. Kept as its own newtype (rather than a bare `Vec3f`) so
/// it transforms by the inverse transpose instead of the forward matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normal3(pub Vec3f);

impl Normal3 {
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Normal3(Vec3f::new(x, y, z))
    }

    pub fn zero() -> Self {
        Normal3(Vec3f::new(0.0, 0.0, 0.0))
    }

    pub fn normalize(&self) -> Self {
        Normal3(self.0.normalize())
    }

    pub fn dot(&self, v: Vec3f) -> Float {
        self.0.dot(v)
    }

    pub fn cross(&self, v: Vec3f) -> Vec3f {
        self.0.cross(v)
    }

    /// Flips the normal so it lies in the same hemisphere as `v`.
    pub fn faceforward(&self, v: Vec3f) -> Normal3 {
        if self.0.dot(v) < 0.0 { Normal3(-self.0) } else { *self }
    }
}

impl std::ops::Neg for Normal3 {
    type Output = Normal3;
    fn neg(self) -> Self::Output { Normal3(-self.0) }
}

impl std::ops::Sub for Normal3 {
    type Output = Normal3;
    fn sub(self, rhs: Self) -> Self::Output { Normal3(self.0 - rhs.0) }
}

impl std::ops::Add for Normal3 {
    type Output = Normal3;
    fn add(self, rhs: Self) -> Self::Output { Normal3(self.0 + rhs.0) }
}

impl std::ops::Mul<Float> for Normal3 {
    type Output = Normal3;
    fn mul(self, rhs: Float) -> Self::Output { Normal3(self.0 * rhs) }
}

impl std::ops::Mul<Normal3> for Float {
    type Output = Normal3;
    fn mul(self, rhs: Normal3) -> Self::Output { Normal3(rhs.0 * self) }
}

impl std::ops::Index<usize> for Normal3 {
    type Output = Float;
    fn index(&self, i: usize) -> &Float { &self.0[i] }
}

impl std::ops::Deref for Normal3 {
    type Target = Vec3f;
    fn deref(&self) -> &Vec3f { &self.0 }
}

impl From<Normal3> for Vec3f {
    fn from(n: Normal3) -> Self { n.0 }
}

impl From<Vec3f> for Normal3 {
    fn from(v: Vec3f) -> Self { Normal3(v) }
}

/// A ray with its parametric range and the time it was sampled at
/// (hook for future motion blur; unused today but kept so camera and
/// transform code don't need to be revisited when it lands).
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3f,
    pub dir: Vec3f,
    pub t_min: Float,
    pub t_max: Float,
    pub time: Float,
}

impl Ray {
    pub fn new(origin: Point3f, dir: Vec3f) -> Self {
        Self { origin, dir, t_min: 0.0, t_max: crate::math::INFINITY, time: 0.0 }
    }

    pub fn at(&self, t: Float) -> Point3f {
        self.origin + self.dir * t
    }
}

/// Screen-space partial derivatives of a ray, used to estimate texture
/// footprints and anti-alias specular/glossy bounces.
#[derive(Clone, Copy, Debug)]
pub struct Differential {
    pub rx_origin: Point3f,
    pub rx_dir: Vec3f,
    pub ry_origin: Point3f,
    pub ry_dir: Vec3f,
}

#[derive(Clone, Copy, Debug)]
pub struct RayDifferential {
    pub ray: Ray,
    pub diff: Option<Differential>,
}

impl RayDifferential {
    pub fn new(ray: Ray) -> Self {
        Self { ray, diff: None }
    }

    pub fn scale_differentials(&mut self, s: Float) {
        if let Some(diff) = &mut self.diff {
            diff.rx_origin = self.ray.origin + (diff.rx_origin - self.ray.origin) * s;
            diff.ry_origin = self.ray.origin + (diff.ry_origin - self.ray.origin) * s;
            diff.rx_dir = self.ray.dir + (diff.rx_dir - self.ray.dir) * s;
            diff.ry_dir = self.ray.dir + (diff.ry_dir - self.ray.dir) * s;
        }
    }
}

impl std::ops::Deref for RayDifferential {
    type Target = Ray;
    fn deref(&self) -> &Ray { &self.ray }
}

impl std::ops::DerefMut for RayDifferential {
    fn deref_mut(&mut self) -> &mut Ray { &mut self.ray }
}

/// Builds an orthonormal basis around a normalized vector, used to turn a
/// disk or hemisphere sample into world-space directions.
pub fn coordinate_system(v1: Vec3f) -> (Vec3f, Vec3f) {
    let v2 = if v1.x.abs() > v1.y.abs() {
        Vec3f::new(-v1.z, 0.0, v1.x) / (v1.x * v1.x + v1.z * v1.z).sqrt()
    } else {
        Vec3f::new(0.0, v1.z, -v1.y) / (v1.y * v1.y + v1.z * v1.z).sqrt()
    };
    let v3 = v1.cross(v2);
    (v2, v3)
}
