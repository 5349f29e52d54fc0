use crate::Float;
use crate::geometry::{Transform, Ray, Transformable};
use crate::shapes::Shape;
use crate::geometry::bounds::Bounds3;
use crate::interaction::{SurfaceInteraction, DiffGeom};
use crate::err_float::EFloat;
use crate::{Point3f, Point2f, Normal3, Vec3f, quadratic, consts};
use cgmath::{EuclideanSpace, InnerSpace};

pub struct Sphere<'t> {
    object_to_world: &'t Transform,
    world_to_object: &'t Transform,
    reverse_orientation: bool,

    radius: Float,
    z_min: Float,
    z_max: Float,
    theta_min: Float,
    theta_max: Float,
    phi_max: Float
}

impl<'t> Sphere<'t> {
    pub fn new(
        object_to_world: &'t Transform,
        world_to_object: &'t Transform,
        reverse_orientation: bool,
        radius: Float,
        z_min: Float,
        z_max: Float,
        phi_max: Float
    ) -> Self {
        Self {
            object_to_world, world_to_object, reverse_orientation,
            radius,
            z_min: Float::min(z_min, z_max).clamp(-radius, radius),

            z_max: Float::max(z_min, z_max).clamp(-radius, radius),
            theta_min: Float::clamp(z_min / radius, -1.0, 1.0).acos(),
            theta_max: Float::clamp(z_max / radius, -1.0, 1.0).acos(),
            phi_max: phi_max.clamp(0.0, 360.0).to_radians()
        }
    }

    /// A full, unclipped sphere - the common case for light shapes and test
    /// scenes where partial spheres aren't needed.
    pub fn whole(object_to_world: &'t Transform, world_to_object: &'t Transform, radius: Float) -> Self {
        Self::new(object_to_world, world_to_object, false, radius, -radius, radius, 360.0)
    }
}

impl<'t> Shape for Sphere<'t> {
    fn object_bound(&self) -> Bounds3<f32> {
        bounds3f!((-self.radius, -self.radius, self.z_min), (self.radius, self.radius, self.z_max))
    }

    fn object_to_world(&self) -> &Transform {
        self.object_to_world
    }

    fn world_to_object(&self) -> &Transform {
        self.world_to_object
    }

    fn reverse_orientation(&self) -> bool {
        self.reverse_orientation
    }

    fn area(&self) -> Float {
        self.phi_max * self.radius * (self.z_max - self.z_min)
    }

    fn intersect(&self, ray: &Ray) -> Option<(Float, SurfaceInteraction)> {
        // Transform the ray into object space, tracking conservative error
        // bounds on the origin the same way the error-bounded quadratic
        // solver tracks error on its roots.
        let (oerr, oerrv) = self.world_to_object.tf_exact_to_err(ray.origin);
        let (dir, direrv) = self.world_to_object.tf_exact_to_err(ray.dir);

        let ox = EFloat::with_err(oerr.x, oerrv.x);
        let oy = EFloat::with_err(oerr.y, oerrv.y);
        let oz = EFloat::with_err(oerr.z, oerrv.z);
        let dx = EFloat::with_err(dir.x, direrv.x);
        let dy = EFloat::with_err(dir.y, direrv.y);
        let dz = EFloat::with_err(dir.z, direrv.z);

        let a = dx * dx + dy * dy + dz * dz;
        let b = 2.0 * (dx * ox + dy * oy + dz * oz);
        let c = ox * ox + oy * oy + oz * oz - EFloat::new(self.radius) * EFloat::new(self.radius);

        let (t0, t1) = quadratic(a, b, c)?;

        if t0.upper_bound() > ray.t_max || t1.lower_bound() <= 0.0 {
            return None;
        }
        let mut t_shape_hit = t0;
        if t_shape_hit.lower_bound() <= 0.0 {
            t_shape_hit = t1;
            if t_shape_hit.upper_bound() > ray.t_max {
                return None;
            }
        }

        let compute_hit = |t_shape_hit: EFloat| -> (Point3f, Float) {
            let v = Vec3f::new(ox.v, oy.v, oz.v) + Vec3f::new(dx.v, dy.v, dz.v) * t_shape_hit.v;
            // Refine the hit point to lie exactly on the sphere surface.
            let v = v * (self.radius / v.magnitude());
            let mut p_hit = Point3f::new(v.x, v.y, v.z);
            if p_hit.x == 0.0 && p_hit.y == 0.0 {
                p_hit.x = 1.0e-5 * self.radius;
            }
            let mut phi = p_hit.y.atan2(p_hit.x);
            if phi < 0.0 { phi += 2.0 * consts::PI; }
            (p_hit, phi)
        };

        let (mut p_hit, mut phi) = compute_hit(t_shape_hit);

        // Test against clipping parameters; if the first root fails, retry
        // with the second.
        let clipped = (self.z_min > -self.radius && p_hit.z < self.z_min)
            || (self.z_max < self.radius && p_hit.z > self.z_max)
            || phi > self.phi_max;
        if clipped {
            if t_shape_hit.v == t1.v { return None; }
            if t1.upper_bound() > ray.t_max { return None; }
            t_shape_hit = t1;
            let (p2, phi2) = compute_hit(t_shape_hit);
            p_hit = p2;
            phi = phi2;
            let clipped2 = (self.z_min > -self.radius && p_hit.z < self.z_min)
                || (self.z_max < self.radius && p_hit.z > self.z_max)
                || phi > self.phi_max;
            if clipped2 { return None; }
        }

        // Parametric representation and partial derivatives.
        let u = phi / self.phi_max;
        let theta = Float::clamp(p_hit.z / self.radius, -1.0, 1.0).acos();
        let v = (theta - self.theta_min) / (self.theta_max - self.theta_min);

        let z_radius = (p_hit.x * p_hit.x + p_hit.y * p_hit.y).sqrt();
        let inv_z_radius = 1.0 / z_radius;
        let cos_phi = p_hit.x * inv_z_radius;
        let sin_phi = p_hit.y * inv_z_radius;
        let dpdu = Vec3f::new(-self.phi_max * p_hit.y, self.phi_max * p_hit.x, 0.0);
        let dpdv = (self.theta_max - self.theta_min)
            * Vec3f::new(p_hit.z * cos_phi, p_hit.z * sin_phi, -self.radius * theta.sin());

        let p_err = crate::err_float::gamma(5) * p_hit.to_vec().map(Float::abs);

        let n = Normal3(p_hit.to_vec().normalize());
        let diff_geom = DiffGeom {
            dpdu,
            dpdv,
            dndu: Normal3::new(0.0, 0.0, 0.0),
            dndv: Normal3::new(0.0, 0.0, 0.0),
        };

        let mut isect = SurfaceInteraction::new(
            p_hit,
            p_err,
            ray.time,
            Point2f::new(u, v),
            -dir,
            n,
            diff_geom,
        );

        if self.flip_normals() {
            isect.hit.n = -isect.hit.n;
            isect.n = -isect.n;
            isect.shading_n = -isect.shading_n;
        }

        let isect = isect.transform(*self.object_to_world);
        Some((t_shape_hit.v, isect))
    }

    fn intersect_test(&self, ray: &Ray) -> bool {
        // Cheaper existence-only test, same math as `intersect` without
        // building the surface interaction.
        let (oerr, oerrv) = self.world_to_object.tf_exact_to_err(ray.origin);
        let (dir, direrv) = self.world_to_object.tf_exact_to_err(ray.dir);

        let ox = EFloat::with_err(oerr.x, oerrv.x);
        let oy = EFloat::with_err(oerr.y, oerrv.y);
        let oz = EFloat::with_err(oerr.z, oerrv.z);
        let dx = EFloat::with_err(dir.x, direrv.x);
        let dy = EFloat::with_err(dir.y, direrv.y);
        let dz = EFloat::with_err(dir.z, direrv.z);

        let a = dx * dx + dy * dy + dz * dz;
        let b = 2.0 * (dx * ox + dy * oy + dz * oz);
        let c = ox * ox + oy * oy + oz * oz - EFloat::new(self.radius) * EFloat::new(self.radius);

        let (t0, t1) = match quadratic(a, b, c) {
            Some(r) => r,
            None => return false,
        };

        if t0.upper_bound() > ray.t_max || t1.lower_bound() <= 0.0 {
            return false;
        }
        let mut t_shape_hit = t0;
        if t_shape_hit.lower_bound() <= 0.0 {
            t_shape_hit = t1;
            if t_shape_hit.upper_bound() > ray.t_max {
                return false;
            }
        }

        // For a whole, unclipped sphere (the common case) any root in range
        // is a hit; clipped spheres fall back to the full intersection test.
        if self.z_min <= -self.radius && self.z_max >= self.radius && self.phi_max >= 2.0 * consts::PI - 1.0e-6 {
            return true;
        }
        self.intersect(ray).is_some()
    }

    fn sample(&self, u: Point2f) -> crate::interaction::HitPoint {
        use crate::sampling::uniform_sample_sphere;
        let p_obj = Point3f::new(0.0, 0.0, 0.0) + self.radius * uniform_sample_sphere(u);
        let mut n = Normal3(p_obj.to_vec().normalize());
        if self.reverse_orientation {
            n = -n;
        }
        let p_err = crate::err_float::gamma(5) * p_obj.to_vec().map(Float::abs);

        let p_world = self.object_to_world.transform(p_obj);
        let n_world = self.object_to_world.transform(n).normalize();
        crate::interaction::HitPoint {
            p: p_world,
            p_err,
            time: 0.0,
            n: n_world,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_sphere_intersect() {
        let identity = Transform::IDENTITY;
        let sphere = Sphere::whole(&identity, &identity, 1.0);
        let ray = Ray::new(Point3f::new(0.0, 0.0, -5.0), Vec3f::new(0.0, 0.0, 1.0));
        let (t, isect) = sphere.intersect(&ray).expect("ray through origin should hit unit sphere");
        assert!((t - 4.0).abs() < 1e-3);
        assert!((isect.hit.p.z - (-1.0)).abs() < 1e-3);
    }

    #[test]
    fn test_unit_sphere_miss() {
        let identity = Transform::IDENTITY;
        let sphere = Sphere::whole(&identity, &identity, 1.0);
        let ray = Ray::new(Point3f::new(5.0, 5.0, -5.0), Vec3f::new(0.0, 0.0, 1.0));
        assert!(sphere.intersect(&ray).is_none());
        assert!(!sphere.intersect_test(&ray));
    }
}
