//! End-to-end scenario tests matching the literal test scenes: an empty
//! background-only scene, a single lit sphere with a known closed-form
//! radiance, a shadowed floor/occluder pair, a perfect mirror, and
//! mid-render cancellation. Grounded on the teacher's
//! `tests/tri_watertight.rs` for the integration-test shape (build a
//! `Scene`, fire rays, assert against ground truth) generalized from a
//! watertightness sweep to closed-form radiance checks.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use bumpalo::Bump;
use cgmath::Zero;

use lumentrace::accel::KdTree;
use lumentrace::camera::PerspectiveCamera;
use lumentrace::film::Film;
use lumentrace::filter::BoxFilter;
use lumentrace::integrator::sppm::{render_sppm, SppmParams};
use lumentrace::integrator::whitted::WhittedIntegrator;
use lumentrace::integrator::{IntegratorRadiance, SamplerIntegrator};
use lumentrace::interaction::HitPoint;
use lumentrace::light::background::ConstantBackground;
use lumentrace::light::distant::DistantLight;
use lumentrace::light::point::PointLight;
use lumentrace::light::Light;
use lumentrace::material::matte::MatteMaterial;
use lumentrace::material::mirror::MirrorMaterial;
use lumentrace::primitive::{GeometricPrimitive, Primitive};
use lumentrace::render::{RenderControl, RenderOutcome, SilentMonitor};
use lumentrace::sampler::random::RandomSampler;
use lumentrace::sampler::Sampler;
use lumentrace::scene::Scene;
use lumentrace::shapes::sphere::Sphere;
use lumentrace::shapes::triangle::TriangleMesh;
use lumentrace::spectrum::Spectrum;
use lumentrace::{Bounds2f, Normal3, Point2f, Point2i, Point3f, Ray, RayDifferential, Transform, Vec3f};

fn empty_prims() -> KdTree<Box<dyn Primitive>> {
    KdTree::build(Vec::new())
}

/// S1 - an empty scene returns exactly the constant background on every ray.
#[test]
fn s1_empty_scene_returns_background() {
    let background = Box::new(ConstantBackground::new(Spectrum::from([0.1, 0.2, 0.3])));
    let scene = Scene::new(empty_prims(), Vec::new(), Some(background));

    let mut sampler: Box<dyn Sampler> = Box::new(RandomSampler::new_with_seed(1, 0));
    let arena = Bump::new();
    let integrator = WhittedIntegrator::new(3);

    for dir in [Vec3f::new(0.0, 0.0, -1.0), Vec3f::new(1.0, 0.0, 0.0), Vec3f::new(0.3, 0.6, 0.2)] {
        let mut ray = RayDifferential { ray: Ray::new(Point3f::new(0.0, 0.0, 0.0), dir), diff: None };
        let radiance = integrator.incident_radiance(&mut ray, &scene, sampler.as_mut(), &arena, 0);
        let rgb = radiance.to_rgb();
        assert_abs_diff_eq!(rgb[0], 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(rgb[1], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(rgb[2], 0.3, epsilon = 1e-6);
    }
}

/// S2 - a unit Lambertian sphere lit by one directional light, evaluated
/// head-on, matches the closed-form `albedo / pi * N.L` with `N.L == 1`.
#[test]
fn s2_single_sphere_directional_light_closed_form() {
    let o2w = Transform::identity();
    let w2o = o2w.inverse();
    let sphere = Sphere::whole(&o2w, &w2o, 1.0);
    let matte = Arc::new(MatteMaterial::new(Spectrum::from([0.8, 0.8, 0.8]), 0.0));
    let prim: Box<dyn Primitive> = Box::new(GeometricPrimitive::new(sphere, Some(matte), None));

    let light: Box<dyn Light> = Box::new(DistantLight::new(Spectrum::new(1.0), Vec3f::new(0.0, 0.0, 1.0)));
    let scene = Scene::new(KdTree::build(vec![prim]), vec![light], None);

    let mut sampler: Box<dyn Sampler> = Box::new(RandomSampler::new_with_seed(1, 0));
    let arena = Bump::new();
    let integrator = WhittedIntegrator::new(3);

    let mut ray = RayDifferential {
        ray: Ray::new(Point3f::new(0.0, 0.0, 5.0), Vec3f::new(0.0, 0.0, -1.0)),
        diff: None,
    };
    let radiance = integrator.incident_radiance(&mut ray, &scene, sampler.as_mut(), &arena, 0);
    let rgb = radiance.to_rgb();
    let expected = 0.8 / std::f32::consts::PI;
    assert_abs_diff_eq!(rgb[0], expected, epsilon = 1e-4);
    assert_abs_diff_eq!(rgb[1], expected, epsilon = 1e-4);
    assert_abs_diff_eq!(rgb[2], expected, epsilon = 1e-4);
}

/// S3 - a point light above an occluder casts a sharp shadow: the floor
/// point directly beneath the occluder sees no direct light, while a point
/// out from under it sees the analytic inverse-square-times-cosine falloff.
#[test]
fn s3_shadow_and_inverse_square_falloff() {
    let floor = quad_mesh(Point3f::new(-5.0, -5.0, 0.0), Point3f::new(5.0, -5.0, 0.0), Point3f::new(5.0, 5.0, 0.0), Point3f::new(-5.0, 5.0, 0.0));
    let occluder = quad_mesh(Point3f::new(-1.0, -1.0, 1.0), Point3f::new(1.0, -1.0, 1.0), Point3f::new(1.0, 1.0, 1.0), Point3f::new(-1.0, 1.0, 1.0));

    let matte = Arc::new(MatteMaterial::new(Spectrum::from([0.7, 0.7, 0.7]), 0.0));
    let mut prims: Vec<Box<dyn Primitive>> = Vec::new();
    for tri in Arc::new(floor).iter_triangles() {
        prims.push(Box::new(GeometricPrimitive::new(tri, Some(matte.clone()), None)));
    }
    for tri in Arc::new(occluder).iter_triangles() {
        prims.push(Box::new(GeometricPrimitive::new(tri, Some(matte.clone()), None)));
    }

    // A point light with intensity 1 so `radiance = 1 / dist^2` matches the
    // scenario's analytic falloff directly (no albedo/pi term - this checks
    // the light/visibility machinery, not the BSDF).
    let light = PointLight::new(Transform::translate(Vec3f::new(0.0, 0.0, 2.0)), Spectrum::new(1.0));
    let scene = Scene::new(KdTree::build(prims), Vec::new(), None);

    let floor_normal = Normal3(Vec3f::new(0.0, 0.0, 1.0));
    let shadowed = HitPoint { p: Point3f::new(0.0, 0.0, 0.0), p_err: Vec3f::zero(), time: 0.0, n: floor_normal };
    let sample = light.sample_incident_radiance(&shadowed, Point2f::new(0.0, 0.0));
    assert!(!sample.vis.unoccluded(&scene), "point directly under the occluder should be shadowed");

    let lit = HitPoint { p: Point3f::new(3.0, 0.0, 0.0), p_err: Vec3f::zero(), time: 0.0, n: floor_normal };
    let sample = light.sample_incident_radiance(&lit, Point2f::new(0.0, 0.0));
    assert!(sample.vis.unoccluded(&scene), "point clear of the occluder should see the light");

    use cgmath::InnerSpace;
    let cos_theta = sample.wi.dot(floor_normal.0);
    let dist2 = 2.0 * 2.0 + 3.0 * 3.0;
    let expected = (1.0 / dist2) * cos_theta;
    let contribution = sample.radiance.to_rgb()[0] * cos_theta;
    assert_abs_diff_eq!(contribution, expected, epsilon = 1e-5);
}

/// S4 - a perfectly specular sphere reflects a constant environment exactly,
/// within the integrator's first recursive bounce.
#[test]
fn s4_mirror_exact_reflection() {
    let o2w = Transform::identity();
    let w2o = o2w.inverse();
    let sphere = Sphere::whole(&o2w, &w2o, 1.0);
    let mirror = Arc::new(MirrorMaterial::new(Spectrum::new(1.0)));
    let prim: Box<dyn Primitive> = Box::new(GeometricPrimitive::new(sphere, Some(mirror), None));

    let c = [0.4, 0.5, 0.6];
    let background = Box::new(ConstantBackground::new(Spectrum::from(c)));
    let scene = Scene::new(KdTree::build(vec![prim]), Vec::new(), Some(background));

    let mut sampler: Box<dyn Sampler> = Box::new(RandomSampler::new_with_seed(1, 0));
    let arena = Bump::new();
    let integrator = WhittedIntegrator::new(3);

    let mut ray = RayDifferential {
        ray: Ray::new(Point3f::new(0.0, 0.0, 5.0), Vec3f::new(0.0, 0.0, -1.0)),
        diff: None,
    };
    let radiance = integrator.incident_radiance(&mut ray, &scene, sampler.as_mut(), &arena, 0);
    let rgb = radiance.to_rgb();
    assert_abs_diff_eq!(rgb[0], c[0], epsilon = 1e-5);
    assert_abs_diff_eq!(rgb[1], c[1], epsilon = 1e-5);
    assert_abs_diff_eq!(rgb[2], c[2], epsilon = 1e-5);
}

/// S6 - cancelling mid-render makes `render_parallel` return promptly with
/// `RenderOutcome::Cancelled`, rather than running every tile to completion.
#[test]
fn s6_cancellation_stops_the_render() {
    let o2w = Transform::identity();
    let w2o = o2w.inverse();
    let sphere = Sphere::whole(&o2w, &w2o, 1.0);
    let matte = Arc::new(MatteMaterial::new(Spectrum::from([0.8, 0.8, 0.8]), 0.0));
    let prim: Box<dyn Primitive> = Box::new(GeometricPrimitive::new(sphere, Some(matte), None));
    let light: Box<dyn Light> = Box::new(DistantLight::new(Spectrum::new(1.0), Vec3f::new(0.0, 0.0, 1.0)));
    let scene = Scene::new(KdTree::build(vec![prim]), vec![light], None);

    let camera_to_world = Transform::camera_look_at(Point3f::new(0.0, 0.0, 5.0), Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 1.0, 0.0));
    let resolution = Point2i::new(64, 64);
    let camera = PerspectiveCamera::new(camera_to_world, resolution, Bounds2f::with_bounds(Point2f::new(-1.0, -1.0), Point2f::new(1.0, 1.0)), (0.0, 1.0), 0.0, 1.0e6, 40.0);

    let film = Film::new(resolution, Bounds2f::with_bounds(Point2f::new(0.0, 0.0), Point2f::new(1.0, 1.0)), BoxFilter::default(), 1.0);
    let sampler = RandomSampler::new_with_seed(256, 0);
    let radiance = WhittedIntegrator::new(3);
    let mut integrator = SamplerIntegrator { camera: Box::new(camera), radiance };

    let control = RenderControl::new();
    let cancel_control = control.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(5));
        cancel_control.cancel();
    });

    let monitor = SilentMonitor::default();
    let outcome = integrator.render_parallel(&scene, &film, sampler, &control, &monitor);
    assert_eq!(outcome, RenderOutcome::Cancelled);

    // The film must still be in a valid, readable state despite the
    // early-out: no panics retrieving the partial image.
    let _img = film.into_image_buffer();
}

/// S5 - in a closed diffuse box lit by a point light, SPPM's per-pixel image
/// error against a high-pass-count reference shrinks monotonically as
/// `num_passes` grows (spec.md §8's SPPM convergence scenario). Every RNG
/// seed SPPM uses is derived deterministically from pass/pixel index, so
/// this comparison is exact and reproducible, not just "usually true".
#[test]
fn s5_sppm_error_decreases_with_more_passes() {
    let scene = cornell_box_scene();
    let (camera, resolution) = cornell_box_camera();
    let sampler = RandomSampler::new_with_seed(7, 0);
    let control = RenderControl::new();
    let monitor = SilentMonitor::default();
    let pixel_bounds = lumentrace::Bounds2i::with_bounds(Point2i::new(0, 0), resolution);

    let render_at = |num_passes: u32| {
        let params = SppmParams {
            num_passes,
            photons_per_pass: 4_000,
            max_caustic_photons_per_pass: 1_000,
            max_gather_photons: 2_000,
            ..SppmParams::default()
        };
        let (film, outcome) = render_sppm(&camera, &scene, &sampler, resolution, pixel_bounds, &params, &control, &monitor);
        assert_eq!(outcome, RenderOutcome::Completed);
        film.into_image_buffer()
    };

    let reference = render_at(64);
    let mse_at = |num_passes: u32| -> f64 {
        let image = render_at(num_passes);
        let mut sum = 0.0f64;
        let mut count = 0u64;
        for (p, r) in image.pixels().zip(reference.pixels()) {
            for c in 0..3 {
                let d = (p.0[c] - r.0[c]) as f64;
                sum += d * d;
                count += 1;
            }
        }
        sum / count.max(1) as f64
    };

    let mse_1 = mse_at(1);
    let mse_4 = mse_at(4);
    let mse_16 = mse_at(16);

    assert!(mse_1 >= mse_4, "error should not increase from 1 to 4 passes: {} < {}", mse_1, mse_4);
    assert!(mse_4 >= mse_16, "error should not increase from 4 to 16 passes: {} < {}", mse_4, mse_16);
}

fn cornell_box_scene() -> Scene {
    let matte = Arc::new(MatteMaterial::new(Spectrum::from([0.7, 0.7, 0.7]), 0.0));
    let mut prims: Vec<Box<dyn Primitive>> = Vec::new();
    let mut add_quad = |a: Point3f, b: Point3f, c: Point3f, d: Point3f, prims: &mut Vec<Box<dyn Primitive>>| {
        for tri in Arc::new(quad_mesh(a, b, c, d)).iter_triangles() {
            prims.push(Box::new(GeometricPrimitive::new(tri, Some(matte.clone()), None)));
        }
    };

    // Floor, ceiling, back wall, left wall, right wall - open on the camera side.
    add_quad(Point3f::new(-1.5, 0.0, -2.0), Point3f::new(1.5, 0.0, -2.0), Point3f::new(1.5, 0.0, 2.0), Point3f::new(-1.5, 0.0, 2.0), &mut prims);
    add_quad(Point3f::new(-1.5, 2.5, 2.0), Point3f::new(1.5, 2.5, 2.0), Point3f::new(1.5, 2.5, -2.0), Point3f::new(-1.5, 2.5, -2.0), &mut prims);
    add_quad(Point3f::new(-1.5, 0.0, -2.0), Point3f::new(-1.5, 2.5, -2.0), Point3f::new(1.5, 2.5, -2.0), Point3f::new(1.5, 0.0, -2.0), &mut prims);
    add_quad(Point3f::new(-1.5, 0.0, 2.0), Point3f::new(-1.5, 2.5, 2.0), Point3f::new(-1.5, 2.5, -2.0), Point3f::new(-1.5, 0.0, -2.0), &mut prims);
    add_quad(Point3f::new(1.5, 0.0, -2.0), Point3f::new(1.5, 2.5, -2.0), Point3f::new(1.5, 2.5, 2.0), Point3f::new(1.5, 0.0, 2.0), &mut prims);

    let light: Box<dyn Light> = Box::new(PointLight::new(Transform::translate(Vec3f::new(0.0, 2.2, 0.0)), Spectrum::new(4.0)));
    Scene::new(KdTree::build(prims), vec![light], None)
}

fn cornell_box_camera() -> (PerspectiveCamera, Point2i) {
    let resolution = Point2i::new(16, 16);
    let camera_to_world = Transform::camera_look_at(Point3f::new(0.0, 1.2, 4.5), Point3f::new(0.0, 1.2, 0.0), Vec3f::new(0.0, 1.0, 0.0));
    let camera = PerspectiveCamera::new(camera_to_world, resolution, Bounds2f::with_bounds(Point2f::new(-1.0, -1.0), Point2f::new(1.0, 1.0)), (0.0, 1.0), 0.0, 1.0e6, 50.0);
    (camera, resolution)
}

fn quad_mesh(a: Point3f, b: Point3f, c: Point3f, d: Point3f) -> TriangleMesh {
    TriangleMesh::new(Transform::identity(), vec![0, 1, 2, 0, 2, 3], vec![a, b, c, d], None, None, None, false)
}
