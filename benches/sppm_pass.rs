//! Benchmarks one SPPM pass (photon shoot + eye pass + radius update) over
//! a small lit-sphere scene, the same shape as `tests/scenarios.rs`'s
//! mirror/sphere scenes but run through `render_sppm` directly.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use lumentrace::accel::KdTree;
use lumentrace::camera::PerspectiveCamera;
use lumentrace::integrator::sppm::{render_sppm, SppmParams};
use lumentrace::light::point::PointLight;
use lumentrace::light::Light;
use lumentrace::material::matte::MatteMaterial;
use lumentrace::primitive::{GeometricPrimitive, Primitive};
use lumentrace::render::{RenderControl, SilentMonitor};
use lumentrace::sampler::random::RandomSampler;
use lumentrace::scene::Scene;
use lumentrace::shapes::sphere::Sphere;
use lumentrace::spectrum::Spectrum;
use lumentrace::{Bounds2f, Bounds2i, Point2f, Point2i, Point3f, Transform, Vec3f};

fn lit_sphere_scene() -> (PerspectiveCamera, Scene) {
    let camera_to_world = Transform::camera_look_at(Point3f::new(0.0, 0.0, 5.0), Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 1.0, 0.0));
    let resolution = Point2i::new(32, 32);
    let camera = PerspectiveCamera::new(camera_to_world, resolution, Bounds2f::with_bounds(Point2f::new(-1.0, -1.0), Point2f::new(1.0, 1.0)), (0.0, 1.0), 0.0, 1.0e6, 40.0);

    let o2w: &'static Transform = Box::leak(Box::new(Transform::identity()));
    let w2o: &'static Transform = Box::leak(Box::new(o2w.inverse()));
    let sphere = Sphere::whole(o2w, w2o, 1.0);
    let matte = Arc::new(MatteMaterial::new(Spectrum::from([0.7, 0.3, 0.3]), 0.0));
    let prim: Box<dyn Primitive> = Box::new(GeometricPrimitive::new(sphere, Some(matte), None));

    let light: Box<dyn Light> = Box::new(PointLight::new(Transform::translate(Vec3f::new(3.0, 3.0, 3.0)), Spectrum::new(10.0)));
    let scene = Scene::new(KdTree::build(vec![prim]), vec![light], None);
    (camera, scene)
}

fn bench_sppm_pass(c: &mut Criterion) {
    let (camera, scene) = lit_sphere_scene();
    let resolution = Point2i::new(32, 32);
    let pixel_bounds = Bounds2i::with_bounds(Point2i::new(0, 0), resolution);
    let sampler = RandomSampler::new_with_seed(1, 0);

    c.bench_function("sppm_single_pass", |b| {
        b.iter(|| {
            let params = SppmParams { num_passes: 1, photons_per_pass: 10_000, max_caustic_photons_per_pass: 10_000, ..SppmParams::default() };
            let control = RenderControl::new();
            let monitor = SilentMonitor::default();
            render_sppm(&camera, &scene, &sampler, resolution, pixel_bounds, &params, &control, &monitor)
        });
    });
}

criterion_group!(benches, bench_sppm_pass);
criterion_main!(benches);
