//! Benchmarks kd-tree SAH construction over a range of primitive counts,
//! grounded on the teacher's `benches/` absence but following criterion's
//! standard `BenchmarkGroup` idiom (already in the teacher's dev-dependency
//! stack) for input-size sweeps.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use lumentrace::accel::KdTree;
use lumentrace::material::matte::MatteMaterial;
use lumentrace::primitive::{GeometricPrimitive, Primitive};
use lumentrace::shapes::sphere::Sphere;
use lumentrace::spectrum::Spectrum;
use lumentrace::{Transform, Vec3f};
use std::sync::Arc;

fn scattered_spheres(n: usize) -> Vec<Box<dyn Primitive>> {
    let matte = Arc::new(MatteMaterial::new(Spectrum::from([0.5, 0.5, 0.5]), 0.0));
    (0..n)
        .map(|i| {
            let f = i as f32;
            let translation = Vec3f::new((f * 1.618).fract() * 20.0 - 10.0, (f * 2.718).fract() * 20.0 - 10.0, (f * 3.14159).fract() * 20.0 - 10.0);
            let o2w: &'static Transform = Box::leak(Box::new(Transform::translate(translation)));
            let w2o: &'static Transform = Box::leak(Box::new(o2w.inverse()));
            let sphere = Sphere::whole(o2w, w2o, 0.5);
            Box::new(GeometricPrimitive::new(sphere, Some(matte.clone()), None)) as Box<dyn Primitive>
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_build");
    for &n in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(|| scattered_spheres(n), |prims| KdTree::build(prims), criterion::BatchSize::LargeInput);
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
