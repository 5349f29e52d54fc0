//! Command-line entry point (spec.md §6): builds one of a handful of
//! canned scenes, renders it with the Whitted integrator, and writes the
//! result to an HDR image. Exit codes follow the external-interface
//! contract: `0` success, `1` scene/init failure, `2` render failure,
//! `3` cancelled.
//!
//! Grounded on the teacher's `src/bin/testrender.rs` for the overall
//! camera/scene/film wiring, restructured behind `clap` (already in the
//! teacher's dependency stack) instead of a hardcoded `main` and widened
//! to return a proper exit code rather than `unwrap()`-ing everything.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use lumentrace::camera::PerspectiveCamera;
use lumentrace::errors::{Error, Result};
use lumentrace::film::Film;
use lumentrace::filter::BoxFilter;
use lumentrace::integrator::whitted::WhittedIntegrator;
use lumentrace::integrator::{IntegratorRadiance, SamplerIntegrator};
use lumentrace::light::background::ConstantBackground;
use lumentrace::light::distant::DistantLight;
use lumentrace::light::point::PointLight;
use lumentrace::light::Light;
use lumentrace::material::matte::MatteMaterial;
use lumentrace::material::mirror::MirrorMaterial;
use lumentrace::primitive::{GeometricPrimitive, Primitive};
use lumentrace::accel::KdTree;
use lumentrace::render::{IndicatifMonitor, RenderControl, RenderOutcome};
use lumentrace::sampler::random::RandomSampler;
use lumentrace::scene::Scene;
use lumentrace::shapes::sphere::Sphere;
use lumentrace::shapes::triangle::TriangleMesh;
use lumentrace::spectrum::Spectrum;
use lumentrace::{Bounds2f, Point2f, Point2i, Point3f, Transform};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ScenePreset {
    /// No primitives; every ray escapes to the constant background.
    Empty,
    /// A single Lambertian sphere lit by one directional light.
    Sphere,
    /// A floor and an occluding quad lit by a point light.
    Shadow,
    /// A perfectly specular sphere reflecting a constant environment.
    Mirror,
}

#[derive(Parser, Debug)]
#[command(about = "Render a canned scene with the Whitted integrator")]
struct Args {
    #[arg(value_enum)]
    scene: ScenePreset,

    #[arg(long, default_value_t = 256)]
    width: u32,

    #[arg(long, default_value_t = 256)]
    height: u32,

    #[arg(long, default_value_t = 16)]
    spp: u32,

    #[arg(long, default_value_t = 5)]
    max_depth: u16,

    #[arg(long, default_value = "render.hdr")]
    out: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match run(&args) {
        Ok(RenderOutcome::Completed) => ExitCode::from(0),
        Ok(RenderOutcome::Cancelled) => {
            tracing::warn!("render cancelled");
            ExitCode::from(3)
        }
        Err(err) => {
            tracing::error!(error = %err, "render failed");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn exit_code_for(err: &Error) -> u8 {
    match err {
        Error::Cancelled => 3,
        Error::Io(_) | Error::DegenerateScene(_) => 2,
        Error::BadParam { .. } | Error::MissingParam(_) | Error::MissingDependency(_) => 1,
    }
}

fn run(args: &Args) -> Result<RenderOutcome> {
    if args.width == 0 || args.height == 0 {
        return Err(Error::BadParam { name: "width/height".into(), reason: "must be nonzero".into() });
    }

    let resolution = Point2i::new(args.width as i32, args.height as i32);
    let (camera, scene) = build_scene(args.scene, resolution)?;

    let film = Film::new(resolution, Bounds2f::with_bounds(Point2f::new(0.0, 0.0), Point2f::new(1.0, 1.0)), BoxFilter::default(), 1.0);

    let sampler = RandomSampler::new_with_seed(args.spp as u64, 1);
    let radiance = WhittedIntegrator::new(args.max_depth);
    let mut integrator = SamplerIntegrator { camera: Box::new(camera), radiance };

    let control = RenderControl::new();
    let monitor = IndicatifMonitor::new(film.sample_bounds().area() as u64);
    let outcome = integrator.render_parallel(&scene, &film, sampler, &control, &monitor);

    if outcome == RenderOutcome::Completed {
        write_image(film, &args.out)?;
    }
    Ok(outcome)
}

fn write_image(film: Film<BoxFilter>, path: &PathBuf) -> Result<()> {
    let img = film.into_image_buffer();
    let file = std::fs::File::create(path)?;
    let encoder = image::hdr::HDREncoder::new(file);
    let pixels: Vec<_> = img.pixels().copied().collect();
    encoder
        .encode(pixels.as_slice(), img.width() as usize, img.height() as usize)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    Ok(())
}

fn camera_for(resolution: Point2i, camera_to_world: Transform) -> PerspectiveCamera {
    let aspect = resolution.x as f32 / resolution.y as f32;
    let screen_window = if aspect > 1.0 {
        Bounds2f::with_bounds(Point2f::new(-aspect, -1.0), Point2f::new(aspect, 1.0))
    } else {
        Bounds2f::with_bounds(Point2f::new(-1.0, -1.0 / aspect), Point2f::new(1.0, 1.0 / aspect))
    };
    PerspectiveCamera::new(camera_to_world, resolution, screen_window, (0.0, 1.0), 0.0, 1.0e6, 40.0)
}

fn build_scene(preset: ScenePreset, resolution: Point2i) -> Result<(PerspectiveCamera, Scene)> {
    match preset {
        ScenePreset::Empty => {
            let camera_to_world = Transform::camera_look_at(Point3f::new(0.0, 0.0, 0.0), Point3f::new(0.0, 0.0, -1.0), (0.0, 1.0, 0.0).into());
            let camera = camera_for(resolution, camera_to_world);
            let prims: KdTree<Box<dyn Primitive>> = KdTree::build(Vec::new());
            let background = Box::new(ConstantBackground::new(Spectrum::from([0.1, 0.2, 0.3])));
            let scene = Scene::new(prims, Vec::new(), Some(background));
            Ok((camera, scene))
        }
        ScenePreset::Sphere => {
            let camera_to_world = Transform::camera_look_at(Point3f::new(0.0, 0.0, 5.0), Point3f::new(0.0, 0.0, 0.0), (0.0, 1.0, 0.0).into());
            let camera = camera_for(resolution, camera_to_world);

            let o2w = Transform::identity();
            let w2o = o2w.inverse();
            let sphere = Sphere::whole(Box::leak(Box::new(o2w)), Box::leak(Box::new(w2o)), 1.0);
            let matte = Arc::new(MatteMaterial::new(Spectrum::from([0.8, 0.8, 0.8]), 0.0));
            let prim: Box<dyn Primitive> = Box::new(GeometricPrimitive::new(sphere, Some(matte), None));

            let light: Box<dyn Light> = Box::new(DistantLight::new(Spectrum::new(1.0), (0.0, 0.0, 1.0).into()));

            let prims = KdTree::build(vec![prim]);
            let scene = Scene::new(prims, vec![light], None);
            Ok((camera, scene))
        }
        ScenePreset::Shadow => {
            let camera_to_world = Transform::camera_look_at(Point3f::new(0.0, -6.0, 4.0), Point3f::new(0.0, 0.0, 0.0), (0.0, 0.0, 1.0).into());
            let camera = camera_for(resolution, camera_to_world);

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

            let light: Box<dyn Light> = Box::new(PointLight::new(Transform::translate((0.0, 0.0, 2.0).into()), Spectrum::new(1.0)));

            let tree = KdTree::build(prims);
            let scene = Scene::new(tree, vec![light], None);
            Ok((camera, scene))
        }
        ScenePreset::Mirror => {
            let camera_to_world = Transform::camera_look_at(Point3f::new(0.0, 0.0, 5.0), Point3f::new(0.0, 0.0, 0.0), (0.0, 1.0, 0.0).into());
            let camera = camera_for(resolution, camera_to_world);

            let o2w = Transform::identity();
            let w2o = o2w.inverse();
            let sphere = Sphere::whole(Box::leak(Box::new(o2w)), Box::leak(Box::new(w2o)), 1.0);
            let mirror = Arc::new(MirrorMaterial::new(Spectrum::new(1.0)));
            let prim: Box<dyn Primitive> = Box::new(GeometricPrimitive::new(sphere, Some(mirror), None));

            let background = Box::new(ConstantBackground::new(Spectrum::from([0.4, 0.5, 0.6])));
            let prims = KdTree::build(vec![prim]);
            let scene = Scene::new(prims, Vec::new(), Some(background));
            Ok((camera, scene))
        }
    }
}

fn quad_mesh(a: Point3f, b: Point3f, c: Point3f, d: Point3f) -> TriangleMesh {
    TriangleMesh::new(Transform::identity(), vec![0, 1, 2, 0, 2, 3], vec![a, b, c, d], None, None, None, false)
}
