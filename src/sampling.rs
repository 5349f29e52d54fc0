use crate::{Point2f, Vec2f, Vec3f, Float, Point3f};
use std::f32;
use rand::Rng;

pub const UNIFORM_SPHERE_PDF: Float = crate::consts::FRAC_1_PI * 0.25;

pub fn concentric_sample_disk(u: Point2f) -> Point2f {
    // map sample from [0, 1] to [-1, 1]
    let u_offset = 2.0 * u - Vec2f::new(1.0, 1.0);
    if u_offset == Point2f::new(0.0, 0.0) {
        return Point2f::new(0.0, 0.0);
    }

    let (theta, r) = if u_offset.x.abs() > u_offset.y.abs() {
        (u_offset.x, f32::consts::FRAC_PI_4 * (u_offset.y / u_offset.x))
    } else {
        (u_offset.y, f32::consts::FRAC_PI_2 - f32::consts::FRAC_PI_4 * (u_offset.x / u_offset.y))
    };

    r * Point2f::new(theta.cos(), theta.sin())
}

pub fn cosine_sample_hemisphere(u: Point2f) -> Vec3f {
    let d = concentric_sample_disk(u);
    let z = Float::sqrt(Float::max(0.0, 1.0 - d.x * d.x - d.y * d.y));
    Vec3f::new(d.x, d.y, z)
}

/// Uniformly samples barycentric coordinates over a triangle.
pub fn uniform_sample_triangle(u: Point2f) -> [Float; 2] {
    let su0 = u.x.sqrt();
    [1.0 - su0, u.y * su0]
}

/// Uniformly samples the unit sphere, used to pick an emission direction for
/// delta-position lights shooting photons.
pub fn uniform_sample_sphere(u: Point2f) -> Vec3f {
    let z = 1.0 - 2.0 * u.x;
    let r = Float::sqrt(Float::max(0.0, 1.0 - z * z));
    let phi = 2.0 * crate::consts::PI * u.y;
    Vec3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn rejection_sample_shere(rng: &mut impl Rng, radius: Float) -> Point3f {
    let p = loop {
        let x = rng.gen_range(-radius..radius);
        let y = rng.gen_range(-radius..radius);
        let z = rng.gen_range(-radius..radius);
        let d = x * x + y * y + z * z;
        if d < radius * radius { break Point3f::new(x, y, z) }
    };
    p
}

/// Veach's power heuristic (beta = 2) for combining light- and BSDF-sampling
/// strategies in multiple importance sampling.
pub fn power_heuristic(nf: u32, f_pdf: Float, ng: u32, g_pdf: Float) -> Float {
    let f = nf as Float * f_pdf;
    let g = ng as Float * g_pdf;
    if f == 0.0 && g == 0.0 {
        return 0.0;
    }
    (f * f) / (f * f + g * g)
}

/// Piecewise-constant 1D distribution over a list of non-negative weights,
/// inverted via its CDF by binary search. Used to importance-sample which
/// light a photon is shot from by total emitted power.
pub struct Distribution1D {
    func: Vec<Float>,
    cdf: Vec<Float>,
    pub func_int: Float,
}

impl Distribution1D {
    pub fn new(f: &[Float]) -> Self {
        let n = f.len();
        let mut cdf = vec![0.0; n + 1];
        for i in 1..=n {
            cdf[i] = cdf[i - 1] + f[i - 1] / n as Float;
        }
        let func_int = cdf[n];
        if func_int == 0.0 {
            for (i, c) in cdf.iter_mut().enumerate() {
                *c = i as Float / n as Float;
            }
        } else {
            for c in cdf.iter_mut() {
                *c /= func_int;
            }
        }
        Self { func: f.to_vec(), cdf, func_int }
    }

    pub fn count(&self) -> usize {
        self.func.len()
    }

    /// Samples an index in `[0, count())` with probability proportional to
    /// its weight, and the discrete pmf of that index.
    pub fn sample_discrete(&self, u: Float) -> (usize, Float) {
        let offset = find_interval(&self.cdf, u);
        let pdf = if self.func_int > 0.0 {
            self.func[offset] / (self.func_int * self.count() as Float)
        } else {
            0.0
        };
        (offset, pdf)
    }

    /// The discrete pmf of sampling bucket `i`.
    pub fn discrete_pdf(&self, i: usize) -> Float {
        if self.func_int > 0.0 {
            self.func[i] / (self.func_int * self.count() as Float)
        } else {
            0.0
        }
    }
}

fn find_interval(cdf: &[Float], u: Float) -> usize {
    let mut lo = 0usize;
    let mut hi = cdf.len() - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if cdf[mid] <= u {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo.min(cdf.len() - 2)
}

/// The radical-inverse digit-reversal of `i` in base `base`, the building
/// block of the Halton low-discrepancy sequence.
pub fn radical_inverse(base: u32, mut i: u64) -> Float {
    let inv_base = 1.0 / base as Float;
    let mut inv_bi = inv_base;
    let mut val = 0.0 as Float;
    while i > 0 {
        let digit = (i % base as u64) as Float;
        val += digit * inv_bi;
        i /= base as u64;
        inv_bi *= inv_base;
    }
    val
}

/// A `(2, 3)`-base Halton point, used to stratify per-light direct-lighting
/// samples and BSDF samples more evenly than independent random numbers.
pub fn halton_2d(index: u64) -> Point2f {
    Point2f::new(radical_inverse(2, index), radical_inverse(3, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_heuristic_equal_pdfs() {
        let w = power_heuristic(1, 1.0, 1, 1.0);
        assert!((w - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_power_heuristic_zero() {
        assert_eq!(power_heuristic(1, 0.0, 1, 0.0), 0.0);
    }

    #[test]
    fn test_distribution1d_samples_proportionally() {
        let dist = Distribution1D::new(&[1.0, 3.0]);
        let (i_low, pdf_low) = dist.sample_discrete(0.05);
        assert_eq!(i_low, 0);
        let (i_high, pdf_high) = dist.sample_discrete(0.9);
        assert_eq!(i_high, 1);
        assert!(pdf_high > pdf_low);
    }

    #[test]
    fn test_radical_inverse_base2() {
        assert!((radical_inverse(2, 1) - 0.5).abs() < 1e-6);
        assert!((radical_inverse(2, 2) - 0.25).abs() < 1e-6);
        assert!((radical_inverse(2, 3) - 0.75).abs() < 1e-6);
    }
}
