//! The radiance returned when a ray escapes the scene entirely. Kept
//! separate from the `Light` hierarchy: a background contributes no
//! next-event-estimation sample and needs no importance sampling, it is
//! simply evaluated on a miss.
//!
//! An image-based environment light belongs here conceptually but needs the
//! mipmap/image-wrap machinery that's out of scope for this crate (no image
//! codec I/O); `ConstantBackground` covers the common flat-color case.

use crate::geometry::Ray;
use crate::spectrum::Spectrum;

pub trait Background: Sync + Send {
    fn eval(&self, ray: &Ray) -> Spectrum;
}

pub struct ConstantBackground {
    pub radiance: Spectrum,
}

impl ConstantBackground {
    pub fn new(radiance: Spectrum) -> Self {
        Self { radiance }
    }
}

impl Background for ConstantBackground {
    fn eval(&self, _ray: &Ray) -> Spectrum {
        self.radiance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point3f, Vec3f};

    #[test]
    fn test_constant_background_ignores_ray() {
        let bg = ConstantBackground::new(Spectrum::from([0.1, 0.2, 0.3]));
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vec3f::new(1.0, 0.0, 0.0));
        assert_eq!(bg.eval(&ray).to_rgb(), [0.1, 0.2, 0.3]);
    }
}
