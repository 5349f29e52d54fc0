//! Homogeneous participating media attached to a material's inside/outside
//! interfaces. Grounded on the original renderer's `VolumeHandler`
//! interface: a dielectric surface (glass) hands transmitted rays to its
//! volume handler, which attenuates the ray's color over distance and may
//! stochastically scatter it.

use crate::spectrum::Spectrum;
use crate::{Float, Ray};

pub struct VolumeSample {
    pub s1: Float,
    pub s2: Float,
}

pub trait VolumeHandler: Sync + Send {
    /// Attenuation factor applied to light travelling the full length of
    /// `ray` (`ray.t_min..ray.t_max`) through the medium.
    fn transmittance(&self, ray: &Ray) -> Spectrum;

    /// Optionally scatters `ray` to a new direction partway through the
    /// medium, returning the scattered ray and the color to apply. Returns
    /// `None` when the ray passes straight through unscattered.
    fn scatter(&self, ray: &Ray, sample: VolumeSample) -> Option<(Ray, Spectrum)>;
}

/// Beer-Lambert absorption with no scattering - the common case for tinted
/// glass and liquids.
pub struct BeerVolumeHandler {
    /// Absorption coefficient per unit distance, one per color channel.
    pub sigma_a: Spectrum,
}

impl BeerVolumeHandler {
    /// Solves `absorption_color = exp(-sigma_a * absorption_dist)` for
    /// `sigma_a`, so a user-specified "color at distance d" is easy to
    /// author without reasoning about extinction coefficients directly.
    pub fn new(absorption_color: Spectrum, absorption_dist: Float) -> Self {
        let sigma_a = if absorption_dist > 0.0 {
            let c = absorption_color.clamp(1.0e-4, 1.0).to_rgb();
            Spectrum::from([
                -c[0].ln() / absorption_dist,
                -c[1].ln() / absorption_dist,
                -c[2].ln() / absorption_dist,
            ])
        } else {
            Spectrum::new(0.0)
        };
        Self { sigma_a }
    }
}

impl VolumeHandler for BeerVolumeHandler {
    fn transmittance(&self, ray: &Ray) -> Spectrum {
        use cgmath::InnerSpace;
        let dist = (ray.t_max - ray.t_min) * ray.dir.magnitude();
        let atten = self.sigma_a * -dist;
        let rgb = atten.to_rgb();
        Spectrum::from([rgb[0].exp(), rgb[1].exp(), rgb[2].exp()])
    }

    fn scatter(&self, _ray: &Ray, _sample: VolumeSample) -> Option<(Ray, Spectrum)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point3f;

    #[test]
    fn test_beer_attenuates_with_distance() {
        let handler = BeerVolumeHandler::new(Spectrum::new(0.5), 1.0);
        let mut ray = Ray::new(Point3f::new(0.0, 0.0, 0.0), crate::Vec3f::new(0.0, 0.0, 1.0));
        ray.t_max = 2.0;
        let t = handler.transmittance(&ray);
        assert!(t.max_component_value() < 0.5);
    }
}
