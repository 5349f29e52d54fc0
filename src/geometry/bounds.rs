use cgmath::{Point2, Point3, Vector2, Vector3};
use crate::{Scalar, Vec3f, Point2i, ComponentWiseExt, Float};
use crate::geometry::Ray;
use crate::err_float::gamma;
use std::mem::swap;

pub type Bounds2f = Bounds2<f32>;
pub type Bounds2i = Bounds2<i32>;
pub type Bounds3f = Bounds3<f32>;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Bounds2<S: Scalar> {
    pub min: Point2<S>,
    pub max: Point2<S>
}

impl<S: Scalar> Bounds2<S> {

    pub fn empty() -> Self {
        Self {
            min: Point2::new(S::max_value(), S::max_value()),
            max: Point2::new(S::min_value(), S::min_value()),
        }
    }

    pub fn with_bounds(min: Point2<S>, max: Point2<S>) -> Self {
        Self { min, max }
    }

    pub fn diagonal(&self) -> Vector2<S> {
        self.max - self.min
    }

    pub fn area(&self) -> S {
        let d = self.diagonal();
        d.x * d.y
    }

    pub fn intersection(&self, other: &Bounds2<S>) -> Bounds2<S> {
        let min = Point2::<S>::new(
            Scalar::max(self.min.x, other.min.x),
            Scalar::max(self.min.y, other.min.y),
        );
        let max = Point2::<S>::new(
            Scalar::min(self.max.x, other.max.x),
            Scalar::min(self.max.y, other.max.y),
        );
        Self::with_bounds(min, max)
    }

    pub fn dimensions(&self) -> (S, S) {
        let x = self.max.x - self.min.x;
        let y = self.max.y - self.min.y;
        (x, y)
    }
}

impl<S: Scalar, T> From<(T, T)> for Bounds2<S> where Point2<S>: From<T> {
    fn from(t: (T, T)) -> Self {
        Self::with_bounds(t.0.into(), t.1.into())
    }
}

impl Bounds2<i32> {
    pub fn iter_points(self) -> impl Iterator<Item=(i32, i32)> {
        let x1 = self.min.x;
        let x2 = self.max.x;
        let y1 = self.min.y;
        let y2 = self.max.y;

        (x1..x2).flat_map(move |x| (y1..y2).map(move |y| (x, y)))
    }

    pub fn iter_tiles(self, tile_size: usize) -> impl Iterator<Item=Bounds2i> {
        let xmin = self.min.x;
        let xmax = self.max.x;
        let ymin = self.min.y;
        let ymax = self.max.y;

        (xmin..xmax).step_by(tile_size)
            .flat_map(move |x| (ymin..ymax).step_by(tile_size).map(move |y| {
                let min = Point2i::new(x, y);
                let max = Point2i::new(x + tile_size as i32, y + tile_size as i32).min(self.max);
                Bounds2i::with_bounds(min, max)
            }))
    }
}

#[derive(Clone, Copy, PartialEq)]
pub struct Bounds3<S: Scalar> {
    pub min: Point3<S>,
    pub max: Point3<S>
}

impl <S: Scalar> Bounds3<S> {
    pub fn with_bounds(min: Point3<S>, max: Point3<S>) -> Self {
        Self {min, max}
    }

    pub fn empty() -> Self {
        Self::with_bounds(
            Point3::new(S::max_value(), S::max_value(), S::max_value()),
            Point3::new(S::min_value(), S::min_value(), S::min_value()),
        )
    }

    pub fn join(&self, other: &Self) -> Self {
        Self::with_bounds(
            Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            )

        )
    }

    pub fn join_point(&self, point: &Point3<S>) -> Self {
        Self::with_bounds(
            Point3::new(
                self.min.x.min(point.x),
                self.min.y.min(point.y),
                self.min.z.min(point.z),
            ),

            Point3::new(
                self.max.x.max(point.x),
                self.max.y.max(point.y),
                self.max.z.max(point.z),
            )
        )
    }

    pub fn centroid(&self) -> Point3<S> {
        self.min + (self.diagonal() / (S::one() + S::one()))
    }

    pub fn diagonal(&self) -> Vector3<S> {
        self.max - self.min
    }

    pub fn maximum_extent(&self) -> u8 {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    pub fn is_point(&self) -> bool {
        self.max == self.min
    }

    pub fn iter_corners(&self) -> impl Iterator<Item = Point3<S>> + '_ {
        (0..8).map(move |i| {
            Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }
}

impl Bounds3<f32> {

    /// Inflates each side by a small relative fraction, matching the kd-tree
    /// build's requirement that the root bound strictly contain every
    /// primitive bound even after floating point roundoff.
    pub fn expand(&self, delta: Float) -> Self {
        let d = Vec3f::new(delta, delta, delta);
        Self::with_bounds(self.min - d, self.max + d)
    }

    pub fn surface_area(&self) -> Float {
        let d = self.diagonal();
        if d.x < 0.0 || d.y < 0.0 || d.z < 0.0 {
            return 0.0;
        }
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// The overlap of two bounds; may have negative extent on some axis if
    /// they don't actually overlap there (callers check `surface_area`).
    pub fn intersection(&self, other: &Self) -> Self {
        Self::with_bounds(
            Point3::new(
                self.min.x.max(other.min.x),
                self.min.y.max(other.min.y),
                self.min.z.max(other.min.z),
            ),
            Point3::new(
                self.max.x.min(other.max.x),
                self.max.y.min(other.max.y),
                self.max.z.min(other.max.z),
            ),
        )
    }

    pub fn offset(&self, p: &Point3<f32>) -> Vec3f {
        let mut o = p - self.min;
        if self.max.x > self.min.x { o.x /= self.max.x - self.min.x };
        if self.max.y > self.min.y { o.y /= self.max.y - self.min.y };
        if self.max.z > self.min.z { o.z /= self.max.z - self.min.z };
        o
    }

    pub fn bounding_sphere(&self) -> (Point3<f32>, Float) {
        let center = self.centroid();
        let radius = if self.inside(&center) {
            (self.max - center).using_euclidean_norm()
        } else {
            0.0
        };
        (center, radius)
    }

    pub fn inside(&self, p: &Point3<f32>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    pub fn intersect_test(&self, ray: &Ray) -> Option<(f32, f32)> {
        let mut t0 = ray.t_min;
        let mut t1 = ray.t_max;

        for i in 0..3 {
            let inv_ray_dir = 1.0 / ray.dir[i];
            let mut t_near = (self.min[i] - ray.origin[i]) * inv_ray_dir;
            let mut t_far = (self.max[i] - ray.origin[i]) * inv_ray_dir;

            if t_near > t_far { swap(&mut t_near, &mut t_far) }

            // expand t_far to account for fp error
            t_far *= 1.0 + 2.0 * gamma(3);

            t0 = f32::max(t0, t_near);
            t1 = f32::min(t1, t_far);
            if t0 > t1 { return None; }
        }
        Some((t0, t1))
    }
}

trait EuclideanNorm {
    fn using_euclidean_norm(&self) -> Float;
}

impl EuclideanNorm for Vec3f {
    fn using_euclidean_norm(&self) -> Float {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl<S: Scalar> std::fmt::Debug for Bounds3<S>{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Bounds3f[{:?}, {:?}]", [self.min.x, self.min.y, self.min.z], [self.max.x, self.max.y, self.max.z])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::bounds::Bounds3f;
    use crate::geometry::Ray;
    use crate::Point2i;

    #[test]
    fn test_bounds_iter() {
        let bounds = Bounds2i::with_bounds(Point2i::new(-1, -2), Point2i::new(1, 1));
        let points: Vec<_> = bounds.iter_points().collect();
        let expected = vec![(-1, -2), (-1, -1), (-1, 0), (0, -2), (0, -1), (0, 0)];
        assert_eq!(expected, points);
    }

    #[test]
    fn test_bounds_iter_tiles() {
        let small_bounds = Bounds2i::with_bounds((0, 0).into(), (2, 2).into());

        let single_tiles = vec![
            Bounds2i::with_bounds((0, 0).into(), (1, 1).into()),
            Bounds2i::with_bounds((0, 1).into(), (1, 2).into()),
            Bounds2i::with_bounds((1, 0).into(), (2, 1).into()),
            Bounds2i::with_bounds((1, 1).into(), (2, 2).into()),
        ];

        assert_eq!(small_bounds.iter_tiles(1).collect::<Vec<_>>(), single_tiles);

        let big_bounds = Bounds2i::with_bounds((0, 0).into(), (100, 100).into());

        for &tile_size in &[1, 5, 7, 16] {
            let total_tile_area = big_bounds.iter_tiles(tile_size)
                .map(|tile| tile.area())
                .sum();

            assert_eq!(big_bounds.area(), total_tile_area);
        }
    }

    #[test]
    fn test_bounds3f_intersect() {
        let bounds = bounds3f!((1, 1, 1), (2, 2, 2));
        let ray = Ray::new(point3f!(0, 0, 0), vec3f!(1, 1, 1));

        assert_eq!(bounds.intersect_test(&ray), Some((1.0, 2.0)));

        let bounds = bounds3f!((-0.5, -0.5, -0.5), (0.5, 0.5, 0.5));
        let ray = Ray::new(point3f!(0, 0, -2), vec3f!(0, 0, 1));

        assert_eq!(bounds.intersect_test(&ray), Some((1.5, 2.5)));

        let bounds = bounds3f!((1, 1, 1), (2, 2, 2));
        let ray = Ray::new(point3f!(0, 0, 0), vec3f!(-1, 1, 1));

        assert_eq!(bounds.intersect_test(&ray), None);

        let bounds = bounds3f!((1, 1, 1), (2, 2, 2));
        let ray = Ray::new(point3f!(1, 1, 1), vec3f!(1, 0, 0));

        assert_eq!(bounds.intersect_test(&ray), Some((0.0, 1.0)));
    }

    #[test]
    fn test_expand_contains_original() {
        let b = bounds3f!((0, 0, 0), (1, 1, 1));
        let expanded = b.expand(0.001);
        assert!(expanded.min.x < b.min.x && expanded.max.x > b.max.x);
    }
}
