/// Convenience macro for building a `Vec3f` from literals of any numeric type.
#[macro_export]
macro_rules! vec3f {
    ($x:expr, $y:expr, $z:expr) => {
        $crate::Vec3f::new($x as $crate::Float, $y as $crate::Float, $z as $crate::Float)
    };
}

#[macro_export]
macro_rules! point3f {
    ( ($x:expr , $y:expr , $z:expr) ) => { $crate::Point3f::new($x as $crate::Float, $y as $crate::Float, $z as $crate::Float) };
    ($x:expr , $y:expr , $z:expr) => { $crate::Point3f::new($x as $crate::Float, $y as $crate::Float, $z as $crate::Float) };
}

#[macro_export]
macro_rules! bounds3f {
    ( $p1:tt, $p2:tt ) => {
       $crate::Bounds3f::with_bounds($crate::point3f![$p1], $crate::point3f![$p2])
    };
}

/// `x * x`, shorter than typing the multiplication out at every call site in
/// the microfacet and Fresnel math.
#[macro_export]
macro_rules! sq {
    ($x:expr) => {
        $x * $x
    };
}
