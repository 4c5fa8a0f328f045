use nalgebra::{Point3, Vector3};

pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    nalgebra::distance(a, b)
}

/// The angle at `vertex` formed by `a` and `b`, in degrees.
///
/// Returns `None` when either arm has zero length.
pub fn angle_degrees(a: &Point3<f64>, vertex: &Point3<f64>, b: &Point3<f64>) -> Option<f64> {
    let u: Vector3<f64> = a - vertex;
    let v: Vector3<f64> = b - vertex;
    let norms = u.norm() * v.norm();
    if norms < f64::EPSILON {
        return None;
    }
    let cos = (u.dot(&v) / norms).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Mean position of a set of points, or `None` for an empty set.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}
