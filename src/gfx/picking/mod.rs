//! # Pointer Picking
//!
//! Turns pointer positions into world-space rays and provides the ray
//! geometry the manipulation gizmos are built on.
//!
//! ## How it works
//!
//! 1. **Pointer to Ray**: Unproject the pointer through the inverse view-projection
//! 2. **Ray vs. Line**: Closest approach to a gizmo axis, used for axis picking and translation
//! 3. **Ray vs. Plane**: Intersection with a rotation ring's plane

use cgmath::{InnerSpace, SquareMatrix, Vector3, Vector4};

use crate::gfx::camera::{camera_utils::Camera, orbit_camera::OrbitCamera};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }
}

/// Convert screen coordinates (physical pixels, origin top-left) to a world-space ray
///
/// Returns `None` for an empty viewport or a degenerate camera.
pub fn screen_to_ray(
    screen_pos: (f32, f32),
    screen_size: (f32, f32),
    camera: &OrbitCamera,
) -> Option<Ray> {
    let (mouse_x, mouse_y) = screen_pos;
    let (screen_width, screen_height) = screen_size;
    if screen_width <= 0.0 || screen_height <= 0.0 {
        return None;
    }

    // Convert screen coordinates to normalized device coordinates (-1 to 1)
    let ndc_x = (2.0 * mouse_x) / screen_width - 1.0;
    let ndc_y = 1.0 - (2.0 * mouse_y) / screen_height; // Flip Y axis

    let inverse = camera.build_view_projection_matrix().invert()?;

    // wgpu clip space has depth 0..1
    let near = inverse * Vector4::new(ndc_x, ndc_y, 0.0, 1.0);
    let far = inverse * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
    if near.w.abs() < f32::EPSILON || far.w.abs() < f32::EPSILON {
        return None;
    }

    let near = near.truncate() / near.w;
    let far = far.truncate() / far.w;
    let direction = far - near;
    if direction.magnitude2() <= f32::EPSILON {
        return None;
    }

    Some(Ray::new(near, direction))
}

/// Closest approach between a ray and an infinite line.
#[derive(Debug, Clone, Copy)]
pub struct LineApproach {
    /// Parameter along the ray
    pub ray_t: f32,
    /// Parameter along the line (in units of the line direction)
    pub line_t: f32,
    /// Distance between the two closest points
    pub distance: f32,
}

/// Closest points between `ray` and the line through `origin` along unit `axis`.
///
/// Returns `None` when the ray is (nearly) parallel to the line.
pub fn ray_line_closest(ray: &Ray, origin: Vector3<f32>, axis: Vector3<f32>) -> Option<LineApproach> {
    let w0 = ray.origin - origin;
    let b = ray.direction.dot(axis);
    let denom = 1.0 - b * b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let d = ray.direction.dot(w0);
    let e = axis.dot(w0);
    let ray_t = (b * e - d) / denom;
    let line_t = (e - b * d) / denom;

    let distance = (ray.point_at(ray_t) - (origin + axis * line_t)).magnitude();
    Some(LineApproach {
        ray_t,
        line_t,
        distance,
    })
}

/// Intersection of `ray` with the plane through `origin` with unit `normal`.
///
/// Returns the hit point, or `None` if the ray is parallel or the plane is behind it.
pub fn ray_plane(ray: &Ray, origin: Vector3<f32>, normal: Vector3<f32>) -> Option<Vector3<f32>> {
    let denom = ray.direction.dot(normal);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (origin - ray.origin).dot(normal) / denom;
    if t < 0.0 {
        return None;
    }
    Some(ray.point_at(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Deg, Zero};

    #[test]
    fn centre_ray_points_at_target() {
        let camera = OrbitCamera::looking_at(
            Vector3::new(0.0, 0.0, 5.0),
            Vector3::zero(),
            Deg(75.0),
            0.1,
            1000.0,
            1.5,
        );
        let ray = screen_to_ray((600.0, 400.0), (1200.0, 800.0), &camera).unwrap();

        assert_relative_eq!(ray.direction.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-4);
        assert_relative_eq!(ray.origin.z, 4.9, epsilon = 1e-3);
    }

    #[test]
    fn empty_viewport_has_no_ray() {
        let camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        assert!(screen_to_ray((0.0, 0.0), (0.0, 0.0), &camera).is_none());
    }

    #[test]
    fn ray_passing_over_axis() {
        // Ray travelling -z at height 1 above the x axis
        let ray = Ray::new(Vector3::new(2.0, 1.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let approach = ray_line_closest(&ray, Vector3::zero(), Vector3::unit_x()).unwrap();

        assert_relative_eq!(approach.line_t, 2.0, epsilon = 1e-5);
        assert_relative_eq!(approach.ray_t, 5.0, epsilon = 1e-5);
        assert_relative_eq!(approach.distance, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn parallel_ray_has_no_closest_point() {
        let ray = Ray::new(Vector3::new(0.0, 1.0, 0.0), Vector3::unit_x());
        assert!(ray_line_closest(&ray, Vector3::zero(), Vector3::unit_x()).is_none());
    }

    #[test]
    fn plane_behind_ray_is_missed() {
        let ray = Ray::new(Vector3::new(0.0, 1.0, 0.0), Vector3::unit_y());
        assert!(ray_plane(&ray, Vector3::zero(), Vector3::unit_y()).is_none());

        let down = Ray::new(Vector3::new(0.5, 1.0, 0.0), -Vector3::unit_y());
        let hit = ray_plane(&down, Vector3::zero(), Vector3::unit_y()).unwrap();
        assert_relative_eq!(hit.x, 0.5);
        assert_relative_eq!(hit.y, 0.0);
    }
}
