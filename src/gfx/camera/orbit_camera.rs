use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Spherical pose the camera returns to on reset.
#[derive(Debug, Clone, Copy)]
struct HomePose {
    distance: f32,
    pitch: f32,
    yaw: f32,
    target: Vector3<f32>,
}

/// Perspective camera orbiting a target point, Y-up.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub projection: Matrix4<f32>,
    pub uniform: CameraUniform,
    home: HomePose,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculated in `update()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Rad::from(Deg(75.0)),
            znear: 0.1,
            zfar: 1000.0,
            projection: Matrix4::identity(),
            uniform: CameraUniform::default(),
            home: HomePose {
                distance,
                pitch,
                yaw,
                target,
            },
        };
        camera.update();
        camera.update_projection();
        camera
    }

    /// Creates a camera at `eye` looking at `target`, deriving the orbit angles from the offset.
    pub fn looking_at(
        eye: Vector3<f32>,
        target: Vector3<f32>,
        fovy: Deg<f32>,
        znear: f32,
        zfar: f32,
        aspect: f32,
    ) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude().max(f32::EPSILON);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);

        let mut camera = Self::new(distance, pitch, yaw, target, aspect);
        camera.fovy = Rad::from(fovy);
        camera.znear = znear;
        camera.zfar = zfar;
        camera.update_projection();
        camera
    }

    /// Restores the pose the camera was created with.
    pub fn reset_to_default(&mut self) {
        self.distance = self.home.distance;
        self.pitch = self.home.pitch;
        self.yaw = self.home.yaw;
        self.target = self.home.target;

        self.update(); // Recalculate eye position
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    /// Scales the orbit distance; `scale < 1` moves closer.
    pub fn dolly(&mut self, scale: f32) {
        self.set_distance(self.distance * scale);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.clamp(min_yaw, f32::MAX);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.clamp(f32::MIN, max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Pans the camera relative to the current view direction
    /// delta.0 = horizontal pan (left/right relative to camera view)
    /// delta.1 = vertical pan (up/down relative to camera view)
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        // Scale pan movement by distance for consistent feel at all zoom levels
        let pan_scale = self.distance * 0.1;

        let total_movement = right * delta.0 * pan_scale + up * delta.1 * pan_scale;

        // Move both eye and target to maintain the view direction
        self.eye += total_movement;
        self.target += total_movement;
    }

    /// Updates the camera after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        Matrix4::look_at_rh(eye, target, self.up)
    }

    /// Recomputes the projection matrix from fov, aspect and clip planes.
    pub fn update_projection(&mut self) {
        self.projection =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
        self.update_projection();
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: Some(0.5),
            max_distance: None,
            min_pitch: -std::f32::consts::PI / 2.0 + 0.01,
            max_pitch: std::f32::consts::PI / 2.0 - 0.01,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn looking_at_reproduces_eye_position() {
        let eye = Vector3::new(0.0, 1.5, 5.0);
        let camera =
            OrbitCamera::looking_at(eye, Vector3::zero(), Deg(75.0), 0.1, 1000.0, 1.5);

        assert_relative_eq!(camera.eye.x, eye.x, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.y, eye.y, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.z, eye.z, epsilon = 1e-5);
        assert_relative_eq!(camera.distance, eye.magnitude(), epsilon = 1e-5);
    }

    #[test]
    fn resize_projection_sets_aspect_and_projection() {
        let mut camera = OrbitCamera::new(5.0, 0.3, 0.0, Vector3::zero(), 1.0);
        camera.resize_projection(1920, 1080);

        assert_relative_eq!(camera.aspect, 1920.0 / 1080.0);
        let expected = OPENGL_TO_WGPU_MATRIX
            * perspective(camera.fovy, 1920.0 / 1080.0, camera.znear, camera.zfar);
        assert_eq!(camera.projection, expected);
    }

    #[test]
    fn pitch_is_clamped_below_the_pole() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        camera.add_pitch(10.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        assert!(camera.eye.y < 5.0);
    }

    #[test]
    fn reset_restores_initial_pose() {
        let mut camera = OrbitCamera::new(5.0, 0.3, 0.2, Vector3::zero(), 1.0);
        let original_eye = camera.eye;
        camera.add_yaw(1.0);
        camera.dolly(0.5);
        camera.reset_to_default();
        assert_relative_eq!(camera.eye.x, original_eye.x, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.z, original_eye.z, epsilon = 1e-5);
    }

    #[test]
    fn zoom_out_is_unbounded_but_zoom_in_stops_at_min_distance() {
        let mut camera = OrbitCamera::new(5.0, 0.3, 0.0, Vector3::zero(), 1.0);
        camera.dolly(100.0);
        assert_relative_eq!(camera.distance, 500.0, epsilon = 1e-3);

        camera.set_distance(0.01);
        assert_relative_eq!(camera.distance, 0.5);
    }
}
