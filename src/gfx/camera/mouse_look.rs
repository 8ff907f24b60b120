use cgmath::InnerSpace;

use super::fps_camera::FpsCamera;

/// Accumulates mouse motion into yaw/pitch angles for an [`FpsCamera`]
#[derive(Debug, Clone, Copy)]
pub struct MouseLook {
    pub sensitivity: f32,
    pub pitch_limit: f32,
    yaw: f32,
    pitch: f32,
}

impl MouseLook {
    /// Starts from the camera's current heading so the first motion event
    /// does not snap the view.
    pub fn from_camera(camera: &FpsCamera, sensitivity: f32) -> Self {
        let front = camera.front().normalize();
        Self {
            sensitivity,
            pitch_limit: 89.0,
            yaw: front.z.atan2(front.x).to_degrees(),
            pitch: front.y.clamp(-1.0, 1.0).asin().to_degrees(),
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Applies a raw mouse delta in screen space (y grows downward).
    pub fn apply(&mut self, delta: (f64, f64), camera: &mut FpsCamera) {
        self.yaw += delta.0 as f32 * self.sensitivity;
        self.pitch -= delta.1 as f32 * self.sensitivity;
        self.pitch = self.pitch.clamp(-self.pitch_limit, self.pitch_limit);

        camera.rotate(self.pitch, self.yaw);
    }

    /// Re-reads yaw and pitch after something else moved the camera.
    pub fn sync(&mut self, camera: &FpsCamera) {
        *self = Self::from_camera(camera, self.sensitivity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::camera_utils::world_up;
    use cgmath::Point3;

    #[test]
    fn test_from_camera_round_trips_heading() {
        let mut camera = FpsCamera::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, -1.0), world_up());
        let look = MouseLook::from_camera(&camera, 0.1);
        assert!((look.yaw() + 90.0).abs() < 1e-3);
        assert!(look.pitch().abs() < 1e-3);

        let before = camera.front();
        let mut look = look;
        look.apply((0.0, 0.0), &mut camera);
        assert!((camera.front() - before).magnitude() < 1e-5);
    }

    #[test]
    fn test_first_motion_continues_from_target_heading() {
        let mut camera = FpsCamera::new(Point3::new(2.0, 5.0, -10.0), Point3::new(0.0, 0.0, 0.0), world_up());
        let before = camera.front();
        let mut look = MouseLook::from_camera(&camera, 0.1);
        assert!((look.yaw() + 90.0).abs() > 1.0);

        look.apply((1.0, 0.0), &mut camera);
        assert!((camera.front() - before).magnitude() < 0.01);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FpsCamera::new(Point3::new(2.0, 5.0, -10.0), Point3::new(0.0, 0.0, 0.0), world_up());
        let mut look = MouseLook::from_camera(&camera, 0.1);

        look.apply((0.0, -10_000.0), &mut camera);
        assert_eq!(look.pitch(), 89.0);
        look.apply((0.0, 50_000.0), &mut camera);
        assert_eq!(look.pitch(), -89.0);
        assert!((camera.front().magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_moving_mouse_right_turns_right() {
        let mut camera = FpsCamera::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, -1.0), world_up());
        let mut look = MouseLook::from_camera(&camera, 0.1);
        look.apply((100.0, 0.0), &mut camera);
        assert!(camera.front().x > 0.0);
    }
}
