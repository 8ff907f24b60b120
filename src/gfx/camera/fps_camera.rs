use cgmath::{Angle, Deg, InnerSpace, Matrix4, Point3, Vector3};

use super::camera_utils::{world_up, Camera};

/// Lowest height forward/backward movement may take the eye to
pub const FLOOR_HEIGHT: f32 = -1.0;

const PREVIEW_RADIUS: f32 = 3.0;
const PREVIEW_HEIGHT: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

/// Free-fly first-person camera
///
/// Keeps `front`, `right` and `up` as an orthonormal basis. The stored
/// `target` is only written at construction and by the preview path; free
/// flight changes where the camera looks, not the point the shadow light
/// is aimed at.
#[derive(Debug, Clone, Copy)]
pub struct FpsCamera {
    position: Point3<f32>,
    target: Point3<f32>,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
}

impl Camera for FpsCamera {
    fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }
}

impl FpsCamera {
    pub fn new(position: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) -> Self {
        let mut camera = Self {
            position,
            target,
            front: -Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: world_up(),
        };
        camera.set_basis(target - position, up);
        camera
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Translates the eye. Forward and backward moves that would take the
    /// eye below [`FLOOR_HEIGHT`] are dropped entirely.
    pub fn move_by(&mut self, direction: MoveDirection, speed: f32) {
        match direction {
            MoveDirection::Forward | MoveDirection::Backward => {
                let sign = if direction == MoveDirection::Forward { 1.0 } else { -1.0 };
                let next = self.position + self.front * (speed * sign);
                if next.y >= FLOOR_HEIGHT {
                    self.position = next;
                }
            }
            MoveDirection::Left => self.position -= self.right * speed,
            MoveDirection::Right => self.position += self.right * speed,
        }
    }

    /// Points the camera using pitch and yaw in degrees.
    ///
    /// Pitch must stay inside (-90, 90); at the poles `front` is parallel to
    /// world-up and the right vector is undefined.
    pub fn rotate(&mut self, pitch: f32, yaw: f32) {
        let (pitch, yaw) = (Deg(pitch), Deg(yaw));
        let front = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.set_basis(front, world_up());
    }

    /// Overwrites the whole camera with the scripted orbit pose for
    /// `elapsed_secs`. The eye circles the stage centre at radius 3 and
    /// height 5 while looking outward.
    pub fn preview_animation(&mut self, elapsed_secs: f32) {
        let center = Point3::new(0.0, PREVIEW_HEIGHT, 0.0);
        self.position = Point3::new(
            elapsed_secs.sin() * PREVIEW_RADIUS,
            PREVIEW_HEIGHT,
            elapsed_secs.cos() * PREVIEW_RADIUS,
        );
        self.target = center;
        self.set_basis(self.position - center, world_up());
    }

    fn set_basis(&mut self, front: Vector3<f32>, reference_up: Vector3<f32>) {
        self.front = front.normalize();
        self.right = self.front.cross(reference_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}
