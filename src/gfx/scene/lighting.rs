//! Light sources of the stage
//!
//! The directional light doubles as the shadow caster: the light-space
//! look-at sits on its rotated direction, far enough out that the whole
//! stage falls inside the light frustum's depth range.

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix3, Matrix4, Point3, Vector3};

use crate::gfx::camera::FpsCamera;
use crate::gfx::rendering::shadow_map::LIGHT_FAR;

/// Distance of the shadow eye from the origin, half the light frustum depth
pub const SHADOW_EYE_DISTANCE: f32 = LIGHT_FAR * 0.5;

/// Degrees the directional light turns per frame while a rotate action is held
pub const LIGHT_ROTATION_STEP: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct LightConfig {
    pub base_direction: Vector3<f32>,
    pub color: [f32; 3],
    pub point_light_position: Point3<f32>,
    pub spot_inner_cutoff: Deg<f32>,
    pub spot_outer_cutoff: Deg<f32>,
    pub marker_offset: Vector3<f32>,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            base_direction: Vector3::new(0.5, 13.2, 6.5),
            color: [1.0, 1.0, 1.0],
            point_light_position: Point3::new(2.0, 10.0, 18.0),
            spot_inner_cutoff: Deg(40.0),
            spot_outer_cutoff: Deg(50.0),
            marker_offset: Vector3::new(3.0, 5.0, 3.0),
        }
    }
}

/// The rotatable directional light
#[derive(Debug, Clone, Copy)]
pub struct LightRig {
    pub config: LightConfig,
    angle: f32,
}

impl LightRig {
    pub fn new(config: LightConfig) -> Self {
        Self { config, angle: 0.0 }
    }

    /// Rotation about +Y in degrees, always in `[0, 360]`
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn rotate_left(&mut self) {
        self.angle += LIGHT_ROTATION_STEP;
        if self.angle > 360.0 {
            self.angle -= 360.0;
        }
    }

    pub fn rotate_right(&mut self) {
        self.angle -= LIGHT_ROTATION_STEP;
        if self.angle < 0.0 {
            self.angle += 360.0;
        }
    }

    /// Direction toward the light, in world space
    pub fn direction(&self) -> Vector3<f32> {
        Matrix3::from_angle_y(Deg(self.angle)) * self.config.base_direction
    }

    /// Eye position used when rendering the shadow map
    pub fn shadow_eye(&self) -> Point3<f32> {
        Point3::from_vec(self.direction().normalize() * SHADOW_EYE_DISTANCE)
    }

    /// Model matrix of the small cube marking the light in the main pass
    pub fn marker_transform(&self) -> Matrix4<f32> {
        Matrix4::from_angle_y(Deg(self.angle)) * Matrix4::from_translation(self.config.marker_offset)
    }
}

/// A spot light parked wherever the camera was when it was last latched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl SpotLight {
    pub fn from_camera(camera: &FpsCamera) -> Self {
        Self {
            position: camera.position(),
            direction: camera.front(),
        }
    }

    pub fn latch(&mut self, camera: &FpsCamera) {
        *self = Self::from_camera(camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_wraps_both_ways() {
        let mut rig = LightRig::new(LightConfig::default());
        rig.rotate_right();
        assert_eq!(rig.angle(), 359.5);

        let mut rig = LightRig::new(LightConfig::default());
        for _ in 0..721 {
            rig.rotate_left();
            assert!((0.0..=360.0).contains(&rig.angle()));
        }
        assert_eq!(rig.angle(), 0.5);
    }

    #[test]
    fn test_rotation_keeps_height_and_length() {
        let mut rig = LightRig::new(LightConfig::default());
        let base = rig.direction();
        for _ in 0..123 {
            rig.rotate_left();
        }
        let turned = rig.direction();
        assert!((turned.y - base.y).abs() < 1e-5);
        assert!((turned.magnitude() - base.magnitude()).abs() < 1e-4);
        assert!((turned - base).magnitude() > 1.0);
    }

    #[test]
    fn test_shadow_eye_lies_on_light_direction() {
        let mut rig = LightRig::new(LightConfig::default());
        for _ in 0..50 {
            rig.rotate_right();
        }
        let eye = rig.shadow_eye().to_vec();
        assert!((eye.magnitude() - SHADOW_EYE_DISTANCE).abs() < 1e-3);
        assert!(eye.normalize().dot(rig.direction().normalize()) > 0.9999);
    }

    #[test]
    fn test_marker_turns_with_light() {
        let mut rig = LightRig::new(LightConfig::default());
        let start = rig.marker_transform().w;
        for _ in 0..360 {
            rig.rotate_left();
        }
        let half_turn = rig.marker_transform().w;
        assert!((half_turn.x + start.x).abs() < 1e-4);
        assert!((half_turn.z + start.z).abs() < 1e-4);
        assert!((half_turn.y - start.y).abs() < 1e-6);
    }
}
