use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};

use super::animation::AnimationState;
use super::audience::{Audience, AUDIENCE_GRID_SIDE};
use super::lighting::{LightConfig, LightRig, SpotLight};
use super::settings::SceneSettings;
use crate::config::AppConfig;
use crate::gfx::camera::camera_utils::world_up;
use crate::gfx::camera::{FpsCamera, MouseLook, Projection};
use crate::gfx::rendering::shadow_map::compute_light_space_matrix;

/// Meshes the stage is built from, one OBJ file each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Stage,
    Gate,
    Audience,
    DiscoBall,
    Teapot,
    LightMarker,
}

impl ModelKind {
    pub const ALL: [ModelKind; 6] = [
        ModelKind::Stage,
        ModelKind::Gate,
        ModelKind::Audience,
        ModelKind::DiscoBall,
        ModelKind::Teapot,
        ModelKind::LightMarker,
    ];

    /// Path of the OBJ file relative to the assets directory
    pub fn relative_path(self) -> &'static str {
        match self {
            ModelKind::Stage => "models/main_scene/main_scene.obj",
            ModelKind::Gate => "models/gate/gate.obj",
            ModelKind::Audience => "models/audience/audience.obj",
            ModelKind::DiscoBall => "models/discoball/discoball.obj",
            ModelKind::Teapot => "models/teapot/teapot20segUT.obj",
            ModelKind::LightMarker => "models/cube/cube.obj",
        }
    }
}

/// Identifies one drawn instance in the per-frame transform list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectId {
    Stage,
    LeftGate,
    RightGate,
    Audience(usize),
    DiscoBall,
    Teapot,
}

impl ObjectId {
    pub fn model(self) -> ModelKind {
        match self {
            ObjectId::Stage => ModelKind::Stage,
            ObjectId::LeftGate | ObjectId::RightGate => ModelKind::Gate,
            ObjectId::Audience(_) => ModelKind::Audience,
            ObjectId::DiscoBall => ModelKind::DiscoBall,
            ObjectId::Teapot => ModelKind::Teapot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub id: ObjectId,
    pub model: Matrix4<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    /// Distance moved per frame while a movement action is held
    pub speed: f32,
    pub mouse_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(2.0, 5.0, -10.0),
            target: Point3::new(0.0, 0.0, 0.0),
            speed: 0.2,
            mouse_sensitivity: 0.1,
        }
    }
}

const TEAPOT_POSITION: Vector3<f32> = Vector3::new(4.4, 2.0, 12.0);

/// Everything the frame loop mutates, owned in one place
pub struct Scene {
    pub camera: FpsCamera,
    pub camera_config: CameraConfig,
    pub mouse_look: MouseLook,
    pub projection: Projection,
    pub animation: AnimationState,
    pub settings: SceneSettings,
    pub light: LightRig,
    pub spot_light: SpotLight,
}

impl Scene {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(
            CameraConfig::default(),
            LightConfig::default(),
            Audience::grid(AUDIENCE_GRID_SIDE, config.audience_seed),
            !config.independent_gates,
            config.aspect(),
        )
    }

    pub fn with_parts(
        camera_config: CameraConfig,
        light_config: LightConfig,
        audience: Audience,
        right_gate_follows_left: bool,
        aspect: f32,
    ) -> Self {
        let camera = FpsCamera::new(camera_config.position, camera_config.target, world_up());
        let mouse_look = MouseLook::from_camera(&camera, camera_config.mouse_sensitivity);
        let projection = Projection {
            aspect,
            ..Projection::default()
        };

        Self {
            camera,
            camera_config,
            mouse_look,
            projection,
            animation: AnimationState::new(audience, right_gate_follows_left),
            settings: SceneSettings::default(),
            light: LightRig::new(light_config),
            spot_light: SpotLight::from_camera(&camera),
        }
    }

    /// Model matrices for every shadow-casting object, in draw order
    pub fn object_transforms(&self) -> Vec<ObjectTransform> {
        let animation = &self.animation;
        let mut objects = Vec::with_capacity(5 + animation.audience.len());

        objects.push(ObjectTransform {
            id: ObjectId::Stage,
            model: Matrix4::identity(),
        });
        objects.push(ObjectTransform {
            id: ObjectId::LeftGate,
            model: animation.gates.left.transform(),
        });
        objects.push(ObjectTransform {
            id: ObjectId::RightGate,
            model: animation.gates.right.transform(),
        });
        objects.extend(
            animation
                .audience
                .members()
                .iter()
                .enumerate()
                .map(|(idx, member)| ObjectTransform {
                    id: ObjectId::Audience(idx),
                    model: member.transform(),
                }),
        );
        objects.push(ObjectTransform {
            id: ObjectId::DiscoBall,
            model: animation.disco_ball.transform(),
        });
        objects.push(ObjectTransform {
            id: ObjectId::Teapot,
            model: Matrix4::from_translation(TEAPOT_POSITION),
        });

        objects
    }

    pub fn light_space_matrix(&self) -> Matrix4<f32> {
        compute_light_space_matrix(self.light.shadow_eye(), self.camera.target())
    }
}
