//! Per-frame orchestration
//!
//! [`FrameOrchestrator::advance`] turns one input snapshot into one
//! [`FrameData`]: input toggles, then the camera, then a single animation
//! step, then the light-space matrix. [`render_passes`] then runs the GPU
//! passes in their fixed order against anything implementing
//! [`RenderPasses`].

use cgmath::{Angle, Matrix4, Point3, Vector3};

use crate::gfx::camera::camera_utils::without_translation;
use crate::gfx::camera::{Camera, MoveDirection};
use crate::gfx::scene::{ObjectTransform, RenderMode, Scene, SpotLight};
use crate::input::{InputAction, InputState};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTiming {
    /// Seconds since the previous frame
    pub delta: f32,
    /// Seconds since start-up
    pub elapsed: f32,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    pub frame_index: u64,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub light_space: Matrix4<f32>,
    pub sky_view_projection: Matrix4<f32>,
    pub camera_position: Point3<f32>,
    pub light_direction: Vector3<f32>,
    pub light_color: [f32; 3],
    pub light_marker: Matrix4<f32>,
    pub point_light_position: Point3<f32>,
    pub point_light_enabled: bool,
    pub spot_light: SpotLight,
    pub spot_light_enabled: bool,
    /// Cosines of the inner and outer spot cut-off angles
    pub spot_cutoffs: (f32, f32),
    pub fog_density: f32,
    pub objects: Vec<ObjectTransform>,
    pub show_depth_map: bool,
    pub render_mode: RenderMode,
    pub quit_requested: bool,
}

impl FrameData {
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }
}

pub struct FrameOrchestrator {
    scene: Scene,
    supported_render_modes: Vec<RenderMode>,
    frame_index: u64,
}

impl FrameOrchestrator {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            supported_render_modes: vec![RenderMode::Solid],
            frame_index: 0,
        }
    }

    /// Render modes other than these are refused with a warning
    pub fn with_supported_render_modes(mut self, modes: Vec<RenderMode>) -> Self {
        self.set_supported_render_modes(modes);
        self
    }

    pub fn set_supported_render_modes(&mut self, modes: Vec<RenderMode>) {
        self.supported_render_modes = modes;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.scene.projection.resize(width, height);
    }

    pub fn advance(&mut self, input: &InputState, timing: FrameTiming) -> FrameData {
        self.apply_toggles(input);
        self.update_camera(input, timing);
        self.scene
            .animation
            .advance(self.scene.settings.animations_enabled, timing.delta);
        let light_space = self.scene.light_space_matrix();

        let frame = self.build_frame_data(light_space, input.was_pressed(InputAction::Quit));
        log::trace!("Frame {} built with {} objects", frame.frame_index, frame.objects.len());
        self.frame_index += 1;
        frame
    }

    fn apply_toggles(&mut self, input: &InputState) {
        let scene = &mut self.scene;
        let settings = &mut scene.settings;

        if input.is_held(InputAction::StartAnimations) {
            settings.animations_enabled = true;
        }
        if input.is_held(InputAction::StopAnimations) {
            settings.animations_enabled = false;
        }
        if input.is_held(InputAction::EnableSpotLight) {
            settings.spot_light_enabled = true;
        }
        if input.is_held(InputAction::DisableSpotLight) {
            settings.spot_light_enabled = false;
        }
        if input.is_held(InputAction::EnablePointLight) {
            settings.point_light_enabled = true;
        }
        if input.is_held(InputAction::DisablePointLight) {
            settings.point_light_enabled = false;
        }
        if input.is_held(InputAction::IncreaseFog) {
            settings.increase_fog();
        }
        if input.is_held(InputAction::DecreaseFog) {
            settings.decrease_fog();
        }
        if input.is_held(InputAction::StartPreview) {
            settings.preview_active = true;
        }
        if input.is_held(InputAction::StopPreview) && settings.preview_active {
            settings.preview_active = false;
            scene.mouse_look.sync(&scene.camera);
        }
        if input.was_pressed(InputAction::ToggleDepthMap) {
            settings.show_depth_map = !settings.show_depth_map;
            log::debug!("Depth map preview {}", if settings.show_depth_map { "on" } else { "off" });
        }

        for (action, mode) in [
            (InputAction::SolidMode, RenderMode::Solid),
            (InputAction::WireframeMode, RenderMode::Wireframe),
            (InputAction::PointMode, RenderMode::Points),
        ] {
            if input.was_pressed(action) {
                if self.supported_render_modes.contains(&mode) {
                    settings.render_mode = mode;
                } else {
                    log::warn!("{mode:?} rendering is not supported by this adapter, staying in {:?}", settings.render_mode);
                }
            }
        }

        if input.is_held(InputAction::RotateLightLeft) {
            scene.light.rotate_left();
        }
        if input.is_held(InputAction::RotateLightRight) {
            scene.light.rotate_right();
        }
    }

    fn update_camera(&mut self, input: &InputState, timing: FrameTiming) {
        let scene = &mut self.scene;

        if scene.settings.preview_active {
            scene.camera.preview_animation(timing.elapsed);
        } else {
            let delta = input.mouse_delta();
            if delta != (0.0, 0.0) {
                scene.mouse_look.apply(delta, &mut scene.camera);
            }

            let speed = scene.camera_config.speed;
            for (action, direction) in [
                (InputAction::MoveForward, MoveDirection::Forward),
                (InputAction::MoveBackward, MoveDirection::Backward),
                (InputAction::MoveLeft, MoveDirection::Left),
                (InputAction::MoveRight, MoveDirection::Right),
            ] {
                if input.is_held(action) {
                    scene.camera.move_by(direction, speed);
                }
            }
        }

        if input.is_held(InputAction::EnableSpotLight) {
            scene.spot_light.latch(&scene.camera);
        }
    }

    fn build_frame_data(&self, light_space: Matrix4<f32>, quit_requested: bool) -> FrameData {
        let scene = &self.scene;
        let view = scene.camera.view_matrix();
        let projection = scene.projection.matrix();
        let light = &scene.light.config;

        FrameData {
            frame_index: self.frame_index,
            view,
            projection,
            light_space,
            sky_view_projection: projection * without_translation(view),
            camera_position: scene.camera.position(),
            light_direction: scene.light.direction(),
            light_color: light.color,
            light_marker: scene.light.marker_transform(),
            point_light_position: light.point_light_position,
            point_light_enabled: scene.settings.point_light_enabled,
            spot_light: scene.spot_light,
            spot_light_enabled: scene.settings.spot_light_enabled,
            spot_cutoffs: (light.spot_inner_cutoff.cos(), light.spot_outer_cutoff.cos()),
            fog_density: scene.settings.fog_density(),
            objects: scene.object_transforms(),
            show_depth_map: scene.settings.show_depth_map,
            render_mode: scene.settings.render_mode,
            quit_requested,
        }
    }
}

/// The GPU passes of a frame
pub trait RenderPasses {
    /// Scene depth from the light into the shadow map
    fn depth_pass(&mut self, frame: &FrameData);
    /// Shadow map shown full screen instead of the scene
    fn depth_map_preview(&mut self, frame: &FrameData);
    /// Lit, shadowed scene, then the light marker and the skybox
    fn main_pass(&mut self, frame: &FrameData);
}

/// Runs the depth pass and then exactly one of the preview or main pass.
pub fn render_passes<R: RenderPasses + ?Sized>(renderer: &mut R, frame: &FrameData) {
    renderer.depth_pass(frame);
    if frame.show_depth_map {
        renderer.depth_map_preview(frame);
    } else {
        renderer.main_pass(frame);
    }
}
