//! Global uniform bindings for camera, lighting and fog
//!
//! One uniform block per frame, shared by every pipeline at group 0.

use cgmath::{Matrix4, Point3, Vector3};

use crate::frame::FrameData;
use crate::gfx::camera::camera_utils::convert_matrix4_to_array;
use crate::wgpu_utils::{binding_types, layout_entry, uniform_buffer::UniformBuffer};

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the shaders exactly. Every field is a
/// `vec4` or `mat4x4` so the std140 and Rust layouts agree without padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    pub view_proj: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub sky_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// Direction toward the light; w unused
    pub light_direction: [f32; 4],
    pub light_color: [f32; 4],
    pub point_light_position: [f32; 4],
    pub spot_position: [f32; 4],
    pub spot_direction: [f32; 4],
    /// x: fog density, y: spot inner cut-off cosine, z: spot outer cut-off cosine
    pub params: [f32; 4],
    /// x: point light on, y: spot light on
    pub flags: [u32; 4],
}

fn point4(p: Point3<f32>) -> [f32; 4] {
    [p.x, p.y, p.z, 1.0]
}

fn vector4(v: Vector3<f32>) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

fn matrix(m: Matrix4<f32>) -> [[f32; 4]; 4] {
    convert_matrix4_to_array(m)
}

impl GlobalUBOContent {
    pub fn from_frame(frame: &FrameData) -> Self {
        let [r, g, b] = frame.light_color;
        Self {
            view_proj: matrix(frame.view_projection()),
            light_space: matrix(frame.light_space),
            sky_view_proj: matrix(frame.sky_view_projection),
            camera_position: point4(frame.camera_position),
            light_direction: vector4(frame.light_direction),
            light_color: [r, g, b, 1.0],
            point_light_position: point4(frame.point_light_position),
            spot_position: point4(frame.spot_light.position),
            spot_direction: vector4(frame.spot_light.direction),
            params: [frame.fog_density, frame.spot_cutoffs.0, frame.spot_cutoffs.1, 0.0],
            flags: [
                u32::from(frame.point_light_enabled),
                u32::from(frame.spot_light_enabled),
                0,
                0,
            ],
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Bind group layout and bind group for the global uniforms (group 0)
pub struct GlobalBindings {
    ubo: GlobalUBO,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let ubo = GlobalUBO::new(device);
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[layout_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                binding_types::uniform(),
            )],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });

        Self {
            ubo,
            bind_group_layout,
            bind_group,
        }
    }

    /// Should be called once per frame, before any pass is recorded.
    pub fn update(&mut self, queue: &wgpu::Queue, frame: &FrameData) {
        self.ubo.update_content(queue, GlobalUBOContent::from_frame(frame));
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::frame::{FrameOrchestrator, FrameTiming};
    use crate::gfx::scene::Scene;
    use crate::input::InputState;

    #[test]
    fn test_layout_is_std140_friendly() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 3 * 64 + 8 * 16);
        assert_eq!(std::mem::size_of::<GlobalUBOContent>() % 16, 0);
    }

    #[test]
    fn test_from_frame_packs_toggles_and_fog() {
        let mut orchestrator = FrameOrchestrator::new(Scene::new(&AppConfig::default()));
        orchestrator.scene_mut().settings.point_light_enabled = true;
        orchestrator.scene_mut().settings.set_fog_density(0.25);
        let frame = orchestrator.advance(&InputState::new(), FrameTiming::default());

        let content = GlobalUBOContent::from_frame(&frame);
        assert_eq!(content.flags, [1, 0, 0, 0]);
        assert_eq!(content.params[0], 0.25);
        assert_eq!(content.camera_position[3], 1.0);
        assert_eq!(content.light_direction[3], 0.0);
        assert!((content.params[1] - 40.0f32.to_radians().cos()).abs() < 1e-6);
        assert!(content.params[1] > content.params[2]);
    }
}
