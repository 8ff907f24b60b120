//! Shadow map resources and the light-space transform
//!
//! The shadow map is a square `Depth32Float` texture with a fixed size,
//! created once at start-up and never resized with the window.

use cgmath::{ortho, Matrix4, Point3};

use crate::error::{Result, StagelightError};
use crate::gfx::camera::camera_utils::world_up;
use crate::gfx::camera::OPENGL_TO_WGPU_MATRIX;
use crate::gfx::resources::texture_resource::TextureResource;
use crate::wgpu_utils::{binding_types, layout_entry};

/// Half extent of the orthographic light frustum
pub const LIGHT_FRUSTUM_EXTENT: f32 = 100.0;
pub const LIGHT_NEAR: f32 = 0.1;
pub const LIGHT_FAR: f32 = 200.0;

/// Orthographic projection times look-at from `light_position` toward
/// `target`, in wgpu clip space.
pub fn compute_light_space_matrix(light_position: Point3<f32>, target: Point3<f32>) -> Matrix4<f32> {
    let projection = ortho(
        -LIGHT_FRUSTUM_EXTENT,
        LIGHT_FRUSTUM_EXTENT,
        -LIGHT_FRUSTUM_EXTENT,
        LIGHT_FRUSTUM_EXTENT,
        LIGHT_NEAR,
        LIGHT_FAR,
    );
    let view = Matrix4::look_at_rh(light_position, target, world_up());
    OPENGL_TO_WGPU_MATRIX * projection * view
}

/// Checks a requested shadow map edge against the device's texture limit
pub fn validate_shadow_map_size(size: u32, max: u32) -> Result<u32> {
    if size == 0 || size > max {
        return Err(StagelightError::ShadowMapSize { size, max });
    }
    Ok(size)
}

pub struct ShadowMap {
    depth: TextureResource,
    size: u32,
    sampling_layout: wgpu::BindGroupLayout,
    sampling_bind_group: wgpu::BindGroup,
    preview_layout: wgpu::BindGroupLayout,
    preview_bind_group: wgpu::BindGroup,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device, size: u32) -> Result<Self> {
        let size = validate_shadow_map_size(size, device.limits().max_texture_dimension_2d)?;
        let depth = TextureResource::create_shadow_map(device, size);

        let sampling_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Sampling Layout"),
            entries: &[
                layout_entry(0, wgpu::ShaderStages::FRAGMENT, binding_types::texture_depth_2d()),
                layout_entry(
                    1,
                    wgpu::ShaderStages::FRAGMENT,
                    binding_types::sampler(wgpu::SamplerBindingType::Comparison),
                ),
            ],
        });
        let sampling_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Sampling Bind Group"),
            layout: &sampling_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&depth.sampler),
                },
            ],
        });

        // The preview reads raw texels, so it needs no sampler
        let preview_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Depth Preview Layout"),
            entries: &[layout_entry(
                0,
                wgpu::ShaderStages::FRAGMENT,
                binding_types::texture_depth_2d(),
            )],
        });
        let preview_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Depth Preview Bind Group"),
            layout: &preview_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&depth.view),
            }],
        });

        log::info!("Created {size}x{size} shadow map");

        Ok(Self {
            depth,
            size,
            sampling_layout,
            sampling_bind_group,
            preview_layout,
            preview_bind_group,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.depth.texture.format()
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.depth.view
    }

    pub fn sampling_layout(&self) -> &wgpu::BindGroupLayout {
        &self.sampling_layout
    }

    pub fn sampling_bind_group(&self) -> &wgpu::BindGroup {
        &self.sampling_bind_group
    }

    pub fn preview_layout(&self) -> &wgpu::BindGroupLayout {
        &self.preview_layout
    }

    pub fn preview_bind_group(&self) -> &wgpu::BindGroup {
        &self.preview_bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    fn eye() -> Point3<f32> {
        Point3::new(0.5, 13.2, 6.5)
    }

    #[test]
    fn test_shadow_map_size_must_fit_device() {
        assert_eq!(validate_shadow_map_size(2048, 8192).unwrap(), 2048);
        assert_eq!(validate_shadow_map_size(8192, 8192).unwrap(), 8192);
        assert!(matches!(
            validate_shadow_map_size(0, 8192),
            Err(StagelightError::ShadowMapSize { size: 0, max: 8192 })
        ));
        assert!(validate_shadow_map_size(4_000_000, 8192).is_err());
    }

    #[test]
    fn test_light_space_is_deterministic() {
        let a = compute_light_space_matrix(eye(), Point3::new(0.0, 0.0, 0.0));
        let b = compute_light_space_matrix(eye(), Point3::new(0.0, 0.0, 0.0));
        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        for (col_a, col_b) in a.iter().zip(b.iter()) {
            for (x, y) in col_a.iter().zip(col_b.iter()) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
        }
    }

    #[test]
    fn test_target_lands_in_centre_with_valid_depth() {
        let target = Point3::new(0.0, 0.0, 0.0);
        let clip = compute_light_space_matrix(eye(), target) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.x.abs() < 1e-5);
        assert!(clip.y.abs() < 1e-5);
        assert!((clip.w - 1.0).abs() < 1e-6);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn test_points_beyond_far_plane_leave_depth_range() {
        let target = Point3::new(0.0, 0.0, 0.0);
        let matrix = compute_light_space_matrix(eye(), target);
        let direction = (target - eye()) * (LIGHT_FAR / 14.0);
        let far_point = eye() + direction;
        let clip = matrix * far_point.to_homogeneous();
        assert!(clip.z > 1.0);

        let at_eye = matrix * eye().to_homogeneous();
        assert!(at_eye.z < 0.0);
    }
}
