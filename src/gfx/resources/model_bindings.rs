//! Per-object model matrices (group 1)
//!
//! Built once per frame and uploaded in one write. The depth pass and the
//! main pass bind the same slot for the same object, so both see identical
//! transforms.

use cgmath::{Matrix, Matrix4, SquareMatrix};

use crate::gfx::camera::camera_utils::convert_matrix4_to_array;
use crate::gfx::scene::ObjectTransform;
use crate::wgpu_utils::{binding_types, layout_entry, DynamicUniformBuffer};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for transforming normals
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(model: Matrix4<f32>) -> Self {
        let normal = model.invert().map(|m| m.transpose()).unwrap_or(model);
        Self {
            model: convert_matrix4_to_array(model),
            normal: convert_matrix4_to_array(normal),
        }
    }
}

/// Slot contents for a frame: every object in order, then the light marker
pub fn frame_slots(objects: &[ObjectTransform], light_marker: Matrix4<f32>) -> Vec<ModelUniform> {
    objects
        .iter()
        .map(|object| ModelUniform::new(object.model))
        .chain(std::iter::once(ModelUniform::new(light_marker)))
        .collect()
}

pub struct ModelBindings {
    buffer: DynamicUniformBuffer<ModelUniform>,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl ModelBindings {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let buffer = DynamicUniformBuffer::new(device, capacity);
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[layout_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                binding_types::uniform_dynamic(std::mem::size_of::<ModelUniform>() as u64),
            )],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.binding_resource(),
            }],
        });

        Self {
            buffer,
            bind_group_layout,
            bind_group,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, slots: &[ModelUniform]) {
        self.buffer.write(queue, slots);
    }

    /// Whether slot `index` fits in the buffer
    pub fn has_slot(&self, index: usize) -> bool {
        index < self.buffer.capacity()
    }

    pub fn offset(&self, index: usize) -> u32 {
        self.buffer.offset(index)
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
