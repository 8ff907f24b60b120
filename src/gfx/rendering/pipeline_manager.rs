//! Render pipeline management for wgpu
//!
//! Pipelines are registered by name, then created together at start-up
//! inside a validation error scope so that a bad shader or layout is a
//! fatal initialization error rather than a panic in the middle of a frame.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::error::{Result, StagelightError};
use crate::gfx::scene::{vertex::Vertex3D, RenderMode};

/// Depth test and write state of a pipeline
#[derive(Debug, Clone, Copy)]
pub struct DepthConfig {
    pub format: TextureFormat,
    pub write_enabled: bool,
    pub compare: CompareFunction,
    pub bias: DepthBiasState,
}

impl DepthConfig {
    /// Opaque geometry: test `Less`, write depth
    pub fn opaque(format: TextureFormat) -> Self {
        Self {
            format,
            write_enabled: true,
            compare: CompareFunction::Less,
            bias: DepthBiasState::default(),
        }
    }

    /// Geometry drawn at the far plane after everything else
    pub fn background(format: TextureFormat) -> Self {
        Self {
            write_enabled: false,
            compare: CompareFunction::LessEqual,
            ..Self::opaque(format)
        }
    }

    pub fn with_bias(mut self, constant: i32, slope_scale: f32) -> Self {
        self.bias = DepthBiasState {
            constant,
            slope_scale,
            clamp: 0.0,
        };
        self
    }
}

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub polygon_mode: PolygonMode,
    pub depth: Option<DepthConfig>,
    pub color_targets: Vec<Option<ColorTargetState>>,
    pub vertex_only: bool,       // depth-only passes
    pub no_vertex_buffers: bool, // full-screen and procedural geometry
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "scene".to_string(),
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            depth: None,
            color_targets: Vec::new(),
            vertex_only: false,
            no_vertex_buffers: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_depth(mut self, depth: DepthConfig) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Single opaque colour target of `format`
    pub fn with_color_target(mut self, format: TextureFormat) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];
        self
    }

    pub fn with_vertex_only(mut self) -> Self {
        self.vertex_only = true;
        self.color_targets.clear();
        self
    }

    pub fn with_no_vertex_buffers(mut self) -> Self {
        self.no_vertex_buffers = true;
        self
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.polygon_mode = polygon_mode(mode);
        self
    }
}

pub fn polygon_mode(mode: RenderMode) -> PolygonMode {
    match mode {
        RenderMode::Solid => PolygonMode::Fill,
        RenderMode::Wireframe => PolygonMode::Line,
        RenderMode::Points => PolygonMode::Point,
    }
}

/// Device feature a render mode needs, if any
pub fn required_feature(mode: RenderMode) -> Option<Features> {
    match mode {
        RenderMode::Solid => None,
        RenderMode::Wireframe => Some(Features::POLYGON_MODE_LINE),
        RenderMode::Points => Some(Features::POLYGON_MODE_POINT),
    }
}

/// Render modes usable with a device that has `features`
pub fn supported_render_modes(features: Features) -> Vec<RenderMode> {
    [RenderMode::Solid, RenderMode::Wireframe, RenderMode::Points]
        .into_iter()
        .filter(|mode| required_feature(*mode).is_none_or(|f| features.contains(f)))
        .collect()
}

/// Registry key of the `base` pipeline variant for `mode`
pub fn pipeline_key(base: &str, mode: RenderMode) -> String {
    format!("{base}/{mode:?}")
}

/// Manages render pipelines created from named configurations
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Compiles a WGSL module, failing on any validation error
    pub fn load_shader(&mut self, name: &str, source: &str) -> Result<()> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.check_scope(&format!("shader '{name}'"))?;

        log::debug!("Compiled shader '{name}'");
        self.shader_modules.insert(name.to_string(), shader_module);
        Ok(())
    }

    /// Registers a pipeline configuration without creating it
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    /// Creates every pending pipeline. The first failure aborts.
    pub fn create_all_pipelines(&mut self) -> Result<()> {
        for name in std::mem::take(&mut self.pending_pipelines) {
            let Some(config) = self.pipeline_configs.get(&name) else {
                continue;
            };

            self.device.push_error_scope(ErrorFilter::Validation);
            let pipeline = self.create_pipeline_from_config(&name, config);
            // Always pop the scope, even if creation bailed out early
            let scope = self.check_scope(&format!("pipeline '{name}'"));
            let pipeline = pipeline?;
            scope?;

            self.pipelines.insert(name, pipeline);
        }

        log::info!("Created {} render pipelines", self.pipelines.len());
        Ok(())
    }

    pub fn get_pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    fn check_scope(&self, label: &str) -> Result<()> {
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(StagelightError::Validation {
                label: label.to_string(),
                message: error.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn create_pipeline_from_config(&self, name: &str, config: &PipelineConfig) -> Result<RenderPipeline> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| StagelightError::MissingShader(config.shader.clone()))?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
        let pipeline_layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", name)),
            bind_group_layouts: &bind_group_layout_refs,
            push_constant_ranges: &[],
        });

        let fragment_state = if config.vertex_only {
            None
        } else {
            Some(FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &config.color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            })
        };

        let vertex_layouts = [Vertex3D::desc()];
        let vertex_buffers: &[VertexBufferLayout] = if config.no_vertex_buffers {
            &[]
        } else {
            &vertex_layouts
        };

        let depth_stencil = config.depth.map(|depth| DepthStencilState {
            format: depth.format,
            depth_write_enabled: depth.write_enabled,
            depth_compare: depth.compare,
            stencil: StencilState::default(),
            bias: depth.bias,
        });

        Ok(self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&config.label),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: vertex_buffers,
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: fragment_state,
            primitive: PrimitiveState {
                topology: config.primitive_topology,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: config.cull_mode,
                polygon_mode: config.polygon_mode,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_is_always_supported() {
        assert_eq!(supported_render_modes(Features::empty()), vec![RenderMode::Solid]);
    }

    #[test]
    fn test_modes_follow_features() {
        let modes = supported_render_modes(Features::POLYGON_MODE_LINE);
        assert_eq!(modes, vec![RenderMode::Solid, RenderMode::Wireframe]);

        let modes = supported_render_modes(Features::POLYGON_MODE_LINE | Features::POLYGON_MODE_POINT);
        assert_eq!(modes.len(), 3);
    }

    #[test]
    fn test_background_depth_does_not_write() {
        let depth = DepthConfig::background(TextureFormat::Depth32Float);
        assert!(!depth.write_enabled);
        assert_eq!(depth.compare, CompareFunction::LessEqual);
    }

    #[test]
    fn test_render_mode_sets_polygon_mode() {
        let config = PipelineConfig::default().with_render_mode(RenderMode::Wireframe);
        assert_eq!(config.polygon_mode, PolygonMode::Line);
        assert_eq!(pipeline_key("Scene", RenderMode::Points), "Scene/Points");
    }
}
