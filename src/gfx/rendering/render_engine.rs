//! WGPU-based rendering engine for the stage
//!
//! Owns the surface, the device and every GPU resource. Each frame it
//! uploads the globals and the per-object transforms once, then records the
//! depth pass followed by either the main pass or the depth-map preview.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use winit::window::Window;

use super::pipeline_manager::{pipeline_key, supported_render_modes, DepthConfig, PipelineConfig, PipelineManager};
use super::shadow_map::ShadowMap;
use crate::config::AppConfig;
use crate::error::{Result, StagelightError};
use crate::frame::{render_passes, FrameData, RenderPasses};
use crate::gfx::resources::model_bindings::frame_slots;
use crate::gfx::resources::{GlobalBindings, ModelBindings, Skybox, TextureResource};
use crate::gfx::scene::{DrawModel, Model, ModelKind, RenderMode};

const GLOBALS_WGSL: &str = include_str!("shaders/globals.wgsl");

const SCENE_PIPELINE: &str = "Scene";
const LIGHT_MARKER_PIPELINE: &str = "LightMarker";
const SHADOW_PIPELINE: &str = "Shadow";
const SKYBOX_PIPELINE: &str = "Skybox";
const DEPTH_PREVIEW_PIPELINE: &str = "DepthPreview";

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 1.0,
};

/// Vertices of the procedural skybox cube
const SKYBOX_VERTEX_COUNT: u32 = 36;

fn with_globals(body: &str) -> String {
    format!("{GLOBALS_WGSL}\n{body}")
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    pipeline_manager: PipelineManager,
    global_bindings: GlobalBindings,
    model_bindings: ModelBindings,
    shadow_map: ShadowMap,
    skybox: Skybox,
    models: HashMap<ModelKind, Model>,
    render_modes: Vec<RenderMode>,
}

impl RenderEngine {
    /// Creates the device, loads every asset and builds all pipelines.
    ///
    /// `object_count` is the number of scene objects drawn per frame, not
    /// counting the light marker.
    pub async fn new(window: Arc<Window>, app_config: &AppConfig, object_count: usize) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        log::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        let optional_features = wgpu::Features::POLYGON_MODE_LINE | wgpu::Features::POLYGON_MODE_POINT;
        let required_features = adapter.features() & optional_features;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Stagelight Device"),
                required_features,
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        install_device_error_handlers(&device);

        let render_modes = supported_render_modes(required_features);
        log::info!("Supported render modes: {render_modes:?}");

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(StagelightError::NoSurfaceFormat)?;

        let present_mode = if !app_config.vsync
            && surface_capabilities
                .present_modes
                .contains(&wgpu::PresentMode::Immediate)
        {
            wgpu::PresentMode::Immediate
        } else {
            wgpu::PresentMode::Fifo
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Configured {}x{} surface ({format:?}, {present_mode:?})",
            config.width,
            config.height
        );

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let resources = GpuResources::new(&device, &queue, &config, app_config, object_count);
        // Both scopes are popped before any early return
        let validation = pop_scope(&device, "GPU resources", ScopeKind::Validation);
        let allocation = pop_scope(&device, "GPU resources", ScopeKind::Allocation);
        let GpuResources {
            depth_texture,
            shadow_map,
            skybox,
            global_bindings,
            model_bindings,
            models,
        } = resources?;
        validation?;
        allocation?;

        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device.clone());

        pipeline_manager.load_shader("scene", &with_globals(include_str!("shaders/scene.wgsl")))?;
        pipeline_manager.load_shader("shadow", &with_globals(include_str!("shaders/shadow_pass.wgsl")))?;
        pipeline_manager.load_shader("light_marker", &with_globals(include_str!("shaders/light_marker.wgsl")))?;
        pipeline_manager.load_shader("skybox", &with_globals(include_str!("shaders/skybox.wgsl")))?;
        pipeline_manager.load_shader("depth_preview", include_str!("shaders/depth_preview.wgsl"))?;

        let globals_layout = global_bindings.bind_group_layout().clone();
        let model_layout = model_bindings.bind_group_layout().clone();

        // Two-sided like the rest of the stage, with a slope bias against acne
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_bind_group_layouts(vec![globals_layout.clone(), model_layout.clone()])
                .with_depth(DepthConfig::opaque(shadow_map.format()).with_bias(2, 2.0))
                .with_vertex_only(),
        );

        for &mode in &render_modes {
            pipeline_manager.register_pipeline(
                &pipeline_key(SCENE_PIPELINE, mode),
                PipelineConfig::default()
                    .with_label(&pipeline_key(SCENE_PIPELINE, mode))
                    .with_shader("scene")
                    .with_bind_group_layouts(vec![
                        globals_layout.clone(),
                        model_layout.clone(),
                        shadow_map.sampling_layout().clone(),
                    ])
                    .with_depth(DepthConfig::opaque(TextureResource::DEPTH_FORMAT))
                    .with_color_target(format)
                    .with_render_mode(mode),
            );
            pipeline_manager.register_pipeline(
                &pipeline_key(LIGHT_MARKER_PIPELINE, mode),
                PipelineConfig::default()
                    .with_label(&pipeline_key(LIGHT_MARKER_PIPELINE, mode))
                    .with_shader("light_marker")
                    .with_bind_group_layouts(vec![globals_layout.clone(), model_layout.clone()])
                    .with_depth(DepthConfig::opaque(TextureResource::DEPTH_FORMAT))
                    .with_color_target(format)
                    .with_render_mode(mode),
            );
        }

        pipeline_manager.register_pipeline(
            SKYBOX_PIPELINE,
            PipelineConfig::default()
                .with_label("SKYBOX")
                .with_shader("skybox")
                .with_bind_group_layouts(vec![globals_layout, skybox.layout().clone()])
                .with_depth(DepthConfig::background(TextureResource::DEPTH_FORMAT))
                .with_color_target(format)
                .with_no_vertex_buffers(),
        );

        pipeline_manager.register_pipeline(
            DEPTH_PREVIEW_PIPELINE,
            PipelineConfig::default()
                .with_label("DEPTH PREVIEW")
                .with_shader("depth_preview")
                .with_bind_group_layouts(vec![shadow_map.preview_layout().clone()])
                .with_color_target(format)
                .with_no_vertex_buffers(),
        );

        pipeline_manager.create_all_pipelines()?;
        log::info!(
            "Renderer ready: {}px shadow map, {}px skybox faces, {} model slots",
            shadow_map.size(),
            skybox.size(),
            object_count + 1
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            pipeline_manager,
            global_bindings,
            model_bindings,
            shadow_map,
            skybox,
            models,
            render_modes,
        })
    }

    /// Render modes this device can rasterize
    pub fn supported_render_modes(&self) -> Vec<RenderMode> {
        self.render_modes.clone()
    }

    /// Uploads the frame's uniforms, records all passes and presents.
    ///
    /// Surface loss is recovered by reconfiguring, and the frame is dropped.
    /// Validation errors are logged and never stop the loop.
    pub fn render_frame(&mut self, frame: &FrameData) {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for the next surface texture");
                return;
            }
            Err(err) => {
                log::error!("Failed to acquire surface texture: {err}");
                return;
            }
        };
        let target = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        self.global_bindings.update(&self.queue, frame);
        self.model_bindings
            .write(&self.queue, &frame_slots(&frame.objects, frame.light_marker));

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut recorder = PassRecorder {
                engine: self,
                encoder: &mut encoder,
                target: &target,
            };
            render_passes(&mut recorder, frame);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            log::error!("GPU validation error in frame {}: {error}", frame.frame_index);
        }

        surface_texture.present();
    }

    /// Resizes the surface and depth buffer. The shadow map keeps its size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
        let validation = pop_scope(&self.device, "resized depth buffer", ScopeKind::Validation);
        let allocation = pop_scope(&self.device, "resized depth buffer", ScopeKind::Allocation);
        if let Err(err) = validation.and(allocation) {
            log::error!("{err}");
            return;
        }
        log::debug!("Resized surface to {width}x{height}");
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn mode_pipeline(&self, base: &str, mode: RenderMode) -> Option<&wgpu::RenderPipeline> {
        self.pipeline_manager
            .get_pipeline(&pipeline_key(base, mode))
            .or_else(|| self.pipeline_manager.get_pipeline(&pipeline_key(base, RenderMode::Solid)))
    }
}

/// Everything allocated once the device exists, created under one error scope
struct GpuResources {
    depth_texture: TextureResource,
    shadow_map: ShadowMap,
    skybox: Skybox,
    global_bindings: GlobalBindings,
    model_bindings: ModelBindings,
    models: HashMap<ModelKind, Model>,
}

impl GpuResources {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
        app_config: &AppConfig,
        object_count: usize,
    ) -> Result<Self> {
        Ok(Self {
            depth_texture: TextureResource::create_depth_texture(device, config, "depth_texture"),
            shadow_map: ShadowMap::new(device, app_config.shadow_map_size)?,
            skybox: Skybox::new(device, queue, &app_config.assets)?,
            global_bindings: GlobalBindings::new(device),
            model_bindings: ModelBindings::new(device, object_count + 1),
            models: load_models(device, &app_config.assets)?,
        })
    }
}

#[derive(Clone, Copy)]
enum ScopeKind {
    Validation,
    Allocation,
}

fn pop_scope(device: &wgpu::Device, label: &str, kind: ScopeKind) -> Result<()> {
    let Some(error) = pollster::block_on(device.pop_error_scope()) else {
        return Ok(());
    };
    let (label, message) = (label.to_string(), error.to_string());
    Err(match kind {
        ScopeKind::Validation => StagelightError::Validation { label, message },
        ScopeKind::Allocation => StagelightError::Allocation { label, message },
    })
}

/// GPU errors outside any scope are logged instead of panicking
fn install_device_error_handlers(device: &wgpu::Device) {
    device.on_uncaptured_error(Box::new(|error| {
        log::error!("Uncaptured GPU error: {error}");
    }));
    device.set_device_lost_callback(|reason, message| {
        log::error!("GPU device lost ({reason:?}): {message}");
    });
}

fn load_models(device: &wgpu::Device, assets: &Path) -> Result<HashMap<ModelKind, Model>> {
    ModelKind::ALL
        .into_iter()
        .map(|kind| Model::load(device, assets.join(kind.relative_path())).map(|model| (kind, model)))
        .collect()
}

/// Records the passes of one frame into a command encoder
struct PassRecorder<'a> {
    engine: &'a RenderEngine,
    encoder: &'a mut wgpu::CommandEncoder,
    target: &'a wgpu::TextureView,
}

fn draw_objects(engine: &RenderEngine, pass: &mut wgpu::RenderPass<'_>, frame: &FrameData) {
    for (slot, object) in frame.objects.iter().enumerate() {
        if !engine.model_bindings.has_slot(slot) {
            break;
        }
        let Some(model) = engine.models.get(&object.id.model()) else {
            continue;
        };
        pass.set_bind_group(1, engine.model_bindings.bind_group(), &[engine.model_bindings.offset(slot)]);
        pass.draw_model(model);
    }
}

fn clear_color_attachment(target: &wgpu::TextureView) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view: target,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(CLEAR_COLOR),
            store: wgpu::StoreOp::Store,
        },
    }
}

impl RenderPasses for PassRecorder<'_> {
    fn depth_pass(&mut self, frame: &FrameData) {
        let engine = self.engine;
        let Some(pipeline) = engine.pipeline_manager.get_pipeline(SHADOW_PIPELINE) else {
            log::error!("Shadow pipeline missing");
            return;
        };

        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Depth Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: engine.shadow_map.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let size = engine.shadow_map.size() as f32;
        pass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, engine.global_bindings.bind_group(), &[]);
        draw_objects(engine, &mut pass, frame);
    }

    fn depth_map_preview(&mut self, _frame: &FrameData) {
        let engine = self.engine;
        let Some(pipeline) = engine.pipeline_manager.get_pipeline(DEPTH_PREVIEW_PIPELINE) else {
            log::error!("Depth preview pipeline missing");
            return;
        };

        let color_attachment = clear_color_attachment(self.target);
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Depth Map Preview Pass"),
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, engine.shadow_map.preview_bind_group(), &[]);
        pass.draw(0..3, 0..1);
    }

    fn main_pass(&mut self, frame: &FrameData) {
        let engine = self.engine;
        let color_attachment = clear_color_attachment(self.target);
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Main Render Pass"),
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &engine.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        pass.set_bind_group(0, engine.global_bindings.bind_group(), &[]);

        if let Some(pipeline) = engine.mode_pipeline(SCENE_PIPELINE, frame.render_mode) {
            pass.set_pipeline(pipeline);
            pass.set_bind_group(2, engine.shadow_map.sampling_bind_group(), &[]);
            draw_objects(engine, &mut pass, frame);
        }

        let marker_slot = frame.objects.len();
        if let (Some(pipeline), Some(cube), true) = (
            engine.mode_pipeline(LIGHT_MARKER_PIPELINE, frame.render_mode),
            engine.models.get(&ModelKind::LightMarker),
            engine.model_bindings.has_slot(marker_slot),
        ) {
            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, engine.model_bindings.bind_group(), &[engine.model_bindings.offset(marker_slot)]);
            pass.draw_model(cube);
        }

        if let Some(pipeline) = engine.pipeline_manager.get_pipeline(SKYBOX_PIPELINE) {
            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, engine.skybox.bind_group(), &[]);
            pass.draw(0..SKYBOX_VERTEX_COUNT, 0..1);
        }
    }
}
