//! # Graphics Module
//!
//! Camera, scene state, GPU resources and the render engine.
//!
//! - **Camera** ([`camera`]) - Free-fly camera with mouse look
//! - **Scene** ([`scene`]) - Models, animation state, lights and settings
//! - **Resources** ([`resources`]) - Uniform bindings, textures and the skybox
//! - **Rendering** ([`rendering`]) - Pipelines, shadow map and frame submission

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use camera::FpsCamera;
pub use rendering::render_engine::RenderEngine;
pub use scene::Scene;
