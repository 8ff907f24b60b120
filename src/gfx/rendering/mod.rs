//! Core rendering functionality
//!
//! Handles render pipelines, the shadow map and frame rendering.

pub mod pipeline_manager;
pub mod render_engine;
pub mod shadow_map;

pub use pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
pub use shadow_map::{compute_light_space_matrix, ShadowMap};
