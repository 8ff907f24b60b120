//! Stagelight
//!
//! A real-time concert stage renderer built on wgpu and winit: shadow
//! mapped lighting, a free-fly camera and scripted gate, disco ball and
//! audience animations.

pub mod app;
pub mod config;
pub mod error;
pub mod frame;
pub mod gfx;
pub mod input;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::{run, StagelightApp};
pub use config::AppConfig;
pub use error::{Result, StagelightError};
pub use frame::{FrameData, FrameOrchestrator, FrameTiming, RenderPasses};
