//! Error types for Stagelight
//!
//! All of these are initialization failures. Once the first frame has been
//! rendered nothing in the crate returns an error; GPU validation problems
//! during steady state are only logged.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagelightError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,

    #[error("failed to load model '{path}': {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model '{0}' contains no geometry")]
    EmptyModel(PathBuf),

    #[error("failed to load skybox face '{path}': {source}")]
    SkyboxFace {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("skybox face '{path}' is {width}x{height}, expected a {expected}x{expected} square")]
    SkyboxFaceSize {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("shader '{0}' has not been loaded")]
    MissingShader(String),

    #[error("GPU validation failed while creating {label}: {message}")]
    Validation { label: String, message: String },

    #[error("GPU error while allocating {label}: {message}")]
    Allocation { label: String, message: String },

    #[error("shadow map size {size} is outside 1..={max} supported by this device")]
    ShadowMapSize { size: u32, max: u32 },

    #[error("failed to create window: {0}")]
    CreateWindow(#[from] winit::error::OsError),
}

pub type Result<T> = std::result::Result<T, StagelightError>;
