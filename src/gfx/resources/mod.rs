//! GPU resource management
//!
//! Handles textures, buffers, and bind groups for rendering.

pub mod global_bindings;
pub mod model_bindings;
pub mod skybox;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{GlobalBindings, GlobalUBOContent};
pub use model_bindings::{ModelBindings, ModelUniform};
pub use skybox::Skybox;
pub use texture_resource::TextureResource;
