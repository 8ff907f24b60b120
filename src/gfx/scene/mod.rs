//! # Scene Module
//!
//! CPU-side state of the stage: the animated objects, the lights, the
//! render switches and the meshes they are drawn with.
//!
//! ## Key Components
//!
//! - [`Scene`] - Owns the camera, animation state, lights and settings
//! - [`AnimationState`] - Gates, disco ball and audience, advanced once per frame
//! - [`ObjectTransform`] - One entry of the per-frame model matrix list
//! - [`Model`] - OBJ geometry uploaded to the GPU
//! - [`Vertex3D`] - Vertex layout shared by every mesh

pub mod animation;
pub mod audience;
pub mod lighting;
pub mod model;
pub mod scene;
pub mod settings;
pub mod vertex;

// Re-export main types
pub use animation::{AnimationState, DiscoBall, Gate, GateSide, Gates};
pub use audience::{Audience, AudienceMember};
pub use lighting::{LightConfig, LightRig, SpotLight};
pub use model::{DrawModel, Mesh, MeshData, Model};
pub use scene::{CameraConfig, ModelKind, ObjectId, ObjectTransform, Scene};
pub use settings::{RenderMode, SceneSettings};
pub use vertex::Vertex3D;
