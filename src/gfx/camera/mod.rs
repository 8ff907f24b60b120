pub mod camera_utils;
pub mod fps_camera;
pub mod mouse_look;

// Re-export main types
pub use camera_utils::{Camera, Projection, OPENGL_TO_WGPU_MATRIX};
pub use fps_camera::{FpsCamera, MoveDirection};
pub use mouse_look::MouseLook;
