use cgmath::{perspective, Deg, Matrix4, Vector3};

/// Maps OpenGL clip space (z in [-1, 1]) onto wgpu clip space (z in [0, 1])
///
/// `Matrix4::new` is column-major: z' = 0.5z + 0.5w, w' = w.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub fn world_up() -> Vector3<f32> {
    Vector3::unit_y()
}

pub trait Camera: Sized {
    fn view_matrix(&self) -> Matrix4<f32>;
}

/// Perspective projection parameters for the main pass
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fovy: Deg(90.0),
            aspect: 16.0 / 9.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

impl Projection {
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Drops the translation column so the skybox stays centred on the eye
pub fn without_translation(view: Matrix4<f32>) -> Matrix4<f32> {
    let mut rotation = view;
    rotation.w = cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
    rotation
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, SquareMatrix, Vector4};

    #[test]
    fn test_projection_maps_near_plane_to_zero_depth() {
        let projection = Projection::default();
        let clip = projection.matrix() * Vector4::new(0.0, 0.0, -projection.znear, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-5);

        let clip = projection.matrix() * Vector4::new(0.0, 0.0, -projection.zfar, 1.0);
        assert!((clip.z / clip.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_clip_correction_keeps_w_and_remaps_depth() {
        let clip = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.3, -0.2, -1.0, 1.0);
        assert_eq!(clip, Vector4::new(0.3, -0.2, 0.0, 1.0));

        let clip = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.0, 0.0, 2.0, 2.0);
        assert_eq!(clip.w, 2.0);
        assert_eq!(clip.z / clip.w, 1.0);
    }

    #[test]
    fn test_resize_ignores_zero_extent() {
        let mut projection = Projection::default();
        projection.resize(800, 0);
        assert!((projection.aspect - 16.0 / 9.0).abs() < f32::EPSILON);
        projection.resize(800, 400);
        assert!((projection.aspect - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_without_translation_keeps_rotation() {
        let view = Matrix4::look_at_rh(
            Point3::new(4.0, 2.0, 9.0),
            Point3::new(0.0, 0.0, 0.0),
            world_up(),
        );
        let sky = without_translation(view);
        assert_eq!(sky.x, view.x);
        assert_eq!(sky.y, view.y);
        assert_eq!(sky.z, view.z);
        assert_eq!(sky.w, Vector4::new(0.0, 0.0, 0.0, 1.0));
        assert!(Matrix4::<f32>::identity() != sky);
    }
}
