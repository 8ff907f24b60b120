/// Fog density change per frame while the fog actions are held
pub const FOG_STEP: f32 = 0.001;

/// How triangles are rasterized in the main and depth passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    #[default]
    Solid,
    Wireframe,
    Points,
}

/// Process-wide switches mutated by input and read by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSettings {
    pub animations_enabled: bool,
    pub spot_light_enabled: bool,
    pub point_light_enabled: bool,
    pub show_depth_map: bool,
    pub preview_active: bool,
    pub render_mode: RenderMode,
    fog_density: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            animations_enabled: false,
            spot_light_enabled: false,
            point_light_enabled: false,
            show_depth_map: false,
            preview_active: false,
            render_mode: RenderMode::Solid,
            fog_density: 0.01,
        }
    }
}

impl SceneSettings {
    pub fn fog_density(&self) -> f32 {
        self.fog_density
    }

    pub fn set_fog_density(&mut self, density: f32) {
        self.fog_density = density.clamp(0.0, 1.0);
    }

    pub fn increase_fog(&mut self) {
        self.fog_density = (self.fog_density + FOG_STEP).min(1.0);
    }

    pub fn decrease_fog(&mut self) {
        self.fog_density = (self.fog_density - FOG_STEP).max(0.0);
    }
}
