//! Application configuration
//!
//! [`AppConfig`] is parsed from the command line by the binary; the library
//! only ever sees the finished struct, so `Default` carries the values the
//! scene was authored with.

use std::path::PathBuf;

use clap::Parser;

/// Top-level settings for a Stagelight run
#[derive(Debug, Clone, Parser)]
#[command(name = "stagelight", version, about = "Real-time concert stage renderer")]
pub struct AppConfig {
    /// Directory containing the `models/` and `skybox/` folders
    #[arg(long, default_value = "assets")]
    pub assets: PathBuf,

    /// Initial window width in physical pixels
    #[arg(long, default_value_t = 1600)]
    pub width: u32,

    /// Initial window height in physical pixels
    #[arg(long, default_value_t = 900)]
    pub height: u32,

    /// Edge length of the square shadow map, in texels
    #[arg(long, default_value_t = 2048, value_parser = clap::value_parser!(u32).range(1..))]
    pub shadow_map_size: u32,

    /// Seed for the audience's per-member random streams
    #[arg(long, default_value_t = 0x5eed)]
    pub audience_seed: u64,

    /// Present with vsync instead of as fast as possible
    #[arg(long)]
    pub vsync: bool,

    /// Drive each gate from its own direction flag
    #[arg(long)]
    pub independent_gates: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("assets"),
            width: 1600,
            height: 900,
            shadow_map_size: 2048,
            audience_seed: 0x5eed,
            vsync: false,
            independent_gates: false,
        }
    }
}

impl AppConfig {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
