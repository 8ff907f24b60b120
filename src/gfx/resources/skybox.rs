//! Night-sky cube texture loaded from six TGA faces

use std::path::{Path, PathBuf};

use super::texture_resource::TextureResource;
use crate::error::{Result, StagelightError};
use crate::wgpu_utils::{binding_types, layout_entry};

/// Face files in cube layer order: +X, -X, +Y, -Y, +Z, -Z
pub const SKYBOX_FACES: [&str; 6] = [
    "skybox/nightsky_rt.tga",
    "skybox/nightsky_lf.tga",
    "skybox/nightsky_up.tga",
    "skybox/nightsky_dn.tga",
    "skybox/nightsky_bk.tga",
    "skybox/nightsky_ft.tga",
];

/// Decoded RGBA8 faces sharing one square edge length
pub struct CubeFaces {
    pub size: u32,
    pub faces: [Vec<u8>; 6],
}

/// Returns the common edge length, or the first face that breaks it
pub fn common_face_size(faces: &[(PathBuf, u32, u32)]) -> Result<u32> {
    let expected = faces.first().map(|(_, width, _)| *width).unwrap_or(0);
    for (path, width, height) in faces {
        if *width != expected || *height != expected || expected == 0 {
            return Err(StagelightError::SkyboxFaceSize {
                path: path.clone(),
                width: *width,
                height: *height,
                expected,
            });
        }
    }
    Ok(expected)
}

pub fn load_faces(assets: &Path) -> Result<CubeFaces> {
    let mut sizes = Vec::with_capacity(SKYBOX_FACES.len());
    let mut pixels = Vec::with_capacity(SKYBOX_FACES.len());

    for face in SKYBOX_FACES {
        let path = assets.join(face);
        let image = image::open(&path)
            .map_err(|source| StagelightError::SkyboxFace {
                path: path.clone(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        sizes.push((path, width, height));
        pixels.push(image.into_raw());
    }

    let size = common_face_size(&sizes)?;
    let faces: [Vec<u8>; 6] = pixels
        .try_into()
        .map_err(|_| StagelightError::Validation {
            label: "Skybox".to_string(),
            message: "expected exactly six faces".to_string(),
        })?;

    Ok(CubeFaces { size, faces })
}

pub struct Skybox {
    cubemap: TextureResource,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl Skybox {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, assets: &Path) -> Result<Self> {
        let faces = load_faces(assets)?;
        let cubemap = TextureResource::create_cubemap(device, queue, &faces.faces, faces.size, "Skybox");

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox Layout"),
            entries: &[
                layout_entry(0, wgpu::ShaderStages::FRAGMENT, binding_types::texture_cube()),
                layout_entry(
                    1,
                    wgpu::ShaderStages::FRAGMENT,
                    binding_types::sampler(wgpu::SamplerBindingType::Filtering),
                ),
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cubemap.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&cubemap.sampler),
                },
            ],
        });

        log::info!("Loaded skybox with {0}x{0} faces", faces.size);

        Ok(Self {
            cubemap,
            layout,
            bind_group,
        })
    }

    pub fn size(&self) -> u32 {
        self.cubemap.texture.width()
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(name: &str, width: u32, height: u32) -> (PathBuf, u32, u32) {
        (PathBuf::from(name), width, height)
    }

    #[test]
    fn test_matching_square_faces_pass() {
        let faces: Vec<_> = (0..6).map(|i| face(&format!("f{i}"), 64, 64)).collect();
        assert_eq!(common_face_size(&faces).unwrap(), 64);
    }

    #[test]
    fn test_mismatched_face_is_reported() {
        let mut faces: Vec<_> = (0..6).map(|i| face(&format!("f{i}"), 64, 64)).collect();
        faces[4] = face("bad", 32, 32);
        match common_face_size(&faces) {
            Err(StagelightError::SkyboxFaceSize { path, width, expected, .. }) => {
                assert_eq!(path, PathBuf::from("bad"));
                assert_eq!(width, 32);
                assert_eq!(expected, 64);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_non_square_face_is_rejected() {
        let faces = vec![face("wide", 64, 32)];
        assert!(common_face_size(&faces).is_err());
    }

    #[test]
    fn test_load_faces_from_disk() {
        let dir = std::env::temp_dir().join(format!("stagelight-skybox-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("skybox")).unwrap();
        for name in SKYBOX_FACES {
            image::RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 255]))
                .save(dir.join(name))
                .unwrap();
        }

        let cube = load_faces(&dir).unwrap();
        assert_eq!(cube.size, 8);
        assert!(cube.faces.iter().all(|f| f.len() == 8 * 8 * 4));
        assert_eq!(&cube.faces[0][..4], &[10, 20, 30, 255]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_face_is_an_error() {
        let err = load_faces(Path::new("/definitely/not/here")).err().unwrap();
        assert!(matches!(err, StagelightError::SkyboxFace { .. }));
    }
}
