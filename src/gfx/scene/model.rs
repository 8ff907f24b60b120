use std::path::{Path, PathBuf};

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use super::vertex::Vertex3D;
use crate::error::{Result, StagelightError};

const DEFAULT_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// Triangle mesh on the CPU, ready to be uploaded
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(positions: &[f32], normals: &[f32], indices: Vec<u32>, color: [f32; 3]) -> Self {
        let vertices = positions
            .chunks_exact(3)
            .zip(normals.chunks_exact(3))
            .map(|(p, n)| Vertex3D {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
                color,
            })
            .collect();

        Self { vertices, indices }
    }

    /// Converts one tobj mesh, computing smooth normals when the file has none
    pub fn from_obj(mesh: &tobj::Mesh, color: [f32; 3]) -> Self {
        let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            log::debug!("OBJ mesh has no normals, computing them from faces");
            Self::calculate_face_normals(&mesh.positions, &mesh.indices)
        };

        Self::new(&mesh.positions, &normals, mesh.indices.clone(), color)
    }

    /// Averages face normals onto the vertices they touch
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex = |i: u32| {
            let i = i as usize * 3;
            Vector3::new(positions[i], positions[i + 1], positions[i + 2])
        };

        let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len() / 3];
        for triangle in indices.chunks_exact(3) {
            let (v0, v1, v2) = (vertex(triangle[0]), vertex(triangle[1]), vertex(triangle[2]));
            let face_normal = (v1 - v0).cross(v2 - v0);
            for &idx in triangle {
                sums[idx as usize] += face_normal;
            }
        }

        sums.into_iter()
            .flat_map(|sum| {
                let n = if sum.magnitude2() > 0.0 { sum.normalize() } else { sum };
                [n.x, n.y, n.z]
            })
            .collect()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, data: &MeshData, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }
}

/// A loaded OBJ file, one GPU mesh per OBJ group
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
}

impl Model {
    /// Reads an OBJ (and its MTL, when present) into CPU meshes
    pub fn read_obj(path: &Path) -> Result<Vec<MeshData>> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| StagelightError::ModelLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|err| {
            log::warn!("No usable MTL for '{}' ({err}), using default colour", path.display());
            Vec::new()
        });

        let meshes: Vec<MeshData> = models
            .iter()
            .filter(|m| !m.mesh.indices.is_empty())
            .map(|m| {
                let color = m
                    .mesh
                    .material_id
                    .and_then(|id| materials.get(id))
                    .and_then(|mtl| mtl.diffuse)
                    .unwrap_or(DEFAULT_COLOR);
                MeshData::from_obj(&m.mesh, color)
            })
            .collect();

        if meshes.is_empty() {
            return Err(StagelightError::EmptyModel(path.to_path_buf()));
        }

        Ok(meshes)
    }

    pub fn load(device: &wgpu::Device, path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        let data = Self::read_obj(&path)?;
        let triangles: usize = data.iter().map(MeshData::triangle_count).sum();
        log::info!("Loaded '{}': {} meshes, {} triangles", path.display(), data.len(), triangles);

        let meshes = data.iter().map(|mesh| Mesh::upload(device, mesh, &name)).collect();
        Ok(Self { name, meshes })
    }
}

pub trait DrawModel {
    fn draw_mesh(&mut self, mesh: &Mesh);
    fn draw_model(&mut self, model: &Model);
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn draw_model(&mut self, model: &Model) {
        for mesh in &model.meshes {
            self.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_POSITIONS: [f32; 12] = [
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 0.0, -1.0, //
        0.0, 0.0, -1.0,
    ];
    const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

    #[test]
    fn test_face_normals_of_flat_quad_point_up() {
        let normals = MeshData::calculate_face_normals(&QUAD_POSITIONS, &QUAD_INDICES);
        assert_eq!(normals.len(), QUAD_POSITIONS.len());
        for n in normals.chunks_exact(3) {
            assert!((n[0]).abs() < 1e-6);
            assert!((n[1] - 1.0).abs() < 1e-6);
            assert!((n[2]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unreferenced_vertex_keeps_zero_normal() {
        let mut positions = QUAD_POSITIONS.to_vec();
        positions.extend_from_slice(&[5.0, 5.0, 5.0]);
        let normals = MeshData::calculate_face_normals(&positions, &QUAD_INDICES);
        assert_eq!(&normals[12..15], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_mesh_data_bakes_color() {
        let normals = [0.0f32, 1.0, 0.0].repeat(4);
        let data = MeshData::new(&QUAD_POSITIONS, &normals, QUAD_INDICES.to_vec(), [0.1, 0.2, 0.3]);
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.triangle_count(), 2);
        assert!(data.vertices.iter().all(|v| v.color == [0.1, 0.2, 0.3]));
    }

    #[test]
    fn test_missing_obj_is_an_error() {
        let err = Model::read_obj(Path::new("/definitely/not/here.obj")).unwrap_err();
        assert!(matches!(err, StagelightError::ModelLoad { .. }));
    }
}
