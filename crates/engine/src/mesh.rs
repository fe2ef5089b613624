use std::path::Path;

use anyhow::{Context, Result, anyhow};
use assetlib::{AssetFile, MeshBounds, mesh_asset};

use crate::{Vec3, Vertex, vec3};

/// Culling volume of a mesh. `valid` is false until bounds have been computed or loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderBounds {
    pub origin: Vec3,
    pub radius: f32,
    pub extents: Vec3,
    pub valid: bool,
}

impl Default for RenderBounds {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            radius: 0.0,
            extents: Vec3::zeros(),
            valid: false,
        }
    }
}

impl From<MeshBounds> for RenderBounds {
    fn from(bounds: MeshBounds) -> Self {
        Self {
            origin: vec3(bounds.origin),
            radius: bounds.radius,
            extents: vec3(bounds.extents),
            valid: true,
        }
    }
}

/// CPU-side triangle list, ready for upload.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounds: RenderBounds,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Decodes a baked `MESH` asset, whatever vertex layout it was stored in.
    pub fn from_asset(file: &AssetFile) -> Result<Self> {
        let info = mesh_asset::read_mesh_info(file).context("failed to read mesh metadata")?;
        let (vertex_bytes, index_bytes) = mesh_asset::unpack_mesh_buffers(&info, &file.payload)
            .with_context(|| format!("failed to unpack mesh baked from {:?}", info.original_file))?;
        let decoded = mesh_asset::decode_vertices(&info, &vertex_bytes)
            .with_context(|| format!("cannot decode {} vertices", info.vertex_format))?;
        let indices = mesh_asset::read_indices(&index_bytes)?;

        Ok(Self {
            vertices: Vertex::from_decoded(decoded),
            indices,
            bounds: info.bounds.into(),
        })
    }

    pub fn from_asset_bytes(bytes: &[u8]) -> Result<Self> {
        let file = AssetFile::from_bytes(bytes).context("not a valid asset container")?;
        Self::from_asset(&file)
    }

    pub fn load_from_meshasset(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = AssetFile::load(path)?;
        Self::from_asset(&file).with_context(|| format!("failed to load mesh {:?}", path))
    }

    /// Loads a Wavefront OBJ from disk. Materials are ignored.
    pub fn from_obj_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (models, _materials) = tobj::load_obj(path, &obj_load_options())
            .with_context(|| format!("failed to parse OBJ {:?}", path))?;
        Self::from_obj_models(&models).with_context(|| format!("invalid OBJ {:?}", path))
    }

    pub fn from_obj_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = bytes;
        let (models, _materials) =
            tobj::load_obj_buf(&mut reader, &obj_load_options(), |_: &Path| {
                Err(tobj::LoadError::OpenFileFailed)
            })
            .context("failed to parse OBJ")?;
        Self::from_obj_models(&models)
    }

    /// One vertex per face corner, indices `0..n` in order. Missing normals and texture
    /// coordinates become zero, a missing color takes the normal. V is flipped to a
    /// top-left origin.
    pub fn from_obj_models(models: &[tobj::Model]) -> Result<Self> {
        let mut vertices = Vec::new();

        for model in models {
            let mesh = &model.mesh;
            for (corner, &position_index) in mesh.indices.iter().enumerate() {
                let position = triple(&mesh.positions, position_index).ok_or_else(|| {
                    anyhow!(
                        "model {:?}: position index {position_index} out of range",
                        model.name
                    )
                })?;
                let normal = mesh
                    .normal_indices
                    .get(corner)
                    .and_then(|&i| triple(&mesh.normals, i))
                    .unwrap_or([0.0; 3]);
                let uv = mesh
                    .texcoord_indices
                    .get(corner)
                    .and_then(|&i| pair(&mesh.texcoords, i))
                    .unwrap_or([0.0; 2]);
                let color = triple(&mesh.vertex_color, position_index).unwrap_or(normal);

                vertices.push(Vertex {
                    position,
                    normal,
                    color,
                    uv: [uv[0], 1.0 - uv[1]],
                });
            }
        }

        let count = u32::try_from(vertices.len())
            .map_err(|_| anyhow!("{} vertices do not fit 32-bit indices", vertices.len()))?;
        let bounds = mesh_asset::calculate_bounds(&vertices).into();

        Ok(Self {
            vertices,
            indices: (0..count).collect(),
            bounds,
        })
    }
}

fn obj_load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ..Default::default()
    }
}

fn triple(data: &[f32], index: u32) -> Option<[f32; 3]> {
    let start = index as usize * 3;
    data.get(start..start + 3).map(|s| [s[0], s[1], s[2]])
}

fn pair(data: &[f32], index: u32) -> Option<[f32; 2]> {
    let start = index as usize * 2;
    data.get(start..start + 2).map(|s| [s[0], s[1]])
}

#[cfg(test)]
mod tests {
    use assetlib::{CompressionMode, VertexFormat, VertexP32N8C8V16};
    use tempfile::tempdir;

    use super::*;

    const QUAD_OBJ: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn obj_quad_is_triangulated_and_flattened() {
        let mesh = Mesh::from_obj_bytes(QUAD_OBJ.as_bytes()).unwrap();

        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);

        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
            assert_eq!(v.color, v.normal);
        }
        // First corner: vt 0 0 flipped.
        assert_eq!(mesh.vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[0].uv, [0.0, 1.0]);

        assert!(mesh.bounds.valid);
        assert_eq!(mesh.bounds.origin, Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(mesh.bounds.extents, Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn obj_without_normals_or_uvs_defaults_to_zero() {
        let mesh = Mesh::from_obj_bytes(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0; 3]);
            assert_eq!(v.color, [0.0; 3]);
            assert_eq!(v.uv, [0.0, 1.0]);
        }
    }

    #[test]
    fn obj_vertex_colors_are_kept() {
        let obj = "v 0 0 0 1 0 0\nv 1 0 0 0 1 0\nv 0 1 0 0 0 1\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let mesh = Mesh::from_obj_bytes(obj.as_bytes()).unwrap();
        assert_eq!(mesh.vertices[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2].color, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[1].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn baked_float_mesh_loads_back_identical() {
        let source = Mesh::from_obj_bytes(QUAD_OBJ.as_bytes()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("quad.mesh");

        mesh_asset::pack_vertices(&source.vertices, &source.indices, "quad.obj")
            .unwrap()
            .save(&path)
            .unwrap();

        let loaded = Mesh::load_from_meshasset(&path).unwrap();
        assert_eq!(loaded.vertices, source.vertices);
        assert_eq!(loaded.indices, source.indices);
        assert_eq!(loaded.bounds, source.bounds);
    }

    #[test]
    fn baked_packed_mesh_is_promoted() {
        let source = Mesh::from_obj_bytes(QUAD_OBJ.as_bytes()).unwrap();
        let packed: Vec<VertexP32N8C8V16> =
            source.vertices.iter().copied().map(Into::into).collect();
        let file = mesh_asset::pack_vertices_with_compression(
            &packed,
            &source.indices,
            "quad.obj",
            CompressionMode::None,
        )
        .unwrap();
        assert_eq!(
            mesh_asset::read_mesh_info(&file).unwrap().vertex_format,
            VertexFormat::P32N8C8V16
        );

        let loaded = Mesh::from_asset_bytes(&file.to_bytes().unwrap()).unwrap();
        assert_eq!(loaded.vertices.len(), 6);
        for (a, b) in loaded.vertices.iter().zip(&source.vertices) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.uv, b.uv);
            assert!((a.normal[2] - b.normal[2]).abs() < 0.01);
        }
    }

    #[test]
    fn corrupted_buffer_size_is_an_error() {
        let source = Mesh::from_obj_bytes(QUAD_OBJ.as_bytes()).unwrap();
        let mut file = mesh_asset::pack_vertices(&source.vertices, &source.indices, "quad.obj")
            .unwrap();
        file.metadata = file.metadata.replace(
            "\"vertex_buffer_size\":264",
            "\"vertex_buffer_size\":9223372036854775808",
        );
        assert!(Mesh::from_asset(&file).is_err());
    }

    #[test]
    fn obj_with_overflowing_coordinate_cannot_be_packed() {
        let mesh = Mesh::from_obj_bytes(b"v 1e39 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert!(mesh.vertices[0].position[0].is_infinite());
        assert!(mesh_asset::pack_vertices(&mesh.vertices, &mesh.indices, "big.obj").is_err());
    }

    #[test]
    fn texture_asset_is_not_a_mesh() {
        let file = assetlib::texture_asset::pack_texture(
            &assetlib::TextureInfo::rgba8(1, 1, "x.png"),
            &[0, 0, 0, 255],
        )
        .unwrap();
        assert!(Mesh::from_asset(&file).is_err());
    }
}
