use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use assetlib::{VertexFormat, VertexP32N8C8V16, mesh_asset, texture_asset};
use engine::{Mesh, StepTimer, Texture2D};

use crate::config::BakeConfig;

/// Source asset kinds the baker knows, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Mesh,
    Texture,
}

impl AssetKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "obj" => Some(AssetKind::Mesh),
            "png" => Some(AssetKind::Texture),
            _ => None,
        }
    }

    pub fn output_extension(self) -> &'static str {
        match self {
            AssetKind::Mesh => "mesh",
            AssetKind::Texture => "tx",
        }
    }

    /// Next to the source, extension swapped.
    pub fn output_path(self, input: &Path) -> PathBuf {
        input.with_extension(self.output_extension())
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Mesh => f.write_str("mesh"),
            AssetKind::Texture => f.write_str("texture"),
        }
    }
}

pub fn convert(kind: AssetKind, input: &Path, output: &Path, config: &BakeConfig) -> Result<()> {
    match kind {
        AssetKind::Mesh => convert_mesh(input, output, config),
        AssetKind::Texture => convert_image(input, output, config),
    }
}

pub fn convert_mesh(input: &Path, output: &Path, config: &BakeConfig) -> Result<()> {
    let timer = StepTimer::start(format!("obj {}", input.display()));
    let mesh = Mesh::from_obj_file(input)?;
    timer.finish();

    let original_file = input.display().to_string();
    let timer = StepTimer::start(format!("mesh compression {}", input.display()));
    let file = match config.vertex_format {
        VertexFormat::PncvF32 => mesh_asset::pack_vertices_with_compression(
            &mesh.vertices,
            &mesh.indices,
            &original_file,
            config.compression,
        )?,
        VertexFormat::P32N8C8V16 => {
            let packed: Vec<VertexP32N8C8V16> =
                mesh.vertices.iter().copied().map(Into::into).collect();
            mesh_asset::pack_vertices_with_compression(
                &packed,
                &mesh.indices,
                &original_file,
                config.compression,
            )?
        }
        VertexFormat::Unknown => bail!("cannot bake {:?}: no vertex format selected", input),
    };
    timer.finish();

    log::debug!(
        "{}: {} vertices ({}), {} indices, payload {} bytes",
        input.display(),
        mesh.vertices.len(),
        config.vertex_format,
        mesh.indices.len(),
        file.payload.len()
    );

    file.save(output)
        .with_context(|| format!("failed to write {:?}", output))
}

pub fn convert_image(input: &Path, output: &Path, config: &BakeConfig) -> Result<()> {
    let timer = StepTimer::start(format!("texture load {}", input.display()));
    let texture = Texture2D::from_file(input)
        .map_err(|e| anyhow!(format!("failed to decode image {:?}: {}", input, e)))?;
    timer.finish();

    let timer = StepTimer::start(format!("texture compression {}", input.display()));
    let info = texture.to_texture_info(input.display().to_string());
    let file =
        texture_asset::pack_texture_with_compression(&info, config.compression, &texture.pixels)?;
    timer.finish();

    log::debug!(
        "{}: {}x{}, payload {} of {} bytes",
        input.display(),
        texture.width,
        texture.height,
        file.payload.len(),
        texture.pixels.len()
    );

    file.save(output)
        .with_context(|| format!("failed to write {:?}", output))
}

#[cfg(test)]
mod tests {
    use assetlib::{AssetFile, CompressionMode};
    use tempfile::tempdir;

    use super::*;

    const CUBE_CORNER_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
vn 0 0 -1
vn 0 -1 0
f 1//1 3//1 2//1
f 1//2 2//2 4//2
";

    #[test]
    fn extension_table() {
        assert_eq!(AssetKind::from_path(Path::new("a/b.obj")), Some(AssetKind::Mesh));
        assert_eq!(AssetKind::from_path(Path::new("b.png")), Some(AssetKind::Texture));
        assert_eq!(AssetKind::from_path(Path::new("b.jpg")), None);
        assert_eq!(AssetKind::from_path(Path::new("README")), None);
        assert_eq!(
            AssetKind::Texture.output_path(Path::new("dir/wall.png")),
            PathBuf::from("dir/wall.tx")
        );
        assert_eq!(
            AssetKind::Mesh.output_path(Path::new("dir/box.obj")),
            PathBuf::from("dir/box.mesh")
        );
    }

    #[test]
    fn mesh_in_packed_layout_uncompressed() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("corner.obj");
        let output = dir.path().join("corner.mesh");
        std::fs::write(&input, CUBE_CORNER_OBJ).unwrap();

        let config = BakeConfig {
            vertex_format: VertexFormat::P32N8C8V16,
            compression: CompressionMode::None,
        };
        convert_mesh(&input, &output, &config).unwrap();

        let file = AssetFile::load(&output).unwrap();
        let info = mesh_asset::read_mesh_info(&file).unwrap();
        assert_eq!(info.vertex_format, VertexFormat::P32N8C8V16);
        assert_eq!(info.compression_mode, CompressionMode::None);
        assert_eq!(info.vertex_buffer_size, 6 * 26);
        assert_eq!(info.index_buffer_size, 6 * 4);
        assert_eq!(info.original_file, input.display().to_string());
        assert_eq!(info.bounds.origin, [0.5, 0.5, 0.5]);
        assert_eq!(file.payload.len(), 6 * 26 + 6 * 4);
    }

    #[test]
    fn out_of_range_coordinate_is_not_baked() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("huge.obj");
        let output = dir.path().join("huge.mesh");
        std::fs::write(&input, "v 1e39 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        assert!(convert_mesh(&input, &output, &BakeConfig::default()).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn missing_source_fails_without_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nothing.tx");
        let err = convert_image(
            &dir.path().join("nothing.png"),
            &output,
            &BakeConfig::default(),
        );
        assert!(err.is_err());
        assert!(!output.exists());
    }
}
