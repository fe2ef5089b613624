//! `MESH` assets: one vertex buffer and one `u32` index buffer, concatenated and
//! compressed into the payload, described by a [`MeshMetadata`] document.

use std::{fmt, mem::size_of};

use bytemuck::{Pod, Zeroable};

use crate::{
    AssetError, AssetFile, AssetResult, CompressionMode,
    compression::{check_decompressed_len, compress, decompress},
    metadata::{self, MeshMetadata},
};

pub const MESH_KIND: [u8; 4] = *b"MESH";
pub const MESH_VERSION: u32 = 1;
/// Indices are always 32-bit unsigned.
pub const INDEX_SIZE: u8 = size_of::<u32>() as u8;

/// Byte layout of the vertex buffer. Closed set: a new layout needs a new variant, a
/// new [`PackedVertex`] struct and a new [`DecodedVertices`] arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexFormat {
    #[default]
    Unknown,
    /// Position, normal, color and uv, everything `f32`.
    PncvF32,
    /// `f32` position, `u8` unorm normal and color, `f32` uv.
    P32N8C8V16,
}

impl VertexFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            VertexFormat::Unknown => "Unknown",
            VertexFormat::PncvF32 => "PNCV_F32",
            VertexFormat::P32N8C8V16 => "P32N8C8V16",
        }
    }

    /// Unrecognised names map to [`VertexFormat::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "PNCV_F32" => VertexFormat::PncvF32,
            "P32N8C8V16" => VertexFormat::P32N8C8V16,
            _ => VertexFormat::Unknown,
        }
    }

    /// Size in bytes of one vertex, `None` for [`VertexFormat::Unknown`].
    pub fn stride(self) -> Option<usize> {
        match self {
            VertexFormat::Unknown => None,
            VertexFormat::PncvF32 => Some(size_of::<VertexPncvF32>()),
            VertexFormat::P32N8C8V16 => Some(size_of::<VertexP32N8C8V16>()),
        }
    }
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexPncvF32 {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

/// Packed so the on-disk stride stays 26 bytes with no implicit padding.
/// Read fields by value (`let p = v.position;`), never by reference.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexP32N8C8V16 {
    pub position: [f32; 3],
    pub normal: [u8; 3],
    pub color: [u8; 3],
    pub uv: [f32; 2],
}

const _: () = assert!(size_of::<VertexPncvF32>() == 44);
const _: () = assert!(size_of::<VertexP32N8C8V16>() == 26);

/// A vertex struct that can be written verbatim into a mesh asset.
pub trait PackedVertex: Pod {
    const FORMAT: VertexFormat;

    fn position(&self) -> [f32; 3];
}

impl PackedVertex for VertexPncvF32 {
    const FORMAT: VertexFormat = VertexFormat::PncvF32;

    fn position(&self) -> [f32; 3] {
        self.position
    }
}

impl PackedVertex for VertexP32N8C8V16 {
    const FORMAT: VertexFormat = VertexFormat::P32N8C8V16;

    fn position(&self) -> [f32; 3] {
        self.position
    }
}

/// `[-1, 1]` -> `[0, 255]`, truncating.
pub fn quantize_normal(n: f32) -> u8 {
    (((n.clamp(-1.0, 1.0) + 1.0) / 2.0) * 255.0) as u8
}

/// `[0, 1]` -> `[0, 255]`, truncating.
pub fn quantize_color(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0) as u8
}

pub fn dequantize_normal(b: u8) -> f32 {
    f32::from(b) / 255.0 * 2.0 - 1.0
}

pub fn dequantize_color(b: u8) -> f32 {
    f32::from(b) / 255.0
}

impl VertexP32N8C8V16 {
    pub fn normal_f32(&self) -> [f32; 3] {
        let normal = self.normal;
        normal.map(dequantize_normal)
    }

    pub fn color_f32(&self) -> [f32; 3] {
        let color = self.color;
        color.map(dequantize_color)
    }
}

impl From<VertexPncvF32> for VertexP32N8C8V16 {
    fn from(v: VertexPncvF32) -> Self {
        Self {
            position: v.position,
            normal: v.normal.map(quantize_normal),
            color: v.color.map(quantize_color),
            uv: v.uv,
        }
    }
}

impl From<VertexP32N8C8V16> for VertexPncvF32 {
    fn from(v: VertexP32N8C8V16) -> Self {
        Self {
            position: v.position,
            normal: v.normal_f32(),
            color: v.color_f32(),
            uv: v.uv,
        }
    }
}

/// Box-centred bounding sphere plus box half-widths.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeshBounds {
    pub origin: [f32; 3],
    pub radius: f32,
    pub extents: [f32; 3],
}

impl MeshBounds {
    /// Metadata order: origin, radius, extents.
    pub fn to_array(&self) -> [f32; 7] {
        let [ox, oy, oz] = self.origin;
        let [ex, ey, ez] = self.extents;
        [ox, oy, oz, self.radius, ex, ey, ez]
    }

    pub fn from_array(data: [f32; 7]) -> Self {
        Self {
            origin: [data[0], data[1], data[2]],
            radius: data[3],
            extents: [data[4], data[5], data[6]],
        }
    }
}

/// Axis-aligned box of the positions, then the radius of the sphere centred on the box
/// centre that contains every position. An empty slice yields all-zero bounds.
pub fn calculate_bounds<V: PackedVertex>(vertices: &[V]) -> MeshBounds {
    if vertices.is_empty() {
        return MeshBounds::default();
    }

    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for vertex in vertices {
        let position = vertex.position();
        for axis in 0..3 {
            min[axis] = min[axis].min(position[axis]);
            max[axis] = max[axis].max(position[axis]);
        }
    }

    let mut bounds = MeshBounds::default();
    for axis in 0..3 {
        bounds.extents[axis] = (max[axis] - min[axis]) / 2.0;
        bounds.origin[axis] = min[axis] + bounds.extents[axis];
    }

    let mut radius_sq = 0.0f32;
    for vertex in vertices {
        let position = vertex.position();
        let distance_sq: f32 = (0..3)
            .map(|axis| {
                let d = position[axis] - bounds.origin[axis];
                d * d
            })
            .sum();
        radius_sq = radius_sq.max(distance_sq);
    }
    bounds.radius = radius_sq.sqrt();

    bounds
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshInfo {
    /// Uncompressed byte length of the vertex buffer.
    pub vertex_buffer_size: u64,
    /// Uncompressed byte length of the index buffer.
    pub index_buffer_size: u64,
    pub bounds: MeshBounds,
    pub vertex_format: VertexFormat,
    pub index_size: u8,
    /// Scheme the payload was compressed with. Read side only: packers choose their own.
    pub compression_mode: CompressionMode,
    pub original_file: String,
}

impl MeshInfo {
    /// Info for `vertices` and `indices` packed as-is, with freshly computed bounds.
    pub fn for_vertices<V: PackedVertex>(
        vertices: &[V],
        indices: &[u32],
        original_file: impl Into<String>,
    ) -> Self {
        Self {
            vertex_buffer_size: (vertices.len() * size_of::<V>()) as u64,
            index_buffer_size: (indices.len() * size_of::<u32>()) as u64,
            bounds: calculate_bounds(vertices),
            vertex_format: V::FORMAT,
            index_size: INDEX_SIZE,
            compression_mode: CompressionMode::Lz4,
            original_file: original_file.into(),
        }
    }

    pub fn vertex_count(&self) -> Option<u64> {
        let stride = self.vertex_format.stride()? as u64;
        Some(self.vertex_buffer_size / stride)
    }

    pub fn index_count(&self) -> u64 {
        match self.index_size {
            0 => 0,
            size => self.index_buffer_size / u64::from(size),
        }
    }

    /// Length of the decompressed payload.
    pub fn payload_size(&self) -> AssetResult<usize> {
        self.vertex_buffer_size
            .checked_add(self.index_buffer_size)
            .and_then(|total| usize::try_from(total).ok())
            .ok_or_else(|| {
                AssetError::InvalidBufferSize(format!(
                    "vertex ({}) + index ({}) buffer sizes overflow",
                    self.vertex_buffer_size, self.index_buffer_size
                ))
            })
    }

    /// Checks the declared sizes against the layout contract: a known vertex format,
    /// 4-byte indices, and both buffers a whole number of elements.
    pub fn check_layout(&self) -> AssetResult<()> {
        let stride = self
            .vertex_format
            .stride()
            .ok_or(AssetError::UnknownVertexFormat)?;

        if self.index_size != INDEX_SIZE {
            return Err(AssetError::InvalidBufferSize(format!(
                "index size {} is not supported, indices are {INDEX_SIZE} bytes",
                self.index_size
            )));
        }
        if self.index_buffer_size % u64::from(self.index_size) != 0 {
            return Err(AssetError::InvalidBufferSize(format!(
                "index buffer of {} bytes is not a multiple of {}",
                self.index_buffer_size, self.index_size
            )));
        }
        if self.vertex_buffer_size % stride as u64 != 0 {
            return Err(AssetError::InvalidBufferSize(format!(
                "vertex buffer of {} bytes is not a multiple of the {} stride ({stride})",
                self.vertex_buffer_size, self.vertex_format
            )));
        }
        Ok(())
    }

    fn to_metadata(&self, compression: CompressionMode) -> MeshMetadata {
        MeshMetadata {
            vertex_format: self.vertex_format.as_str().to_string(),
            vertex_buffer_size: self.vertex_buffer_size,
            index_buffer_size: self.index_buffer_size,
            index_size: self.index_size,
            original_file: self.original_file.clone(),
            bounds: self.bounds.to_array(),
            compression: compression.as_str().to_string(),
        }
    }

    fn from_metadata(meta: MeshMetadata) -> Self {
        Self {
            vertex_buffer_size: meta.vertex_buffer_size,
            index_buffer_size: meta.index_buffer_size,
            bounds: MeshBounds::from_array(meta.bounds),
            vertex_format: VertexFormat::from_name(&meta.vertex_format),
            index_size: meta.index_size,
            compression_mode: CompressionMode::from_name(&meta.compression)
                .unwrap_or(CompressionMode::None),
            original_file: meta.original_file,
        }
    }
}

/// Packs raw vertex and index bytes with LZ4.
pub fn pack_mesh(info: &MeshInfo, vertex_bytes: &[u8], index_bytes: &[u8]) -> AssetResult<AssetFile> {
    pack_mesh_with_compression(info, CompressionMode::Lz4, vertex_bytes, index_bytes)
}

pub fn pack_mesh_with_compression(
    info: &MeshInfo,
    compression: CompressionMode,
    vertex_bytes: &[u8],
    index_bytes: &[u8],
) -> AssetResult<AssetFile> {
    expect_len("vertex buffer", info.vertex_buffer_size, vertex_bytes.len())?;
    expect_len("index buffer", info.index_buffer_size, index_bytes.len())?;
    info.check_layout()?;
    let bounds = info.bounds.to_array();
    if !bounds.iter().all(|v| v.is_finite()) {
        return Err(AssetError::NonFiniteBounds(bounds));
    }

    let mut merged = Vec::with_capacity(info.payload_size()?);
    merged.extend_from_slice(vertex_bytes);
    merged.extend_from_slice(index_bytes);

    let payload = compress(compression, &merged);
    let json = metadata::to_json(&info.to_metadata(compression))?;

    Ok(AssetFile::new(MESH_KIND, MESH_VERSION, json, payload))
}

/// Packs typed vertices and indices, computing bounds on the way.
/// Every index must address an existing vertex.
pub fn pack_vertices<V: PackedVertex>(
    vertices: &[V],
    indices: &[u32],
    original_file: &str,
) -> AssetResult<AssetFile> {
    pack_vertices_with_compression(vertices, indices, original_file, CompressionMode::Lz4)
}

pub fn pack_vertices_with_compression<V: PackedVertex>(
    vertices: &[V],
    indices: &[u32],
    original_file: &str,
    compression: CompressionMode,
) -> AssetResult<AssetFile> {
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        return Err(AssetError::InvalidBufferSize(format!(
            "index {bad} out of range for {} vertices",
            vertices.len()
        )));
    }

    let info = MeshInfo::for_vertices(vertices, indices, original_file);
    pack_mesh_with_compression(
        &info,
        compression,
        bytemuck::cast_slice(vertices),
        bytemuck::cast_slice(indices),
    )
}

/// Parses the metadata of a `MESH` asset. An unrecognised vertex format name yields
/// [`VertexFormat::Unknown`]; decoding such a mesh is refused later.
pub fn read_mesh_info(file: &AssetFile) -> AssetResult<MeshInfo> {
    if file.kind != MESH_KIND {
        return Err(AssetError::WrongKind {
            expected: MESH_KIND,
            found: file.kind,
        });
    }
    if file.version > MESH_VERSION {
        return Err(AssetError::UnsupportedVersion {
            kind: "mesh",
            version: file.version,
            supported: MESH_VERSION,
        });
    }

    let meta: MeshMetadata = metadata::from_json(&file.metadata)?;
    Ok(MeshInfo::from_metadata(meta))
}

/// Decompresses `source` and splits it into the caller's buffers, which must be sized
/// exactly `info.vertex_buffer_size` and `info.index_buffer_size`. On failure neither
/// buffer is touched.
pub fn unpack_mesh(
    info: &MeshInfo,
    source: &[u8],
    vertex_out: &mut [u8],
    index_out: &mut [u8],
) -> AssetResult<()> {
    expect_len("vertex output buffer", info.vertex_buffer_size, vertex_out.len())?;
    expect_len("index output buffer", info.index_buffer_size, index_out.len())?;

    let decompressed = decompress(info.compression_mode, source, info.payload_size()?)?;
    let (vertices, indices) = decompressed.split_at(vertex_out.len());
    vertex_out.copy_from_slice(vertices);
    index_out.copy_from_slice(indices);
    Ok(())
}

/// [`unpack_mesh`] into freshly allocated `(vertex_bytes, index_bytes)`.
pub fn unpack_mesh_buffers(info: &MeshInfo, source: &[u8]) -> AssetResult<(Vec<u8>, Vec<u8>)> {
    check_decompressed_len(info.compression_mode, source.len(), info.payload_size()? as u64)?;
    let mut vertex_bytes = vec![0u8; buffer_len(info.vertex_buffer_size)?];
    let mut index_bytes = vec![0u8; buffer_len(info.index_buffer_size)?];
    unpack_mesh(info, source, &mut vertex_bytes, &mut index_bytes)?;
    Ok((vertex_bytes, index_bytes))
}

/// Unpacked vertex buffer reinterpreted under its declared layout.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedVertices {
    PncvF32(Vec<VertexPncvF32>),
    P32N8C8V16(Vec<VertexP32N8C8V16>),
}

impl DecodedVertices {
    pub fn len(&self) -> usize {
        match self {
            DecodedVertices::PncvF32(v) => v.len(),
            DecodedVertices::P32N8C8V16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widens every vertex to the all-`f32` layout.
    pub fn into_pncv_f32(self) -> Vec<VertexPncvF32> {
        match self {
            DecodedVertices::PncvF32(v) => v,
            DecodedVertices::P32N8C8V16(v) => v.into_iter().map(VertexPncvF32::from).collect(),
        }
    }
}

/// Reinterprets unpacked vertex bytes according to `info.vertex_format`.
/// Refuses [`VertexFormat::Unknown`] and any size that breaks the layout contract.
pub fn decode_vertices(info: &MeshInfo, vertex_bytes: &[u8]) -> AssetResult<DecodedVertices> {
    info.check_layout()?;
    expect_len("vertex buffer", info.vertex_buffer_size, vertex_bytes.len())?;

    match info.vertex_format {
        VertexFormat::PncvF32 => Ok(DecodedVertices::PncvF32(read_vertices(vertex_bytes)?)),
        VertexFormat::P32N8C8V16 => Ok(DecodedVertices::P32N8C8V16(read_vertices(vertex_bytes)?)),
        VertexFormat::Unknown => Err(AssetError::UnknownVertexFormat),
    }
}

/// Reads `V`s out of a byte buffer of any alignment.
pub fn read_vertices<V: PackedVertex>(bytes: &[u8]) -> AssetResult<Vec<V>> {
    read_pod(bytes, "vertex buffer")
}

pub fn read_indices(bytes: &[u8]) -> AssetResult<Vec<u32>> {
    read_pod(bytes, "index buffer")
}

fn read_pod<T: Pod>(bytes: &[u8], what: &str) -> AssetResult<Vec<T>> {
    let size = size_of::<T>();
    if bytes.len() % size != 0 {
        return Err(AssetError::InvalidBufferSize(format!(
            "{what} of {} bytes is not a multiple of {size}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned::<T>)
        .collect())
}

fn expect_len(what: &'static str, expected: u64, actual: usize) -> AssetResult<()> {
    if expected != actual as u64 {
        return Err(AssetError::SizeMismatch {
            what,
            expected,
            actual: actual as u64,
        });
    }
    Ok(())
}

fn buffer_len(size: u64) -> AssetResult<usize> {
    usize::try_from(size)
        .map_err(|_| AssetError::InvalidBufferSize(format!("{size} bytes does not fit in memory")))
}
