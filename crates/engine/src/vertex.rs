use assetlib::{DecodedVertices, PackedVertex, VertexFormat, VertexP32N8C8V16, VertexPncvF32};
use bytemuck::{Pod, Zeroable};

/// Vertex as the renderer consumes it, whatever layout the asset was stored in.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Converts a decoded asset vertex buffer, promoting 8-bit channels to float.
    pub fn from_decoded(decoded: DecodedVertices) -> Vec<Vertex> {
        match decoded {
            DecodedVertices::PncvF32(v) => v.into_iter().map(Vertex::from).collect(),
            DecodedVertices::P32N8C8V16(v) => v.into_iter().map(Vertex::from).collect(),
        }
    }
}

// Same field order and widths as the all-float asset layout.
impl PackedVertex for Vertex {
    const FORMAT: VertexFormat = VertexFormat::PncvF32;

    fn position(&self) -> [f32; 3] {
        self.position
    }
}

impl From<VertexPncvF32> for Vertex {
    fn from(v: VertexPncvF32) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
            color: v.color,
            uv: v.uv,
        }
    }
}

impl From<VertexP32N8C8V16> for Vertex {
    fn from(v: VertexP32N8C8V16) -> Self {
        VertexPncvF32::from(v).into()
    }
}

impl From<Vertex> for VertexPncvF32 {
    fn from(v: Vertex) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
            color: v.color,
            uv: v.uv,
        }
    }
}

impl From<Vertex> for VertexP32N8C8V16 {
    fn from(v: Vertex) -> Self {
        VertexPncvF32::from(v).into()
    }
}
