use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};

use super::AssetError;

/// WGSL source with the name it was loaded under (used as a debug label).
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub name: String,
    pub wgsl: Cow<'static, str>,
}

/// Tightly packed RGBA8 pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    pub fn new(name: &str, width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::invalid(name, format!("empty texture {width}x{height}")));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(AssetError::invalid(
                name,
                format!("expected {expected} bytes for {width}x{height}, got {}", rgba.len()),
            ));
        }
        Ok(Self { width, height, rgba })
    }
}

/// Vertex layout shared by the mesh data and the scene pipeline (32 bytes):
///
///  offset  0  position  [f32; 3]   loc 0
///  offset 12  normal    [f32; 3]   loc 1
///  offset 24  uv        [f32; 2]   loc 2
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BasicVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl BasicVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BasicVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Indexed triangle list with 16-bit indices.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<BasicVertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    /// Checks that the mesh is a non-empty triangle list with in-range indices.
    pub fn validate(&self, name: &str) -> Result<(), AssetError> {
        if self.indices.is_empty() || self.indices.len() % 3 != 0 {
            return Err(AssetError::invalid(
                name,
                format!("{} indices is not a triangle list", self.indices.len()),
            ));
        }
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= self.vertices.len()) {
            return Err(AssetError::invalid(
                name,
                format!("index {bad} out of range for {} vertices", self.vertices.len()),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_32_bytes() {
        assert_eq!(std::mem::size_of::<BasicVertex>(), 32);
        assert_eq!(BasicVertex::layout().array_stride, 32);
    }

    #[test]
    fn texture_size_mismatch_is_invalid() {
        let err = TextureData::new("t", 2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, AssetError::Invalid { .. }));
        assert!(TextureData::new("t", 0, 2, Vec::new()).is_err());
        assert!(TextureData::new("t", 2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn out_of_range_index_is_invalid() {
        let v = BasicVertex { position: [0.0; 3], normal: [0.0; 3], uv: [0.0; 2] };
        let mesh = MeshData { vertices: vec![v; 3], indices: vec![0, 1, 3] };
        assert!(mesh.validate("m").is_err());

        let mesh = MeshData { vertices: vec![v; 3], indices: vec![0, 1] };
        assert!(mesh.validate("m").is_err());

        let mesh = MeshData { vertices: vec![v; 3], indices: vec![0, 1, 2] };
        assert!(mesh.validate("m").is_ok());
    }
}
