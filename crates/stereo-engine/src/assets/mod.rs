//! Asset loading.
//!
//! The renderer asks for shaders, textures and meshes by name through
//! `AssetLoader`. `EmbeddedAssets` serves the built-in cube; `DirAssetLoader`
//! serves files from a directory and falls back to the embedded set.

mod dir;
mod embedded;
mod error;
mod types;

pub use dir::DirAssetLoader;
pub use embedded::{EmbeddedAssets, CUBE_MESH, CUBE_SHADER, CUBE_TEXTURE};
pub use error::AssetError;
pub use types::{BasicVertex, MeshData, ShaderSource, TextureData};

/// Source of named assets. Each call either fully succeeds or returns `AssetError`.
pub trait AssetLoader {
    fn load_shader(&self, name: &str) -> Result<ShaderSource, AssetError>;
    fn load_texture(&self, name: &str) -> Result<TextureData, AssetError>;
    fn load_mesh(&self, name: &str) -> Result<MeshData, AssetError>;
}
