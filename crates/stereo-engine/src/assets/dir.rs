use std::borrow::Cow;
use std::path::{Path, PathBuf};

use super::{AssetError, AssetLoader, EmbeddedAssets, MeshData, ShaderSource, TextureData};

const TEXTURE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tga"];

/// Loads assets from a directory, falling back to the embedded set.
///
/// Shaders are `<root>/<name>.wgsl`; textures are `<root>/<name>.<ext>` for any
/// image format in `TEXTURE_EXTENSIONS`. Meshes are always embedded.
#[derive(Debug, Clone)]
pub struct DirAssetLoader {
    root: PathBuf,
    fallback: EmbeddedAssets,
}

impl DirAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fallback: EmbeddedAssets,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find_texture(&self, name: &str) -> Option<PathBuf> {
        TEXTURE_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl AssetLoader for DirAssetLoader {
    fn load_shader(&self, name: &str) -> Result<ShaderSource, AssetError> {
        let path = self.root.join(format!("{name}.wgsl"));
        if !path.is_file() {
            return self.fallback.load_shader(name);
        }

        let wgsl = std::fs::read_to_string(&path).map_err(|source| AssetError::Io {
            name: name.to_owned(),
            source,
        })?;
        log::debug!("loaded shader {name} from {}", path.display());

        Ok(ShaderSource {
            name: name.to_owned(),
            wgsl: Cow::Owned(wgsl),
        })
    }

    fn load_texture(&self, name: &str) -> Result<TextureData, AssetError> {
        let Some(path) = self.find_texture(name) else {
            return self.fallback.load_texture(name);
        };

        let img = image::open(&path).map_err(|e| AssetError::Decode {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("loaded texture {name} ({width}x{height}) from {}", path.display());

        TextureData::new(name, width, height, rgba.into_raw())
    }

    fn load_mesh(&self, name: &str) -> Result<MeshData, AssetError> {
        self.fallback.load_mesh(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{CUBE_SHADER, CUBE_TEXTURE};

    #[test]
    fn missing_files_fall_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DirAssetLoader::new(dir.path());
        assert!(loader.load_shader(CUBE_SHADER).is_ok());
        assert!(loader.load_texture(CUBE_TEXTURE).is_ok());
        assert!(matches!(loader.load_texture("nope"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn shader_file_overrides_embedded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cube.wgsl"), "// custom").unwrap();
        let loader = DirAssetLoader::new(dir.path());
        assert_eq!(loader.load_shader("cube").unwrap().wgsl, "// custom");
    }

    #[test]
    fn png_texture_is_decoded_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        img.save(dir.path().join("tile.png")).unwrap();

        let tex = DirAssetLoader::new(dir.path()).load_texture("tile").unwrap();
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(&tex.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn corrupt_image_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not a png").unwrap();
        let err = DirAssetLoader::new(dir.path()).load_texture("bad").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
        assert_eq!(err.name(), "bad");
    }
}
