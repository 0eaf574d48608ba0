use std::borrow::Cow;

use glam::Vec3;

use super::{AssetError, AssetLoader, BasicVertex, MeshData, ShaderSource, TextureData};

pub const CUBE_MESH: &str = "cube";
pub const CUBE_SHADER: &str = "cube";
pub const CUBE_TEXTURE: &str = "checker";

const CHECKER_SIZE: u32 = 256;
const CHECKER_CELLS: u32 = 8;
const CHECKER_LIGHT: [u8; 4] = [232, 232, 226, 255];
const CHECKER_DARK: [u8; 4] = [38, 104, 196, 255];

/// Assets compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedAssets;

impl AssetLoader for EmbeddedAssets {
    fn load_shader(&self, name: &str) -> Result<ShaderSource, AssetError> {
        match name {
            CUBE_SHADER => Ok(ShaderSource {
                name: name.to_owned(),
                wgsl: Cow::Borrowed(include_str!("cube.wgsl")),
            }),
            _ => Err(AssetError::NotFound(name.to_owned())),
        }
    }

    fn load_texture(&self, name: &str) -> Result<TextureData, AssetError> {
        match name {
            CUBE_TEXTURE => TextureData::new(name, CHECKER_SIZE, CHECKER_SIZE, checker_pixels()),
            _ => Err(AssetError::NotFound(name.to_owned())),
        }
    }

    fn load_mesh(&self, name: &str) -> Result<MeshData, AssetError> {
        match name {
            CUBE_MESH => Ok(cube_mesh()),
            _ => Err(AssetError::NotFound(name.to_owned())),
        }
    }
}

/// Unit cube centered on the origin: 4 vertices per face so each face gets its
/// own normal and full 0..1 texture coordinates. Front faces wind counter-clockwise.
fn cube_mesh() -> MeshData {
    // (outward normal, u axis, v axis) with u x v == normal.
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let corners = [(-0.5, -0.5, [0.0, 1.0]), (0.5, -0.5, [1.0, 1.0]), (0.5, 0.5, [1.0, 0.0]), (-0.5, 0.5, [0.0, 0.0])];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in faces {
        let base = vertices.len() as u16;
        let center = normal * 0.5;
        for (su, sv, uv) in corners {
            vertices.push(BasicVertex {
                position: (center + u * su + v * sv).to_array(),
                normal: normal.to_array(),
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

fn checker_pixels() -> Vec<u8> {
    let cell = CHECKER_SIZE / CHECKER_CELLS;
    let mut rgba = Vec::with_capacity((CHECKER_SIZE * CHECKER_SIZE * 4) as usize);
    for y in 0..CHECKER_SIZE {
        for x in 0..CHECKER_SIZE {
            let dark = ((x / cell) + (y / cell)) % 2 == 1;
            rgba.extend_from_slice(if dark { &CHECKER_DARK } else { &CHECKER_LIGHT });
        }
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_vertices_and_12_triangles() {
        let mesh = EmbeddedAssets.load_mesh(CUBE_MESH).unwrap();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);
        mesh.validate(CUBE_MESH).unwrap();
    }

    #[test]
    fn cube_triangles_face_outward() {
        let mesh = EmbeddedAssets.load_mesh(CUBE_MESH).unwrap();
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let n = Vec3::from(mesh.vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn checker_is_full_rgba() {
        let tex = EmbeddedAssets.load_texture(CUBE_TEXTURE).unwrap();
        assert_eq!((tex.width, tex.height), (CHECKER_SIZE, CHECKER_SIZE));
        assert_eq!(&tex.rgba[..4], &CHECKER_LIGHT);
        let second_cell = (CHECKER_SIZE / CHECKER_CELLS) as usize * 4;
        assert_eq!(&tex.rgba[second_cell..second_cell + 4], &CHECKER_DARK);
    }

    #[test]
    fn unknown_names_are_not_found() {
        assert!(matches!(EmbeddedAssets.load_mesh("teapot"), Err(AssetError::NotFound(_))));
        assert!(matches!(EmbeddedAssets.load_shader("sky"), Err(AssetError::NotFound(_))));
        assert!(matches!(EmbeddedAssets.load_texture("brick"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn embedded_shader_has_entry_points() {
        let src = EmbeddedAssets.load_shader(CUBE_SHADER).unwrap();
        assert!(src.wgsl.contains("fn vs_main"));
        assert!(src.wgsl.contains("fn fs_main"));
    }
}
