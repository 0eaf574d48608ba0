use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Per-eye transforms as the frame loop computes them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConstantBufferData {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for ConstantBufferData {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

/// GPU layout of `ConstantBufferData` (192 bytes).
///
/// Each matrix is stored as four columns, which is what WGSL `mat4x4<f32>`
/// expects for `m * v`. No transpose is needed.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuConstants {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl From<&ConstantBufferData> for GpuConstants {
    fn from(data: &ConstantBufferData) -> Self {
        Self {
            model: data.model.to_cols_array_2d(),
            view: data.view.to_cols_array_2d(),
            projection: data.projection.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::*;

    #[test]
    fn layout_is_three_mat4() {
        assert_eq!(std::mem::size_of::<GpuConstants>(), 192);
    }

    #[test]
    fn translation_lands_in_fourth_column() {
        let data = ConstantBufferData {
            model: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            ..Default::default()
        };
        let gpu = GpuConstants::from(&data);
        assert_eq!(gpu.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(gpu.view, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn column_layout_reproduces_matrix_vector_product() {
        let m = Mat4::from_rotation_y(0.7) * Mat4::from_translation(Vec3::new(0.5, -1.0, 2.0));
        let v = Vec4::new(0.3, 0.2, -0.1, 1.0);
        let cols = GpuConstants::from(&ConstantBufferData { model: m, ..Default::default() }).model;

        // Shader-side: result = sum over columns of col[i] * v[i].
        let mut out = [0.0f32; 4];
        for (i, col) in cols.iter().enumerate() {
            for r in 0..4 {
                out[r] += col[r] * v[i];
            }
        }
        let expected = m * v;
        for r in 0..4 {
            assert!((out[r] - expected[r]).abs() < 1.0e-5);
        }
    }
}
