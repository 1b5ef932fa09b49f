//! Fixed projection / model-view transform state.
//!
//! The scene uses a single perspective projection built from fixed constants
//! and a model-view that is the identity translated by a fixed offset. Both
//! are recomputed fresh for every draw; the results are deterministic.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Vertical field of view, degrees.
pub const FIELD_OF_VIEW_DEG: f32 = 45.0;

/// Near clip plane distance.
pub const NEAR_PLANE: f32 = 0.1;

/// Far clip plane distance.
pub const FAR_PLANE: f32 = 100.0;

/// Fixed model-view translation: the quad sits six units into the scene.
pub const MODEL_OFFSET: [f32; 3] = [0.0, 0.0, -6.0];

/// Perspective projection from the fixed constants and the drawable size.
///
/// Aspect ratio is width over height; a degenerate height is clamped so the
/// matrix stays finite.
pub fn projection(width: f32, height: f32) -> Mat4 {
    let aspect = width / height.max(1.0);
    Mat4::perspective_rh(FIELD_OF_VIEW_DEG.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
}

/// Model-view matrix: identity, then translated by [`MODEL_OFFSET`].
pub fn model_view() -> Mat4 {
    Mat4::IDENTITY * Mat4::from_translation(Vec3::from(MODEL_OFFSET))
}

/// GPU-side layout of the transform uniform block: projection first, then
/// model-view, both column-major.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct TransformsUniform {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
}

impl TransformsUniform {
    /// Packs both matrices for the current drawable size.
    pub fn for_size(width: f32, height: f32) -> Self {
        Self {
            projection: projection(width, height).to_cols_array_2d(),
            model_view: model_view().to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn projection_is_deterministic_across_calls() {
        let a = projection(640.0, 480.0);
        let b = projection(640.0, 480.0);
        assert_eq!(a.to_cols_array(), b.to_cols_array());
    }

    #[test]
    fn projection_matches_fixed_constants() {
        // f = 1 / tan(45° / 2), aspect = 640/480.
        let m = projection(640.0, 480.0).to_cols_array_2d();
        let f = 1.0 / (FIELD_OF_VIEW_DEG.to_radians() / 2.0).tan();

        assert!(close(m[0][0], f / (640.0 / 480.0)));
        assert!(close(m[1][1], f));
        // Perspective divide lives in the w column.
        assert!(close(m[2][3], -1.0));
        assert!(close(m[3][3], 0.0));
    }

    #[test]
    fn projection_clamps_degenerate_height() {
        let m = projection(640.0, 0.0);
        assert!(m.is_finite());
    }

    // ── model-view ────────────────────────────────────────────────────────

    #[test]
    fn model_view_is_identity_except_translation_column() {
        let m = model_view().to_cols_array_2d();

        // Basis columns untouched.
        assert_eq!(m[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(m[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(m[2], [0.0, 0.0, 1.0, 0.0]);
        // Translation column carries the fixed offset.
        assert_eq!(m[3], [0.0, 0.0, -6.0, 1.0]);
    }

    // ── uniform packing ───────────────────────────────────────────────────

    #[test]
    fn uniform_packs_projection_then_model_view() {
        let u = TransformsUniform::for_size(640.0, 480.0);
        assert_eq!(u.projection, projection(640.0, 480.0).to_cols_array_2d());
        assert_eq!(u.model_view, model_view().to_cols_array_2d());
    }

    #[test]
    fn uniform_block_is_two_matrices_wide() {
        assert_eq!(std::mem::size_of::<TransformsUniform>(), 128);
    }
}
