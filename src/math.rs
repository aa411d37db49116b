// SPDX-License-Identifier: GPL-3.0-only

//! Matrix helpers on top of glam
//!
//! The camera math was tuned against a row-vector matrix library, where a
//! matrix is stored row by row and `multiply(a, b)` applies `a` first.
//! glam stores column by column with column vectors, so a row-vector
//! matrix `M` is the glam matrix `Mᵀ`. Both layouts produce the same 16
//! floats, which is what the shaders receive as `mvp`.
//!
//! The helpers below keep the row-vector vocabulary (row/column indices,
//! multiplication order) so the view derivation reads like the row-vector
//! math, while the values live in plain [`glam::Mat4`].

use glam::{Mat4, Vec3};

/// Perspective projection, `fov` in degrees
pub fn perspective(fov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fov.to_radians(), aspect, znear, zfar)
}

/// Orthographic projection
///
/// Argument order is `left, right, top, bottom`. Passing `top < bottom`
/// flips the vertical axis.
pub fn ortho(left: f32, right: f32, top: f32, bottom: f32, znear: f32, zfar: f32) -> Mat4 {
    Mat4::orthographic_rh_gl(left, right, bottom, top, znear, zfar)
}

/// Look-at matrix as built by the row-vector library
///
/// The rows are the camera basis followed by the negated eye. This is not
/// a world-to-camera transform on its own; callers invert it and patch one
/// component, see [`negate_component`].
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
    let direction = center - eye;

    let mut z_axis = if direction.dot(direction) < f32::EPSILON {
        // eye and center are in the same position
        Vec3::Z
    } else {
        direction.normalize()
    };

    let mut cross = z_axis.cross(up);
    if cross.dot(cross) < f32::EPSILON {
        // up and z_axis are parallel
        let tweak = if (up.y - 1.0).abs() < f32::EPSILON {
            Vec3::new(0.0001, 0.0, 0.0)
        } else {
            Vec3::new(0.0, 0.0, 0.0001)
        };
        z_axis = (z_axis + tweak).normalize();
        cross = z_axis.cross(up);
    }

    let x_axis = cross.normalize();
    let y_axis = x_axis.cross(z_axis);

    Mat4::from_cols(
        x_axis.extend(0.0),
        y_axis.extend(0.0),
        (-z_axis).extend(0.0),
        (-eye).extend(1.0),
    )
}

/// Inverse matrix. A singular input yields non-finite values.
pub fn inverse(m: &Mat4) -> Mat4 {
    m.inverse()
}

/// Product that applies `a` first, then `b`
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    *b * *a
}

/// Copy of `m` with the value at (`row`, `col`) negated
///
/// Indices are row-vector indices: `row` selects the glam column and `col`
/// the component inside it.
pub fn negate_component(m: &Mat4, row: usize, col: usize) -> Mat4 {
    let mut values = m.to_cols_array_2d();
    values[row][col] = -values[row][col];
    Mat4::from_cols_array_2d(&values)
}

/// Value at (`row`, `col`) in row-vector indexing
pub fn component(m: &Mat4, row: usize, col: usize) -> f32 {
    m.to_cols_array_2d()[row][col]
}

/// The 16 floats uploaded to a `mat4` uniform
pub fn to_float_array(m: &Mat4) -> [f32; 16] {
    m.to_cols_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_multiply_applies_left_operand_first() {
        let translate = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let scale = Mat4::from_scale(Vec3::splat(2.0));

        // translate then scale: (0,0,0) -> (1,0,0) -> (2,0,0)
        let m = multiply(&translate, &scale);
        let p = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((p.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_negate_component_touches_one_value() {
        let m = Mat4::from_cols_array(&[
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0, //
            13.0, 14.0, 15.0, 16.0,
        ]);
        let fixed = negate_component(&m, 3, 2);
        assert_eq!(component(&fixed, 3, 2), -15.0);
        assert_eq!(fixed.w_axis.z, -15.0);

        let before = to_float_array(&m);
        let after = to_float_array(&fixed);
        let changed = before.iter().zip(after.iter()).filter(|(a, b)| a != b).count();
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_ortho_with_swapped_top_bottom_flips_y() {
        let m = ortho(-2.0, 2.0, -1.0, 1.0, -1.0, 1.0);
        let top = m * Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert!((top.y + 1.0).abs() < 1e-6);
        let right = m * Vec4::new(2.0, 0.0, 0.0, 1.0);
        assert!((right.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_look_at_rows_hold_basis_and_negated_eye() {
        let eye = Vec3::new(0.0, 0.0, 3.0);
        let m = look_at(eye, Vec3::ZERO, Vec3::Y);
        // forward is -Z, so right is +X and the third row is +Z
        assert!(m.x_axis.truncate().abs_diff_eq(Vec3::X, 1e-6));
        assert!(m.y_axis.truncate().abs_diff_eq(Vec3::Y, 1e-6));
        assert!(m.z_axis.truncate().abs_diff_eq(Vec3::Z, 1e-6));
        assert!(m.w_axis.abs_diff_eq(Vec4::new(0.0, 0.0, -3.0, 1.0), 1e-6));
    }

    #[test]
    fn test_look_at_handles_coincident_eye_and_center() {
        let m = look_at(Vec3::ONE, Vec3::ONE, Vec3::Y);
        assert!(m.is_finite());
    }

    #[test]
    fn test_perspective_uses_degrees() {
        let m = perspective(90.0, 1.0, 0.1, 100.0);
        // f = 1 / tan(45°) = 1
        assert!((m.x_axis.x - 1.0).abs() < 1e-6);
        assert!((m.y_axis.y - 1.0).abs() < 1e-6);
        assert_eq!(m.z_axis.w, -1.0);
    }
}
