//! Node transform composition for visual scene nodes.
use nalgebra::{Matrix4, Unit, Vector3};

/// One `<rotate>` element: axis plus angle in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    pub sid: Option<String>,
    pub axis: Vector3<f32>,
    pub angle_degrees: f32,
}

impl Rotation {
    /// Build from the four values of a `<rotate>` element
    pub fn from_values(sid: Option<String>, values: &[f32]) -> Option<Self> {
        match values {
            &[x, y, z, angle_degrees] => Some(Self {
                sid,
                axis: Vector3::new(x, y, z),
                angle_degrees,
            }),
            _ => None,
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Transform::rotation_matrix(&self.axis, self.angle_degrees)
    }
}

/// Transform builder for node placement
pub struct Transform;

impl Transform {
    /// Rotation about an arbitrary axis; a zero axis yields identity
    pub fn rotation_matrix(axis: &Vector3<f32>, angle_degrees: f32) -> Matrix4<f32> {
        match Unit::try_new(*axis, f32::EPSILON) {
            Some(axis) => Matrix4::from_axis_angle(&axis, angle_degrees.to_radians()),
            None => Matrix4::identity(),
        }
    }

    /// Create a translation matrix
    pub fn translation_matrix(translate: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(translate)
    }

    /// Create a scale matrix
    pub fn scale_matrix(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(scale)
    }

    /// COLLADA stores `<matrix>` in row-major order
    pub fn from_row_major(values: &[f32]) -> Option<Matrix4<f32>> {
        (values.len() == 16).then(|| Matrix4::from_row_slice(values))
    }

    /// Compose translate * rotations (in document order) * scale
    pub fn compose(
        translate: Option<&Vector3<f32>>,
        rotations: &[Rotation],
        scale: Option<&Vector3<f32>>,
    ) -> Matrix4<f32> {
        let mut matrix = translate.map_or_else(Matrix4::identity, Self::translation_matrix);
        for rotation in rotations {
            matrix *= rotation.matrix();
        }
        if let Some(scale) = scale {
            matrix *= Self::scale_matrix(scale);
        }
        matrix
    }
}
