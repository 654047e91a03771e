/// A planar homogeneous transform applied to node positions.
///
/// Positions are cosmetic, so only x and y are transformed and z passes through.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    /// Row major; the last row is the projection row.
    pub matrix: [[f64; 3]; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub fn translate(dx: f64, dy: f64) -> Self {
        Transform {
            matrix: [[1.0, 0.0, dx], [0.0, 1.0, dy], [0.0, 0.0, 1.0]],
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Transform {
            matrix: [[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Counter-clockwise, in radians.
    pub fn rotate(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Transform {
            matrix: [[cos, -sin, 0.0], [sin, cos, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn skew(kx: f64, ky: f64) -> Self {
        Transform {
            matrix: [[1.0, kx, 0.0], [ky, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Mirrors across the y axis.
    pub fn flip_x() -> Self {
        Transform::scale(-1.0, 1.0)
    }

    /// Mirrors across the x axis.
    pub fn flip_y() -> Self {
        Transform::scale(1.0, -1.0)
    }

    pub fn projection(px: f64, py: f64) -> Self {
        Transform {
            matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [px, py, 1.0]],
        }
    }

    /// `self` followed by `next`.
    pub fn then(self, next: Transform) -> Transform {
        let (a, b) = (next.matrix, self.matrix);
        let mut matrix = [[0.0; 3]; 3];
        for (i, row) in matrix.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
            }
        }
        Transform { matrix }
    }

    pub fn apply(&self, position: [f64; 3]) -> [f64; 3] {
        let [x, y, z] = position;
        let m = &self.matrix;
        let tx = m[0][0] * x + m[0][1] * y + m[0][2];
        let ty = m[1][0] * x + m[1][1] * y + m[1][2];
        let w = m[2][0] * x + m[2][1] * y + m[2][2];
        if w == 0.0 || w == 1.0 {
            [tx, ty, z]
        } else {
            [tx / w, ty / w, z]
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Transform::IDENTITY
    }
}
