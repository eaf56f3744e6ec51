//! Integer linear transforms of lattice coordinates.

use crate::error::TransformError;
use crate::Coord;

/// 3×3 integer matrix, row-major. Vectors are rows: `v' = v · M`.
pub type Matrix = [[i32; 3]; 3];

const IDENTITY: Matrix = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];

/// Applies a fixed matrix, and any integer power of it, to coordinates.
///
/// Negative powers use the inverse matrix, so only unimodular matrices
/// (determinant ±1, hence an integral inverse) are accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinateTransformer {
    matrix: Matrix,
    inverse: Matrix,
}

impl CoordinateTransformer {
    /// A 60 degree rotation of the lattice: `(x, y, z) · M = (z, -x, y)`.
    pub const ROTATE_60: Matrix = [[0, -1, 0], [0, 0, 1], [1, 0, 0]];

    pub fn new(matrix: Matrix) -> Result<CoordinateTransformer, TransformError> {
        let det = determinant(&matrix);
        if det != 1 && det != -1 {
            return Err(TransformError::NotInvertible { matrix, det });
        }
        // inverse = adj(M) / det, and dividing by ±1 is multiplying by it
        let mut inverse = [[0; 3]; 3];
        for (i, row) in inverse.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = cofactor(&matrix, j, i) * det;
            }
        }
        Ok(CoordinateTransformer { matrix, inverse })
    }

    /// The rotation used to derive the six homes from the first one.
    pub fn rotation() -> CoordinateTransformer {
        let matrix = Self::ROTATE_60;
        // A signed permutation matrix is orthogonal: its inverse is its transpose.
        CoordinateTransformer {
            matrix,
            inverse: transpose(&matrix),
        }
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// `M^exp`. Exponent 0 is the identity, negative exponents invert.
    pub fn power(&self, exp: i32) -> Matrix {
        let base = if exp < 0 { self.inverse } else { self.matrix };
        let mut remaining = exp.unsigned_abs();
        let mut square = base;
        let mut result = IDENTITY;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = multiply(&result, &square);
            }
            square = multiply(&square, &square);
            remaining >>= 1;
        }
        result
    }

    /// Transform a single coordinate by `M^exp`.
    pub fn transform_one(&self, vec: Coord, exp: i32) -> Coord {
        match exp {
            0 => vec,
            1 => apply(&self.matrix, vec),
            -1 => apply(&self.inverse, vec),
            _ => apply(&self.power(exp), vec),
        }
    }

    /// Transform every coordinate by `M^exp`. Empty input gives empty output.
    pub fn transform(&self, vectors: &[Coord], exp: i32) -> Vec<Coord> {
        if vectors.is_empty() {
            return Vec::new();
        }
        let m = self.power(exp);
        vectors.iter().map(|&v| apply(&m, v)).collect()
    }
}

#[inline]
fn apply(m: &Matrix, vec: Coord) -> Coord {
    let v = vec.to_array();
    let mut out = [0; 3];
    for (j, cell) in out.iter_mut().enumerate() {
        *cell = v[0] * m[0][j] + v[1] * m[1][j] + v[2] * m[2][j];
    }
    Coord::from_array(out)
}

fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    let mut out = [[0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn transpose(m: &Matrix) -> Matrix {
    let mut out = [[0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[j][i] = m[i][j];
        }
    }
    out
}

/// Signed minor of `m` with row `r` and column `c` removed.
fn cofactor(m: &Matrix, r: usize, c: usize) -> i32 {
    let rows: Vec<usize> = (0..3).filter(|&i| i != r).collect();
    let cols: Vec<usize> = (0..3).filter(|&j| j != c).collect();
    let minor = m[rows[0]][cols[0]] * m[rows[1]][cols[1]] - m[rows[0]][cols[1]] * m[rows[1]][cols[0]];
    if (r + c) % 2 == 0 {
        minor
    } else {
        -minor
    }
}

fn determinant(m: &Matrix) -> i32 {
    (0..3).map(|c| m[0][c] * cofactor(m, 0, c)).sum()
}
