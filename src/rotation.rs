//! Exact axis-aligned rotations.
//!
//! A resting piece is only ever in one of the 24 rotations that map the cube
//! onto itself, so orientations are kept as signed permutations of the basis
//! vectors rather than as accumulated floating-point rotations. Continuous
//! math happens per frame, but whatever lands in a piece is snapped back into
//! this representation.

use std::ops::{Mul, Neg};

use nalgebra::{Rotation3, Unit, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn to_unit(self) -> Unit<Vector3<f32>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Self {
        match i {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            _ => panic!("axis index {} is out of bounds", i),
        }
    }
}

/// Turn direction around an axis: `Positive` is a quarter turn in the
/// right-handed sense, `Negative` its inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub fn to_f32(self) -> f32 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }

    pub fn of(v: f32) -> Self {
        // ties resolve positive
        if v >= 0.0 {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }
}

impl Mul for Sign {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        if self == rhs {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }
}

impl Neg for Sign {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }
}

// these fields can be public since they have no invariants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasisVector {
    pub axis: Axis,
    pub sign: Sign,
}

impl BasisVector {
    pub fn to_vector3(self) -> Vector3<f32> {
        let v = self.axis.to_unit().into_inner();

        match self.sign {
            Sign::Positive => v,
            Sign::Negative => -v,
        }
    }
}

const PX: BasisVector = BasisVector {
    axis: Axis::X,
    sign: Sign::Positive,
};
const PY: BasisVector = BasisVector {
    axis: Axis::Y,
    sign: Sign::Positive,
};
const PZ: BasisVector = BasisVector {
    axis: Axis::Z,
    sign: Sign::Positive,
};
const MX: BasisVector = BasisVector {
    axis: Axis::X,
    sign: Sign::Negative,
};
const MY: BasisVector = BasisVector {
    axis: Axis::Y,
    sign: Sign::Negative,
};
const MZ: BasisVector = BasisVector {
    axis: Axis::Z,
    sign: Sign::Negative,
};

/// One of the 24 rotations mapping the cube onto itself, stored as the images
/// of the three basis vectors (the columns of the rotation matrix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeRotation {
    basis: [BasisVector; 3],
}

impl Default for CubeRotation {
    fn default() -> Self {
        Self {
            basis: [PX, PY, PZ],
        }
    }
}

impl CubeRotation {
    /// The quarter turn around `axis`, signed like
    /// `Rotation3::from_axis_angle(axis, sign * FRAC_PI_2)`.
    pub fn quarter_turn(axis: Axis, sign: Sign) -> Self {
        let basis = match (axis, sign) {
            (Axis::X, Sign::Positive) => [PX, PZ, MY],
            (Axis::X, Sign::Negative) => [PX, MZ, PY],
            (Axis::Y, Sign::Positive) => [MZ, PY, PX],
            (Axis::Y, Sign::Negative) => [PZ, PY, MX],
            (Axis::Z, Sign::Positive) => [PY, MX, PZ],
            (Axis::Z, Sign::Negative) => [MY, PX, PZ],
        };
        Self { basis }
    }

    /// Snaps a drifted rotation onto the nearest cube rotation by forcing
    /// each basis column to the closest signed unit axis. The input must be
    /// close to orthonormal; re-snapping an already-snapped rotation is a
    /// no-op.
    pub fn snap(rotation: &Rotation3<f32>) -> Self {
        let m = rotation.matrix();
        let basis = [0, 1, 2].map(|j| {
            let col = m.column(j);
            let mut axis = 0;
            for i in 1..3 {
                if col[i].abs() > col[axis].abs() {
                    axis = i;
                }
            }
            BasisVector {
                axis: Axis::from_index(axis),
                sign: Sign::of(col[axis]),
            }
        });
        Self { basis }
    }

    pub fn as_basis(&self) -> &[BasisVector; 3] {
        &self.basis
    }

    pub fn to_rotation3(self) -> Rotation3<f32> {
        Rotation3::from_basis_unchecked(&self.basis.map(|b| b.to_vector3()))
    }

    /// Applies the rotation to a vector without going through floats that
    /// could drift: components are only permuted and negated.
    pub fn apply(&self, v: Vector3<f32>) -> Vector3<f32> {
        let mut out = Vector3::zeros();
        for (i, b) in self.basis.iter().enumerate() {
            out[b.axis.index()] += b.sign.to_f32() * v[i];
        }
        out
    }

    pub fn inverse(&self) -> Self {
        let mut basis = [PX; 3];
        for (i, b) in self.basis.iter().enumerate() {
            basis[b.axis.index()] = BasisVector {
                axis: Axis::from_index(i),
                sign: b.sign,
            };
        }
        Self { basis }
    }
}

impl Mul for CubeRotation {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let basis = rhs.basis.map(|right| {
            let left = self.basis[right.axis.index()];

            BasisVector {
                axis: left.axis,
                sign: left.sign * right.sign,
            }
        });

        Self { basis }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn generators() -> Vec<(Axis, Sign)> {
        let mut out = Vec::new();
        for axis in Axis::ALL {
            for sign in [Sign::Positive, Sign::Negative] {
                out.push((axis, sign));
            }
        }
        out
    }

    fn assert_rotations_close(a: &Rotation3<f32>, b: &Rotation3<f32>) {
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (a.matrix()[(i, j)] - b.matrix()[(i, j)]).abs() < 1e-6,
                    "matrices differ at ({i}, {j}): {a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn test_default_is_identity() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(CubeRotation::default().apply(v), v);
    }

    #[test]
    fn test_quarter_turns_match_axis_angle() {
        for (axis, sign) in generators() {
            let exact = CubeRotation::quarter_turn(axis, sign).to_rotation3();
            let continuous =
                Rotation3::from_axis_angle(&axis.to_unit(), sign.to_f32() * FRAC_PI_2);
            assert_rotations_close(&exact, &continuous);
        }
    }

    #[test]
    fn test_composition_matches_matrix_product() {
        for (a_axis, a_sign) in generators() {
            for (b_axis, b_sign) in generators() {
                let a = CubeRotation::quarter_turn(a_axis, a_sign);
                let b = CubeRotation::quarter_turn(b_axis, b_sign);
                assert_rotations_close(
                    &(a * b).to_rotation3(),
                    &(a.to_rotation3() * b.to_rotation3()),
                );
            }
        }
    }

    #[test]
    fn test_inverse_undoes_rotation() {
        let mut composite = CubeRotation::default();
        for (axis, sign) in generators() {
            let r = CubeRotation::quarter_turn(axis, sign);
            assert_eq!(r.inverse() * r, CubeRotation::default());
            composite = r * composite;
        }
        assert_eq!(composite.inverse() * composite, CubeRotation::default());
    }

    #[test]
    fn test_apply_matches_rotation3() {
        let v = Vector3::new(1.0, -2.0, 0.5);
        for (axis, sign) in generators() {
            let r = CubeRotation::quarter_turn(axis, sign);
            let expected = r.to_rotation3() * v;
            let got = r.apply(v);
            assert!((got - expected).norm() < 1e-6, "{got} vs {expected}");
        }
    }

    #[test]
    fn test_snap_recovers_exact_composition() {
        // accumulate drift by composing continuous quarter turns, then check
        // the snap agrees with the drift-free composition
        let turns = [
            (Axis::X, Sign::Positive),
            (Axis::Y, Sign::Negative),
            (Axis::Z, Sign::Positive),
            (Axis::X, Sign::Negative),
            (Axis::Y, Sign::Positive),
        ];

        let mut continuous = Rotation3::identity();
        let mut exact = CubeRotation::default();
        for (axis, sign) in turns {
            continuous =
                Rotation3::from_axis_angle(&axis.to_unit(), sign.to_f32() * FRAC_PI_2) * continuous;
            exact = CubeRotation::quarter_turn(axis, sign) * exact;
            assert_eq!(CubeRotation::snap(&continuous), exact);
        }
    }

    #[test]
    fn test_snap_is_idempotent() {
        let drifted = Rotation3::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2 + 1e-4)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2 + 3e-5);
        let snapped = CubeRotation::snap(&drifted);

        // the snapped matrix holds exact zeros and ones, so snapping it again
        // changes nothing
        let matrix = snapped.to_rotation3();
        for i in 0..3 {
            for j in 0..3 {
                let entry = matrix.matrix()[(i, j)];
                assert!(
                    entry == 0.0 || entry == 1.0 || entry == -1.0,
                    "entry ({i}, {j}) = {entry} is not exact"
                );
            }
        }
        assert_eq!(CubeRotation::snap(&matrix), snapped);
    }
}
