//! Lattice model: which pieces exist and where they may rest.
//!
//! Coordinates are centered on the cube, one unit per piece, so a size-N cube
//! spans `-(N-1)/2 ..= (N-1)/2` along every axis: half-integers for even N,
//! integers for odd N. Strictly interior positions are never materialized;
//! they cannot be seen and no turn distinguishes them.

use itertools::{iproduct, Itertools};
use nalgebra::Vector3;
use strum::{EnumIter, IntoEnumIterator};

use crate::rotation::{Axis, CubeRotation, Sign};

/// Tolerance for "this component sits on the boundary" checks against the
/// exact resting lattice.
pub const SURFACE_EPS: f32 = 1e-2;

/// Half the lattice spacing: wide enough to absorb any in-flight float drift,
/// tight enough that a coordinate can never straddle two adjacent slabs.
pub const LAYER_TOL: f32 = 0.25;

// nudges exact-half rounding ties consistently upward
const TIE_EPS: f32 = 1e-4;

pub const N_FACES: usize = 6;

/// Distance from the cube center to the outermost piece centers.
pub fn lattice_limit(size: usize) -> f32 {
    (size as f32 - 1.0) / 2.0
}

/// Converts a 0-based slab index along an axis to its lattice coordinate.
pub fn layer_to_coord(layer: usize, size: usize) -> f32 {
    layer as f32 - lattice_limit(size)
}

/// Inverse of [`layer_to_coord`], rounding and clamping so that a slightly
/// drifted coordinate still lands on a real slab.
pub fn coord_to_layer(coord: f32, size: usize) -> usize {
    (coord + lattice_limit(size))
        .round()
        .clamp(0.0, (size - 1) as f32) as usize
}

fn snap_component(c: f32, size: usize) -> f32 {
    if size % 2 == 0 {
        (c - 0.5 + TIE_EPS).round() + 0.5
    } else {
        (c + TIE_EPS).round()
    }
}

/// Rounds every component to the nearest resting lattice value for the cube's
/// parity. Idempotent: snapping an already-snapped coordinate is exact.
pub fn snap_coord(coord: Vector3<f32>, size: usize) -> Vector3<f32> {
    coord.map(|c| snap_component(c, size))
}

/// The six oriented faces of a piece (and of the whole cube), named in the
/// y-up, z-toward-viewer convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Face {
    Left,
    Right,
    Down,
    Up,
    Back,
    Front,
}

impl Face {
    pub fn axis(self) -> Axis {
        match self {
            Face::Left | Face::Right => Axis::X,
            Face::Down | Face::Up => Axis::Y,
            Face::Back | Face::Front => Axis::Z,
        }
    }

    pub fn sign(self) -> Sign {
        match self {
            Face::Left | Face::Down | Face::Back => Sign::Negative,
            Face::Right | Face::Up | Face::Front => Sign::Positive,
        }
    }

    pub fn from_parts(axis: Axis, sign: Sign) -> Self {
        match (axis, sign) {
            (Axis::X, Sign::Negative) => Face::Left,
            (Axis::X, Sign::Positive) => Face::Right,
            (Axis::Y, Sign::Negative) => Face::Down,
            (Axis::Y, Sign::Positive) => Face::Up,
            (Axis::Z, Sign::Negative) => Face::Back,
            (Axis::Z, Sign::Positive) => Face::Front,
        }
    }

    /// Outward normal in the piece's local frame.
    pub fn normal(self) -> Vector3<f32> {
        self.sign().to_f32() * self.axis().to_unit().into_inner()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One visible unit of the cube.
///
/// `initial` never changes after generation and is the sole source of sticker
/// assignment; `coord` and `orientation` are the piece's present resting
/// state, mutated only by committed turns.
#[derive(Debug, Clone)]
pub struct Piece {
    id: u32,
    initial: Vector3<f32>,
    pub(crate) coord: Vector3<f32>,
    pub(crate) orientation: CubeRotation,
    stickers: [bool; N_FACES],
}

impl Piece {
    fn new(id: u32, initial: Vector3<f32>, size: usize) -> Self {
        let limit = lattice_limit(size);
        let mut stickers = [false; N_FACES];
        for face in Face::iter() {
            let c = initial[face.axis().index()];
            stickers[face.index()] = (c - face.sign().to_f32() * limit).abs() < SURFACE_EPS;
        }

        Self {
            id,
            initial,
            coord: initial,
            orientation: CubeRotation::default(),
            stickers,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn initial(&self) -> Vector3<f32> {
        self.initial
    }

    pub fn coord(&self) -> Vector3<f32> {
        self.coord
    }

    pub fn orientation(&self) -> CubeRotation {
        self.orientation
    }

    /// Whether the piece carries a colored sticker on the given local face.
    /// A function of `initial` only, so it is invariant across moves.
    pub fn has_sticker(&self, face: Face) -> bool {
        self.stickers[face.index()]
    }
}

/// Generates the surface pieces of a size-N cube in a stable order (x-major,
/// then y, then z), ids assigned contiguously from zero.
pub fn generate_pieces(size: usize) -> Vec<Piece> {
    let limit = lattice_limit(size);

    iproduct!(0..size, 0..size, 0..size)
        .map(|(x, y, z)| {
            Vector3::new(
                layer_to_coord(x, size),
                layer_to_coord(y, size),
                layer_to_coord(z, size),
            )
        })
        .filter(|c| c.iter().any(|v| v.abs() > limit - SURFACE_EPS))
        .enumerate()
        .map(|(id, initial)| Piece::new(id as u32, initial, size))
        .collect_vec()
}
