//! Quarter-turn commands and the sequences built from them.

use rand::Rng;

use crate::lattice::layer_to_coord;
use crate::rotation::{Axis, Sign};

/// A single quarter-turn command: rotate the `layer`-th slab along `axis` by
/// 90 degrees in `direction`. Immutable value object; produced by shuffle
/// generation, solve inversion, or gesture translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub axis: Axis,
    pub layer: usize,
    pub direction: Sign,
}

impl Move {
    /// The move that exactly undoes this one.
    pub fn reversed(self) -> Self {
        Self {
            direction: -self.direction,
            ..self
        }
    }

    /// Lattice coordinate of the slab this move rotates.
    pub fn layer_coord(self, size: usize) -> f32 {
        layer_to_coord(self.layer, size)
    }

    /// A uniformly random move for a size-N cube.
    pub fn random(size: usize, rng: &mut impl Rng) -> Self {
        let axis = match rng.gen_range(0..3) {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        };
        let direction = if rng.gen_bool(0.5) {
            Sign::Positive
        } else {
            Sign::Negative
        };

        Self {
            axis,
            layer: rng.gen_range(0..size),
            direction,
        }
    }
}

/// Generates a scramble of `count` uniformly random moves.
pub fn shuffle_moves(size: usize, count: usize, rng: &mut impl Rng) -> Vec<Move> {
    (0..count).map(|_| Move::random(size, rng)).collect()
}

/// The sequence that returns a cube to its pre-history state: the history in
/// reverse order with every direction negated.
pub fn solve_moves(history: &[Move]) -> Vec<Move> {
    history.iter().rev().map(|m| m.reversed()).collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_reversed_negates_direction_only() {
        let m = Move {
            axis: Axis::Y,
            layer: 2,
            direction: Sign::Positive,
        };
        let r = m.reversed();
        assert_eq!(r.axis, m.axis);
        assert_eq!(r.layer, m.layer);
        assert_eq!(r.direction, Sign::Negative);
        assert_eq!(r.reversed(), m);
    }

    #[test]
    fn test_solve_moves_reverses_and_negates() {
        let history = [
            Move {
                axis: Axis::X,
                layer: 0,
                direction: Sign::Positive,
            },
            Move {
                axis: Axis::Z,
                layer: 1,
                direction: Sign::Negative,
            },
        ];

        let solve = solve_moves(&history);
        assert_eq!(solve, vec![history[1].reversed(), history[0].reversed()]);
    }

    #[test]
    fn test_random_moves_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for size in 2..=10 {
            for m in shuffle_moves(size, 100, &mut rng) {
                assert!(m.layer < size, "layer {} out of range for size {size}", m.layer);
            }
        }
    }
}
