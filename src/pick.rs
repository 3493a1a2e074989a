//! Pointer interaction: face picking, camera-relative gesture translation,
//! and hint anchoring.
//!
//! Everything here is pure — the host feeds in hit points and camera basis
//! vectors, and gets back faces, selections, and moves. Cursor feedback and
//! tap-versus-drag thresholds stay on the host side.

use itertools::Itertools;
use nalgebra::{Point3, Vector3};

use crate::lattice::{coord_to_layer, lattice_limit, Face, Piece, LAYER_TOL};
use crate::moves::Move;
use crate::rotation::{Axis, Sign};

// a turn axis shorter than this means the swipe runs parallel to the face
// normal and selects nothing
const MIN_TURN_AXIS: f32 = 1e-3;

/// Transient interaction state anchored on one picked face of one piece.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub piece: u32,
    pub face: Face,
    pub world_normal: Vector3<f32>,
    pub coord: Vector3<f32>,
}

/// A requested visual direction, relative to the current camera orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDir {
    Up,
    Down,
    Left,
    Right,
}

/// The camera's screen-space directions expressed in cube space, sampled live
/// at gesture time so the same four arrows work at any orbit angle.
#[derive(Debug, Clone, Copy)]
pub struct CameraBasis {
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
}

fn dominant_component(v: Vector3<f32>) -> (Axis, f32) {
    let mut axis = 0;
    for i in 1..3 {
        if v[i].abs() > v[axis].abs() {
            axis = i;
        }
    }
    (Axis::from_index(axis), v[axis])
}

/// Maps a hit point in a piece's local frame to the nearest local face: the
/// axis with the largest-magnitude component, its sign choosing the side.
pub fn pick_face(local: Point3<f32>) -> Face {
    let (axis, component) = dominant_component(local.coords);
    Face::from_parts(axis, Sign::of(component))
}

/// Checks that `face` of `piece` is a genuine exterior face of the assembled
/// cube: its oriented outward normal must point along a world axis on which
/// the piece sits at that boundary. Faces that point into the interior, or
/// into a gap opened by the piece's orientation, fail. Returns the world
/// normal on success.
pub fn validate_pick(piece: &Piece, face: Face, size: usize) -> Option<Vector3<f32>> {
    let world = piece.orientation().apply(face.normal());
    let (axis, component) = dominant_component(world);

    let along = piece.coord()[axis.index()] * component.signum();
    ((along - lattice_limit(size)).abs() <= LAYER_TOL).then_some(world)
}

/// The local face whose oriented outward normal is `world` for this piece.
pub fn face_toward(piece: &Piece, world: Vector3<f32>) -> Face {
    let local = piece.orientation().inverse().apply(world);
    let (axis, component) = dominant_component(local);
    Face::from_parts(axis, Sign::of(component))
}

/// Translates a camera-relative swipe on a validated selection into a
/// concrete move: the turn axis is `normal x swipe` snapped to the dominant
/// cardinal axis, the direction is that component's sign (ties positive), and
/// the layer comes from the selection's coordinate along the chosen axis.
pub fn move_for_swipe(
    selection: &Selection,
    dir: SwipeDir,
    camera: &CameraBasis,
    size: usize,
) -> Option<Move> {
    let swipe = match dir {
        SwipeDir::Up => camera.up,
        SwipeDir::Down => -camera.up,
        SwipeDir::Right => camera.right,
        SwipeDir::Left => -camera.right,
    };

    let turn_axis = selection.world_normal.cross(&swipe);
    let (axis, component) = dominant_component(turn_axis);
    if component.abs() < MIN_TURN_AXIS {
        return None;
    }

    Some(Move {
        axis,
        layer: coord_to_layer(selection.coord[axis.index()], size),
        direction: Sign::of(component),
    })
}

/// Finds a visible anchor for a directional affordance pointing at `target`:
/// a piece on the target slab, preferably one sitting on the conventionally
/// front-facing boundary (world +z for x/y-axis moves, world +y for z-axis
/// moves) so the user sees it without orbiting. Returns `None` when the slab
/// holds no piece.
pub fn locate_hint(pieces: &[Piece], target: Move, size: usize) -> Option<Selection> {
    let limit = lattice_limit(size);
    let slab = target.layer_coord(size);

    let preferred: Vector3<f32> = match target.axis {
        Axis::Z => Vector3::y(),
        _ => Vector3::z(),
    };

    let candidates = pieces
        .iter()
        .filter(|p| (p.coord()[target.axis.index()] - slab).abs() <= LAYER_TOL)
        .collect_vec();

    let on_preferred = |p: &Piece| (p.coord().dot(&preferred) - limit).abs() <= LAYER_TOL;
    let piece = candidates
        .iter()
        .copied()
        .find(|p| on_preferred(p))
        .or_else(|| candidates.first().copied())?;

    let world = if on_preferred(piece) {
        preferred
    } else {
        // any surface piece has its largest component at the boundary
        let (axis, component) = dominant_component(piece.coord());
        Sign::of(component).to_f32() * axis.to_unit().into_inner()
    };

    Some(Selection {
        piece: piece.id(),
        face: face_toward(piece, world),
        world_normal: world,
        coord: piece.coord(),
    })
}

/// Casts a world-space ray against every resting piece, returning the index
/// of the nearest hit piece and the hit point in that piece's local frame.
/// For hosts: unproject the pointer to a ray, then feed the local point to
/// [`pick_face`].
pub fn pick_ray(
    pieces: &[Piece],
    origin: Point3<f32>,
    dir: Vector3<f32>,
) -> Option<(usize, Point3<f32>)> {
    const HALF_WIDTH: f32 = 0.5;

    let to_local = |piece: &Piece| {
        let inverse = piece.orientation().inverse();
        (
            inverse.apply(origin.coords - piece.coord()),
            inverse.apply(dir),
        )
    };

    let mut best: Option<(usize, f32)> = None;
    for (i, piece) in pieces.iter().enumerate() {
        let (local_origin, local_dir) = to_local(piece);
        if let Some(t) = ray_box(local_origin, local_dir, HALF_WIDTH) {
            if best.map_or(true, |(_, best_t)| t < best_t) {
                best = Some((i, t));
            }
        }
    }

    best.map(|(i, t)| {
        let (local_origin, local_dir) = to_local(&pieces[i]);
        (i, Point3::from(local_origin + t * local_dir))
    })
}

// slab test against the axis-aligned box [-h, h]^3; returns the entry
// distance along the ray
fn ray_box(origin: Vector3<f32>, dir: Vector3<f32>, h: f32) -> Option<f32> {
    let mut t_enter = 0.0f32;
    let mut t_exit = f32::INFINITY;

    for i in 0..3 {
        if dir[i].abs() < 1e-8 {
            // parallel to this slab pair
            if origin[i].abs() > h {
                return None;
            }
            continue;
        }

        let a = (-h - origin[i]) / dir[i];
        let b = (h - origin[i]) / dir[i];
        let (near, far) = if a < b { (a, b) } else { (b, a) };
        t_enter = t_enter.max(near);
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

#[cfg(test)]
mod tests {
    use crate::lattice::generate_pieces;

    use super::*;

    fn piece_at(pieces: &[Piece], coord: Vector3<f32>) -> &Piece {
        pieces.iter().find(|p| p.coord() == coord).unwrap()
    }

    #[test]
    fn test_pick_face_takes_dominant_component() {
        assert_eq!(pick_face(Point3::new(0.5, 0.1, 0.05)), Face::Right);
        assert_eq!(pick_face(Point3::new(-0.5, 0.1, 0.05)), Face::Left);
        assert_eq!(pick_face(Point3::new(0.1, -0.45, 0.2)), Face::Down);
        assert_eq!(pick_face(Point3::new(0.0, 0.01, 0.49)), Face::Front);
    }

    #[test]
    fn test_validate_accepts_boundary_face() {
        let pieces = generate_pieces(3);
        let piece = piece_at(&pieces, Vector3::new(1.0, 0.0, 0.0));

        let hit = pick_face(Point3::new(0.5, 0.1, 0.05));
        assert_eq!(hit, Face::Right);
        let normal = validate_pick(piece, hit, 3).expect("boundary face must validate");
        assert_eq!(normal, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_validate_rejects_inward_face() {
        let pieces = generate_pieces(3);
        let piece = piece_at(&pieces, Vector3::new(1.0, 0.0, 0.0));

        // the face pointing back into the cube is not pickable
        assert!(validate_pick(piece, Face::Left, 3).is_none());
        // and neither are the faces along axes where the piece is interior
        assert!(validate_pick(piece, Face::Up, 3).is_none());
        assert!(validate_pick(piece, Face::Front, 3).is_none());
    }

    #[test]
    fn test_swipe_right_on_front_face_turns_row() {
        let selection = Selection {
            piece: 0,
            face: Face::Front,
            world_normal: Vector3::z(),
            coord: Vector3::new(0.0, 0.0, 1.0),
        };
        let camera = CameraBasis {
            right: Vector3::x(),
            up: Vector3::y(),
        };

        // z cross x = +y: the horizontal row containing the piece
        let m = move_for_swipe(&selection, SwipeDir::Right, &camera, 3).unwrap();
        assert_eq!(m.axis, Axis::Y);
        assert_eq!(m.direction, Sign::Positive);
        assert_eq!(m.layer, 1);

        // z cross y = -x: the vertical column, turned the other way
        let m = move_for_swipe(&selection, SwipeDir::Up, &camera, 3).unwrap();
        assert_eq!(m.axis, Axis::X);
        assert_eq!(m.direction, Sign::Negative);
        assert_eq!(m.layer, 1);
    }

    #[test]
    fn test_swipe_opposites_produce_inverse_moves() {
        let selection = Selection {
            piece: 0,
            face: Face::Front,
            world_normal: Vector3::z(),
            coord: Vector3::new(-1.0, 1.0, 1.0),
        };
        let camera = CameraBasis {
            right: Vector3::x(),
            up: Vector3::y(),
        };

        for (a, b) in [
            (SwipeDir::Left, SwipeDir::Right),
            (SwipeDir::Up, SwipeDir::Down),
        ] {
            let fwd = move_for_swipe(&selection, a, &camera, 3).unwrap();
            let back = move_for_swipe(&selection, b, &camera, 3).unwrap();
            assert_eq!(fwd, back.reversed());
        }
    }

    #[test]
    fn test_swipe_parallel_to_normal_selects_nothing() {
        let selection = Selection {
            piece: 0,
            face: Face::Front,
            world_normal: Vector3::z(),
            coord: Vector3::new(0.0, 0.0, 1.0),
        };
        // degenerate camera looking along the face normal
        let camera = CameraBasis {
            right: Vector3::x(),
            up: Vector3::z(),
        };

        assert!(move_for_swipe(&selection, SwipeDir::Up, &camera, 3).is_none());
    }

    #[test]
    fn test_hint_prefers_front_boundary_for_x_moves() {
        let pieces = generate_pieces(3);
        let target = Move {
            axis: Axis::X,
            layer: 0,
            direction: Sign::Positive,
        };

        let hint = locate_hint(&pieces, target, 3).unwrap();
        assert_eq!(hint.world_normal, Vector3::z());
        assert_eq!(hint.face, Face::Front);
        assert_eq!(hint.coord.x, -1.0, "anchor must sit on the target slab");
        assert_eq!(hint.coord.z, 1.0, "anchor must sit on the front boundary");
    }

    #[test]
    fn test_hint_prefers_top_boundary_for_z_moves() {
        let pieces = generate_pieces(4);
        let target = Move {
            axis: Axis::Z,
            layer: 3,
            direction: Sign::Negative,
        };

        let hint = locate_hint(&pieces, target, 4).unwrap();
        assert_eq!(hint.world_normal, Vector3::y());
        assert_eq!(hint.coord.z, 1.5);
        assert_eq!(hint.coord.y, 1.5);
    }

    #[test]
    fn test_hint_on_empty_slab_is_inert() {
        let pieces = generate_pieces(3);
        let target = Move {
            axis: Axis::X,
            layer: 9, // far outside the lattice
            direction: Sign::Positive,
        };
        assert!(locate_hint(&pieces, target, 3).is_none());
    }

    #[test]
    fn test_ray_hits_nearest_piece() {
        let pieces = generate_pieces(3);

        let (idx, local) = pick_ray(
            &pieces,
            Point3::new(0.0, 0.0, 5.0),
            Vector3::new(0.0, 0.0, -1.0),
        )
        .expect("ray straight at the cube must hit");

        assert_eq!(pieces[idx].coord(), Vector3::new(0.0, 0.0, 1.0));
        assert!((local.z - 0.5).abs() < 1e-5, "hit the near face, got {local}");
        assert_eq!(pick_face(local), Face::Front);
    }

    #[test]
    fn test_ray_misses_cube() {
        let pieces = generate_pieces(3);
        assert!(pick_ray(
            &pieces,
            Point3::new(10.0, 10.0, 5.0),
            Vector3::new(0.0, 0.0, -1.0),
        )
        .is_none());
    }
}
